mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "relay",
    about = "Chat-driven command relay: run slash commands against SaaS APIs",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: relay.yaml found upward from cwd, then ~/.config/relay)
    #[arg(long, global = true, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter relay.yaml in the current directory
    Init,

    /// Start the HTTP and WebSocket server
    Serve {
        /// Port to listen on (overrides config; 0 = OS-assigned)
        #[arg(long)]
        port: Option<u16>,

        /// Interface to bind (overrides config)
        #[arg(long)]
        host: Option<String>,
    },

    /// Dispatch one chat input locally, e.g. `relay run /shopify today_sales`
    Run {
        /// The input; words are joined with single spaces
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        input: Vec<String>,
    },

    /// Show how an input parses, without dispatching it
    Parse {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        input: Vec<String>,
    },

    /// List the tools every service exposes
    Tools {
        /// Only this service
        service: Option<String>,
    },

    /// Show each service and whether it is configured
    Connections,

    /// Inspect and validate the config
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Interactive chat against a running server
    Chat {
        /// Server base URL
        #[arg(long, default_value = "http://127.0.0.1:3141")]
        url: String,
    },

    /// Run as an MCP stdio server exposing every service action as a tool
    Mcp,
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } | Commands::Mcp | Commands::Chat { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    // stdout carries the MCP protocol, so logs always go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Init => cmd::init::run(cli.json),
        Commands::Serve { port, host } => cmd::serve::run(config_path, host, port),
        Commands::Run { input } => cmd::run::run(config_path, &input.join(" "), cli.json),
        Commands::Parse { input } => cmd::parse::run(&input.join(" "), cli.json),
        Commands::Tools { service } => cmd::tools::run(config_path, service.as_deref(), cli.json),
        Commands::Connections => cmd::connections::run(config_path, cli.json),
        Commands::Config { subcommand } => cmd::config::run(config_path, subcommand, cli.json),
        Commands::Chat { url } => cmd::chat::run(config_path, &url),
        Commands::Mcp => cmd::mcp::run(config_path),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
