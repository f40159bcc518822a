pub mod chat;
pub mod config;
pub mod connections;
pub mod init;
pub mod mcp;
pub mod parse;
pub mod run;
pub mod serve;
pub mod tools;

use anyhow::Context;
use relay_core::config::Config;
use relay_core::dispatch::Dispatcher;
use std::path::Path;

/// Load the config the way every subcommand does: explicit path, then
/// discovery, then defaults.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let (config, path) = Config::discover(explicit).context("failed to load config")?;
    match path {
        Some(p) => tracing::debug!(path = %p.display(), "config loaded"),
        None => tracing::debug!("no config file found; using defaults"),
    }
    Ok(config)
}

pub fn load_dispatcher(explicit: Option<&Path>) -> anyhow::Result<Dispatcher> {
    let config = load_config(explicit)?;
    Dispatcher::from_config(&config).context("failed to build dispatcher")
}
