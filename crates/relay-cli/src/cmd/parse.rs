use crate::output::print_json;
use relay_core::command::{self, Parsed};

pub fn run(input: &str, json: bool) -> anyhow::Result<()> {
    match command::parse(input) {
        Parsed::Command(cmd) => {
            if json {
                print_json(&serde_json::json!({
                    "command": cmd,
                    "canonical": command::format(&cmd),
                }))?;
                return Ok(());
            }
            println!("service:    {}", cmd.service);
            println!("action:     {}", if cmd.action.is_empty() { "(none)" } else { cmd.action.as_str() });
            for (k, v) in &cmd.args {
                println!("arg:        {k} = {v:?}");
            }
            for v in &cmd.positional {
                println!("positional: {v:?}");
            }
            println!("canonical:  {}", command::format(&cmd));
        }
        Parsed::NotACommand(text) => {
            if json {
                print_json(&serde_json::json!({ "notACommand": text }))?;
            } else {
                println!("not a command: {text:?}");
            }
        }
    }
    Ok(())
}
