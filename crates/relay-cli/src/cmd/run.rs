use crate::output::print_json;
use std::path::Path;

/// Dispatch one input in-process and print the envelope.
pub fn run(config_path: Option<&Path>, input: &str, json: bool) -> anyhow::Result<()> {
    let dispatcher = super::load_dispatcher(config_path)?;
    let rt = tokio::runtime::Runtime::new()?;
    let envelope = rt.block_on(dispatcher.dispatch_text(input));

    if json {
        print_json(&envelope)?;
    } else {
        println!("{}", envelope.display_text());
    }

    if let Some(kind) = envelope.error_kind {
        anyhow::bail!("{kind}");
    }
    Ok(())
}
