use anyhow::Context;
use relay_core::config::STARTER_CONFIG;
use relay_core::{io, paths};
use std::path::Path;

pub fn run(json: bool) -> anyhow::Result<()> {
    let path = Path::new(paths::CONFIG_FILE);
    let created = io::write_if_missing(path, STARTER_CONFIG.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;

    if json {
        crate::output::print_json(&serde_json::json!({
            "path": paths::CONFIG_FILE,
            "created": created,
        }))?;
    } else if created {
        println!("  created: {}", paths::CONFIG_FILE);
    } else {
        println!("  exists:  {}", paths::CONFIG_FILE);
    }
    Ok(())
}
