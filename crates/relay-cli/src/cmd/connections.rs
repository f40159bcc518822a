use crate::output::{print_json, print_table};
use std::path::Path;

pub fn run(config_path: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let dispatcher = super::load_dispatcher(config_path)?;

    if json {
        let list: Vec<serde_json::Value> = dispatcher
            .adapters()
            .map(|a| {
                let conn = a.connection();
                serde_json::json!({
                    "id": a.service(),
                    "name": a.display_name(),
                    "configured": a.is_configured(),
                    "baseUrl": conn.as_ref().and_then(|c| c.base_url.clone()),
                    "actions": a.descriptors().len(),
                })
            })
            .collect();
        return print_json(&list);
    }

    let rows = dispatcher
        .adapters()
        .map(|a| {
            let base = a
                .connection()
                .and_then(|c| c.base_url)
                .unwrap_or_else(|| "-".to_string());
            vec![
                a.service().to_string(),
                a.display_name().to_string(),
                if a.is_configured() { "yes" } else { "no" }.to_string(),
                base,
            ]
        })
        .collect();
    print_table(&["SERVICE", "NAME", "CONFIGURED", "BASE URL"], rows);
    Ok(())
}
