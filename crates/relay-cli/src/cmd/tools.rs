use crate::output::{print_json, print_table};
use relay_core::descriptor::ToolDescriptor;
use std::path::Path;

pub fn run(config_path: Option<&Path>, service: Option<&str>, json: bool) -> anyhow::Result<()> {
    let dispatcher = super::load_dispatcher(config_path)?;
    let descriptors: Vec<ToolDescriptor> = match service {
        Some(name) => {
            let adapter = dispatcher
                .adapter(name)
                .ok_or_else(|| anyhow::anyhow!("unknown service '{name}'"))?;
            adapter.descriptors().to_vec()
        }
        None => dispatcher.descriptors(),
    };

    if json {
        let tools: Vec<serde_json::Value> = descriptors
            .iter()
            .map(|d| {
                serde_json::json!({
                    "name": d.tool_name(),
                    "description": d.description,
                    "inputSchema": d.input_schema(),
                })
            })
            .collect();
        return print_json(&tools);
    }

    let rows = descriptors
        .iter()
        .map(|d| {
            let params = d
                .parameters
                .iter()
                .map(|p| if p.required { p.name.clone() } else { format!("[{}]", p.name) })
                .collect::<Vec<_>>()
                .join(" ");
            vec![format!("/{} {}", d.service, d.action), params, d.description.clone()]
        })
        .collect();
    print_table(&["COMMAND", "PARAMS", "DESCRIPTION"], rows);
    Ok(())
}
