use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

/// GET /api/tools: every operation the catalog exposes, with a JSON schema
/// for its parameters.
pub async fn list_tools(State(app): State<AppState>) -> Json<serde_json::Value> {
    let tools: Vec<serde_json::Value> = app
        .dispatcher
        .descriptors()
        .iter()
        .map(|d| {
            json!({
                "name": d.tool_name(),
                "service": d.service,
                "action": d.action,
                "description": d.description,
                "parameters": d.parameters,
                "inputSchema": d.input_schema(),
            })
        })
        .collect();
    Json(json!(tools))
}
