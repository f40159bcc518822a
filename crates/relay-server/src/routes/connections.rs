use axum::extract::{Path, State};
use axum::Json;
use relay_core::adapter::{ServiceConnection, ToolAdapter};
use relay_core::error::RelayError;
use serde_json::json;
use std::sync::Arc;

use crate::error::AppError;
use crate::state::AppState;

fn connection_view(adapter: &Arc<dyn ToolAdapter>) -> serde_json::Value {
    let conn = adapter.connection().unwrap_or_default();
    json!({
        "id": adapter.service(),
        "name": adapter.display_name(),
        "configured": adapter.is_configured(),
        "baseUrl": conn.base_url,
        "credentials": conn.credentials.masked(),
        "actions": adapter.descriptors().iter().map(|d| d.action.as_str()).collect::<Vec<_>>(),
    })
}

/// GET /api/api-connections: status of every registered service.
pub async fn list_connections(State(app): State<AppState>) -> Json<serde_json::Value> {
    let list: Vec<serde_json::Value> = app.dispatcher.adapters().map(connection_view).collect();
    Json(json!(list))
}

/// GET /api/api-connections/{id}
pub async fn get_connection(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let adapter = app
        .dispatcher
        .adapter(&id)
        .ok_or_else(|| RelayError::UnknownService(id.clone()))?;
    Ok(Json(connection_view(adapter)))
}

/// PUT /api/api-connections/{id}: replace a service's credentials for the
/// running process. Nothing is written back to the config file.
pub async fn put_connection(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ServiceConnection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let adapter = app
        .dispatcher
        .adapter(&id)
        .ok_or_else(|| RelayError::UnknownService(id.clone()))?;

    let creds = &body.credentials;
    if creds.token.is_none() && creds.api_key.is_none() && creds.username.is_none() {
        return Err(RelayError::InvalidCredentials {
            service: adapter.service().to_string(),
            reason: "one of token, api_key or username is required".into(),
        }
        .into());
    }

    adapter.configure(body);
    tracing::info!(service = adapter.service(), "connection updated");
    Ok(Json(connection_view(adapter)))
}
