use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use relay_core::bus::BusEvent;
use relay_core::error::RelayError;
use serde_json::json;

use crate::error::AppError;
use crate::state::AppState;

/// POST /api/webhooks/{service}: accept a push from an integration.
///
/// The body is published as an inbound message and reaches WebSocket clients
/// as a `<service>_message` frame.
pub async fn receive_webhook(
    State(app): State<AppState>,
    Path(service): Path<String>,
    Json(payload): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let adapter = app
        .dispatcher
        .adapter(&service)
        .ok_or_else(|| RelayError::UnknownService(service.clone()))?;

    let event = BusEvent::inbound(adapter.service(), payload);
    let delivered = app.bus.publish(&event);
    tracing::debug!(service = adapter.service(), delivered, "webhook published");

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "accepted": true, "timestamp": event.timestamp })),
    ))
}
