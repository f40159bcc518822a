use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;

use crate::state::AppState;

/// GET /api/notifications: newest first, with the unread total.
pub async fn list_notifications(State(app): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "items": app.notifications.list(),
        "unread": app.notifications.unread_count(),
    }))
}

/// POST /api/notifications/{app_id}/read: mark one app's notifications read.
pub async fn mark_read(
    State(app): State<AppState>,
    Path(app_id): Path<String>,
) -> Json<serde_json::Value> {
    let marked = app.notifications.mark_read(&app_id);
    Json(json!({
        "marked": marked,
        "unread": app.notifications.unread_count(),
    }))
}
