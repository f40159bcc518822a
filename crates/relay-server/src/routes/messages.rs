use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use relay_core::types::{ChatMessage, Metadata, Role};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/messages: chat history, oldest first.
pub async fn list_messages(State(app): State<AppState>) -> Json<Vec<ChatMessage>> {
    Json(app.messages.list())
}

#[derive(Deserialize)]
pub struct CreateMessageBody {
    content: String,
    #[serde(default = "default_role")]
    role: Role,
    #[serde(default)]
    metadata: Metadata,
}

fn default_role() -> Role {
    Role::User
}

/// POST /api/messages: store a message under a permanent id.
///
/// `metadata` is echoed back unchanged, so a `clientId` lets the sender
/// correlate this copy with its optimistic one.
pub async fn create_message(
    State(app): State<AppState>,
    Json(body): Json<CreateMessageBody>,
) -> Result<(StatusCode, Json<ChatMessage>), AppError> {
    if body.content.trim().is_empty() {
        return Err(AppError::bad_request("content is empty"));
    }
    let message = app.messages.append(body.role, &body.content, body.metadata);
    Ok((StatusCode::CREATED, Json(message)))
}
