use axum::extract::State;
use axum::Json;
use relay_core::types::{Metadata, ResultEnvelope, Role};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CommandBody {
    content: String,
    #[serde(default)]
    metadata: Metadata,
}

/// POST /api/command: parse and dispatch one chat input.
///
/// Both the user's input and the reply are appended to the chat history.
/// Dispatch failures are reported inside the envelope with a 200 status.
pub async fn run_command(
    State(app): State<AppState>,
    Json(body): Json<CommandBody>,
) -> Result<Json<ResultEnvelope>, AppError> {
    if body.content.trim().is_empty() {
        return Err(AppError::bad_request("content is empty"));
    }

    app.messages.append(Role::User, &body.content, body.metadata);
    let envelope = app.dispatcher.dispatch_text(&body.content).await;

    let mut reply_meta = Metadata::new();
    reply_meta.insert("success".into(), envelope.success.into());
    if let Some(kind) = envelope.error_kind {
        reply_meta.insert("errorKind".into(), kind.as_str().into());
    }
    app.messages
        .append(Role::Assistant, &envelope.display_text(), reply_meta);

    Ok(Json(envelope))
}
