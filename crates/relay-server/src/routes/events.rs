use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;

use crate::state::AppState;

/// GET /api/events: SSE mirror of the WebSocket frame stream, for clients
/// that only need to listen. Each event is named after the frame type.
pub async fn sse_events(State(app): State<AppState>) -> impl axum::response::IntoResponse {
    let rx = app.frame_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| {
        msg.ok().map(|frame| {
            Ok::<Event, Infallible>(Event::default().event(frame.kind.clone()).data(frame.to_json()))
        })
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}
