use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures::{Sink, SinkExt, Stream, StreamExt};
use relay_core::wire::WsFrame;
use std::fmt::Display;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::state::AppState;

/// GET /ws: realtime channel. Answers `ping` frames with `pong` and pushes
/// every bus event as a frame.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app))
}

async fn handle_socket(socket: WebSocket, app: AppState) {
    info!("websocket connected");
    let (sender, receiver) = socket.split();
    let end = run_session(sender, receiver, app.frame_tx.subscribe()).await;
    info!(reason = ?end, "websocket disconnected");
}

#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    ClientClosed,
    ReceiveError,
    BusClosed,
}

/// Only the client closing, a receive error, or the bus shutting down end a
/// session. Failed sends are logged and the socket stays up.
async fn run_session<S, R>(
    mut sender: S,
    mut receiver: R,
    mut rx: broadcast::Receiver<WsFrame>,
) -> SessionEnd
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    loop {
        tokio::select! {
            incoming = receiver.next() => {
                let Some(msg) = incoming else { return SessionEnd::ClientClosed };
                match msg {
                    Ok(Message::Text(text)) => {
                        let Some(frame) = WsFrame::parse(text.as_str()) else {
                            debug!("ignoring non-frame text message");
                            continue;
                        };
                        if frame.is_ping() {
                            let pong = Message::Text(WsFrame::pong().to_json().into());
                            if let Err(e) = sender.send(pong).await {
                                warn!(error = %e, "failed to send pong");
                            }
                        }
                    }
                    Ok(Message::Close(_)) => return SessionEnd::ClientClosed,
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "websocket receive error");
                        return SessionEnd::ReceiveError;
                    }
                }
            }
            outgoing = rx.recv() => {
                match outgoing {
                    Ok(frame) => {
                        let msg = Message::Text(frame.to_json().into());
                        if let Err(e) = sender.send(msg).await {
                            warn!(error = %e, "failed to push frame");
                        }
                    }
                    Err(RecvError::Lagged(n)) => warn!(skipped = n, "websocket client lagging"),
                    Err(RecvError::Closed) => return SessionEnd::BusClosed,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc;

    fn text(frame: &WsFrame) -> Result<Message, axum::Error> {
        Ok(Message::Text(frame.to_json().into()))
    }

    #[tokio::test]
    async fn failed_sends_do_not_end_the_session() {
        // Every send fails: the outbound half is already closed.
        let (sink, closed) = mpsc::unbounded::<Message>();
        drop(closed);

        let (incoming_tx, incoming) = mpsc::unbounded();
        incoming_tx.unbounded_send(text(&WsFrame::ping())).unwrap();
        incoming_tx.unbounded_send(text(&WsFrame::ping())).unwrap();
        incoming_tx.unbounded_send(Ok(Message::Close(None))).unwrap();

        let (bus_tx, bus_rx) = broadcast::channel(8);
        bus_tx.send(WsFrame::pong()).unwrap();

        let end = run_session(sink, incoming, bus_rx).await;
        assert_eq!(end, SessionEnd::ClientClosed);
    }

    #[tokio::test]
    async fn pings_are_answered() {
        let (sink, mut sent) = mpsc::unbounded::<Message>();
        let (incoming_tx, incoming) = mpsc::unbounded();
        incoming_tx.unbounded_send(text(&WsFrame::ping())).unwrap();
        drop(incoming_tx);

        let (_bus_tx, bus_rx) = broadcast::channel(8);
        let end = run_session(sink, incoming, bus_rx).await;
        assert_eq!(end, SessionEnd::ClientClosed);

        let Some(Message::Text(reply)) = sent.next().await else {
            panic!("no reply sent");
        };
        assert!(WsFrame::parse(reply.as_str()).is_some_and(|f| f.is_pong()));
    }
}
