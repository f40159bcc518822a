//! Realtime socket with heartbeat and reconnect.
//!
//! `ConnectionManager` owns one background task. The task dials the server,
//! pings on a fixed interval, republishes every inbound frame on the local
//! `EventBus`, and redials with exponential backoff when the socket drops or
//! a ping goes unanswered. Status changes are published as
//! `connection_status` events so the UI can render them.

use crate::backoff::ReconnectPolicy;
use crate::error::ClientError;
use crate::heartbeat::{Beat, Heartbeat};
use futures::{SinkExt, StreamExt};
use relay_core::bus::{BusEvent, ConnectionStatus, EventBus};
use relay_core::config::RealtimeConfig;
use relay_core::wire::WsFrame;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

// ─── Settings ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealtimeSettings {
    pub ping_interval: Duration,
    pub policy: ReconnectPolicy,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self::from(&RealtimeConfig::default())
    }
}

impl From<&RealtimeConfig> for RealtimeSettings {
    fn from(cfg: &RealtimeConfig) -> Self {
        Self {
            ping_interval: Duration::from_secs(cfg.ping_interval_secs),
            policy: ReconnectPolicy::from(cfg),
        }
    }
}

// ─── ConnectionManager ────────────────────────────────────────────────────

pub struct ConnectionManager {
    url: String,
    settings: RealtimeSettings,
    bus: EventBus,
    connected: Arc<AtomicBool>,
    outbound: Mutex<Option<mpsc::UnboundedSender<WsFrame>>>,
    shutdown: Mutex<Option<watch::Sender<bool>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionManager {
    pub fn new(url: impl Into<String>, bus: EventBus, settings: RealtimeSettings) -> Self {
        Self {
            url: url.into(),
            settings,
            bus,
            connected: Arc::new(AtomicBool::new(false)),
            outbound: Mutex::new(None),
            shutdown: Mutex::new(None),
            task: Mutex::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Start the socket task. Calling it while a task is running is a no-op.
    pub fn connect(&self) {
        let mut task = lock(&self.task);
        if task.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);
        *lock(&self.outbound) = Some(out_tx);
        *lock(&self.shutdown) = Some(stop_tx);

        let worker = Worker {
            url: self.url.clone(),
            settings: self.settings,
            bus: self.bus.clone(),
            connected: Arc::clone(&self.connected),
            outbound: out_rx,
            shutdown: stop_rx,
        };
        *task = Some(tokio::spawn(worker.run()));
    }

    /// Close the socket and stop reconnecting.
    pub async fn disconnect(&self) {
        if let Some(stop) = lock(&self.shutdown).take() {
            let _ = stop.send(true);
        }
        lock(&self.outbound).take();
        let handle = lock(&self.task).take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "realtime task ended abnormally");
            }
        }
        self.connected.store(false, Ordering::SeqCst);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Queue a frame for the open socket. Write failures inside the socket
    /// task are logged and dropped.
    pub fn send(&self, frame: WsFrame) -> Result<(), ClientError> {
        if !self.is_connected() {
            return Err(ClientError::NotConnected);
        }
        let guard = lock(&self.outbound);
        let tx = guard.as_ref().ok_or(ClientError::NotConnected)?;
        tx.send(frame).map_err(|_| ClientError::NotConnected)
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(stop) = lock(&self.shutdown).take() {
            let _ = stop.send(true);
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ─── Worker ───────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    Shutdown,
    Closed,
    HeartbeatTimeout,
}

struct Worker {
    url: String,
    settings: RealtimeSettings,
    bus: EventBus,
    connected: Arc<AtomicBool>,
    outbound: mpsc::UnboundedReceiver<WsFrame>,
    shutdown: watch::Receiver<bool>,
}

impl Worker {
    async fn run(mut self) {
        let mut attempt: u32 = 0;
        loop {
            match tokio_tungstenite::connect_async(self.url.as_str()).await {
                Ok((socket, _)) => {
                    attempt = 0;
                    self.connected.store(true, Ordering::SeqCst);
                    info!(url = %self.url, "realtime connected");
                    self.publish(ConnectionStatus::Connected);

                    let end = self.session(socket).await;

                    self.connected.store(false, Ordering::SeqCst);
                    info!(url = %self.url, reason = ?end, "realtime disconnected");
                    self.publish(ConnectionStatus::Disconnected);
                    if end == SessionEnd::Shutdown {
                        return;
                    }
                }
                Err(e) => warn!(url = %self.url, error = %e, "realtime connect failed"),
            }

            if *self.shutdown.borrow() {
                return;
            }

            attempt += 1;
            let Some(delay) = self.settings.policy.delay(attempt) else {
                let attempts = attempt - 1;
                warn!(url = %self.url, attempts, "realtime giving up");
                self.publish(ConnectionStatus::GaveUp { attempts });
                return;
            };
            self.publish(ConnectionStatus::Reconnecting {
                attempt,
                delay_ms: delay.as_millis() as u64,
            });
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.shutdown.changed() => return,
            }
        }
    }

    async fn session<S>(&mut self, socket: S) -> SessionEnd
    where
        S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
            + futures::Sink<Message, Error = tokio_tungstenite::tungstenite::Error>
            + Unpin,
    {
        let (mut sink, mut stream) = socket.split();
        let period = self.settings.ping_interval;
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        let mut heartbeat = Heartbeat::new();

        loop {
            tokio::select! {
                _ = ticker.tick() => match heartbeat.on_tick() {
                    Beat::SendPing => {
                        if let Err(e) = sink.send(text(&WsFrame::ping())).await {
                            warn!(error = %e, "ping send failed");
                        }
                    }
                    Beat::Reconnect => {
                        warn!("pong not received before next ping");
                        let _ = sink.close().await;
                        return SessionEnd::HeartbeatTimeout;
                    }
                },
                incoming = stream.next() => match incoming {
                    Some(Ok(Message::Text(body))) => {
                        let Some(frame) = WsFrame::parse(body.as_str()) else {
                            debug!("ignoring non-frame text message");
                            continue;
                        };
                        if frame.is_pong() {
                            heartbeat.on_pong();
                        } else if frame.is_ping() {
                            if let Err(e) = sink.send(text(&WsFrame::pong())).await {
                                warn!(error = %e, "pong send failed");
                            }
                        } else if let Some(event) = frame.to_event() {
                            self.bus.publish(&event);
                        } else {
                            debug!(kind = %frame.kind, "unrecognized frame type");
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return SessionEnd::Closed,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "realtime receive error");
                        return SessionEnd::Closed;
                    }
                },
                Some(frame) = self.outbound.recv() => {
                    if let Err(e) = sink.send(text(&frame)).await {
                        warn!(error = %e, kind = %frame.kind, "frame send failed");
                    }
                }
                _ = self.shutdown.changed() => {
                    let _ = sink.close().await;
                    return SessionEnd::Shutdown;
                }
            }
        }
    }

    fn publish(&self, status: ConnectionStatus) {
        self.bus.publish(&BusEvent::connection(status));
    }
}

fn text(frame: &WsFrame) -> Message {
    Message::Text(frame.to_json().into())
}
