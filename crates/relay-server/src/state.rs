use relay_core::bus::{BusEvent, EventBus, EventKind};
use relay_core::config::Config;
use relay_core::dispatch::Dispatcher;
use relay_core::notify::NotificationCenter;
use relay_core::types::{ChatMessage, Metadata, Role};
use relay_core::wire::WsFrame;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Frames buffered per WebSocket subscriber before it starts lagging.
const FRAME_CAPACITY: usize = 256;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub messages: MessageStore,
    pub bus: EventBus,
    pub notifications: NotificationCenter,
    pub frame_tx: broadcast::Sender<WsFrame>,
}

impl AppState {
    pub fn new(config: &Config) -> relay_core::Result<Self> {
        Ok(Self::with_dispatcher(Dispatcher::from_config(config)?))
    }

    pub fn with_dispatcher(dispatcher: Dispatcher) -> Self {
        let (tx, _) = broadcast::channel(FRAME_CAPACITY);
        let bus = EventBus::new();

        // Every bus event is mirrored to connected sockets. Both handlers live
        // as long as the bus.
        let frame_tx = tx.clone();
        let _forward = bus.subscribe_all(move |event| {
            let _ = frame_tx.send(WsFrame::from_event(event));
        });
        let notifications = NotificationCenter::new();
        let _notify = notifications.attach(&bus);

        Self {
            dispatcher: Arc::new(dispatcher),
            messages: MessageStore::new(bus.clone()),
            bus,
            notifications,
            frame_tx: tx,
        }
    }
}

/// Authoritative chat history. Every append is announced on the bus.
#[derive(Clone)]
pub struct MessageStore {
    inner: Arc<Mutex<Vec<ChatMessage>>>,
    bus: EventBus,
}

impl MessageStore {
    fn new(bus: EventBus) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Vec::new())),
            bus,
        }
    }

    pub fn append(&self, role: Role, content: &str, metadata: Metadata) -> ChatMessage {
        let message = ChatMessage::new(role, content, metadata);
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.clone());
        let payload = serde_json::to_value(&message).unwrap_or_default();
        self.bus
            .publish(&BusEvent::new(EventKind::MessageCreated, "relay", payload));
        message
    }

    /// Oldest first.
    pub fn list(&self) -> Vec<ChatMessage> {
        let mut all = self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone();
        all.sort_by_key(|m| m.created_at);
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn state() -> AppState {
        AppState::with_dispatcher(Dispatcher::new(Duration::from_secs(1)))
    }

    #[test]
    fn append_assigns_id_and_keeps_metadata() {
        let app = state();
        let mut meta = Metadata::new();
        meta.insert("clientId".into(), serde_json::json!("temp-1-1"));
        let msg = app.messages.append(Role::User, "hi", meta);
        assert!(!msg.id.is_empty());
        assert_eq!(msg.client_id(), Some("temp-1-1"));
        assert_eq!(app.messages.list(), vec![msg]);
    }

    #[test]
    fn appends_are_mirrored_as_frames() {
        let app = state();
        let mut rx = app.frame_tx.subscribe();
        app.messages.append(Role::Assistant, "done", Metadata::new());
        let frame = rx.try_recv().unwrap();
        assert_eq!(frame.kind, "message_created");
        assert_eq!(frame.payload["content"], "done");
    }

    #[test]
    fn inbound_events_feed_notifications() {
        let app = state();
        app.bus
            .publish(&BusEvent::inbound("slack", serde_json::json!({ "text": "ping" })));
        assert_eq!(app.notifications.unread_count(), 1);
    }
}
