//! In-process publish/subscribe bus for realtime events.
//!
//! Handlers run synchronously on the publishing thread, in registration
//! order. A handler that panics is logged and skipped; the remaining
//! handlers still see the event.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, Weak};
use tracing::warn;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A message pushed by an integration (webhook or socket frame).
    InboundMessage,
    ConnectionStatus,
    /// A chat message was stored by the server.
    MessageCreated,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::InboundMessage => "inbound_message",
            EventKind::ConnectionStatus => "connection_status",
            EventKind::MessageCreated => "message_created",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Reconnecting { attempt: u32, delay_ms: u64 },
    GaveUp { attempts: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusEvent {
    pub kind: EventKind,
    /// Service name for inbound messages, `relay` for local events.
    pub source: String,
    pub payload: Value,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl BusEvent {
    pub fn new(kind: EventKind, source: impl Into<String>, payload: Value) -> Self {
        Self {
            kind,
            source: source.into(),
            payload,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn inbound(service: impl Into<String>, payload: Value) -> Self {
        Self::new(EventKind::InboundMessage, service, payload)
    }

    pub fn connection(status: ConnectionStatus) -> Self {
        let payload = serde_json::to_value(status).unwrap_or_else(|_| json!({}));
        Self::new(EventKind::ConnectionStatus, "relay", payload)
    }

    pub fn connection_status(&self) -> Option<ConnectionStatus> {
        if self.kind != EventKind::ConnectionStatus {
            return None;
        }
        serde_json::from_value(self.payload.clone()).ok()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

type Handler = Arc<dyn Fn(&BusEvent) + Send + Sync>;

struct Entry {
    id: u64,
    kind: Option<EventKind>,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<Entry>,
}

/// Cheap to clone; clones share one handler registry.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for events of `kind`.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&BusEvent) + Send + Sync + 'static,
    {
        self.register(Some(kind), Arc::new(handler))
    }

    /// Register `handler` for every event.
    pub fn subscribe_all<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&BusEvent) + Send + Sync + 'static,
    {
        self.register(None, Arc::new(handler))
    }

    fn register(&self, kind: Option<EventKind>, handler: Handler) -> Subscription {
        let mut reg = self.registry.lock().unwrap_or_else(|e| e.into_inner());
        let id = reg.next_id;
        reg.next_id += 1;
        reg.entries.push(Entry { id, kind, handler });
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Deliver `event` to the handlers registered at the time of the call.
    /// Returns how many handlers completed without panicking.
    pub fn publish(&self, event: &BusEvent) -> usize {
        // Snapshot so handlers may subscribe or unsubscribe while running.
        let handlers: Vec<Handler> = {
            let reg = self.registry.lock().unwrap_or_else(|e| e.into_inner());
            reg.entries
                .iter()
                .filter(|e| e.kind.map_or(true, |k| k == event.kind))
                .map(|e| Arc::clone(&e.handler))
                .collect()
        };

        let mut delivered = 0;
        for handler in handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(()) => delivered += 1,
                Err(_) => warn!(kind = event.kind.as_str(), source = %event.source, "bus handler panicked"),
            }
        }
        delivered
    }

    pub fn handler_count(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entries
            .len()
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// Handle returned by [`EventBus::subscribe`]. Dropping it keeps the handler
/// registered; call [`Subscription::unsubscribe`] to remove it.
#[must_use = "keep the subscription to be able to unsubscribe"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            let mut reg = registry.lock().unwrap_or_else(|e| e.into_inner());
            reg.entries.retain(|e| e.id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter(bus: &EventBus, kind: EventKind) -> (Arc<AtomicUsize>, Subscription) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let sub = bus.subscribe(kind, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        (hits, sub)
    }

    #[test]
    fn handlers_only_see_their_kind() {
        let bus = EventBus::new();
        let (inbound, _s1) = counter(&bus, EventKind::InboundMessage);
        let (status, _s2) = counter(&bus, EventKind::ConnectionStatus);

        bus.publish(&BusEvent::inbound("slack", json!({ "text": "hi" })));
        assert_eq!(inbound.load(Ordering::SeqCst), 1);
        assert_eq!(status.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn subscribe_all_sees_everything() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let _sub = bus.subscribe_all(move |e| s.lock().unwrap().push(e.kind));

        bus.publish(&BusEvent::inbound("slack", json!({})));
        bus.publish(&BusEvent::connection(ConnectionStatus::Connected));
        assert_eq!(
            *seen.lock().unwrap(),
            vec![EventKind::InboundMessage, EventKind::ConnectionStatus]
        );
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let (hits, sub) = counter(&bus, EventKind::InboundMessage);
        bus.publish(&BusEvent::inbound("slack", json!({})));
        sub.unsubscribe();
        bus.publish(&BusEvent::inbound("slack", json!({})));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bus.handler_count(), 0);
    }

    #[test]
    fn panicking_handler_does_not_block_later_handlers() {
        let bus = EventBus::new();
        let _bad = bus.subscribe(EventKind::InboundMessage, |_| panic!("boom"));
        let (hits, _good) = counter(&bus, EventKind::InboundMessage);

        let delivered = bus.publish(&BusEvent::inbound("gorgias", json!({})));
        assert_eq!(delivered, 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let subs: Vec<Subscription> = (0..3)
            .map(|i| {
                let o = Arc::clone(&order);
                bus.subscribe(EventKind::MessageCreated, move |_| o.lock().unwrap().push(i))
            })
            .collect();
        bus.publish(&BusEvent::new(EventKind::MessageCreated, "relay", json!({})));
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
        drop(subs);
    }

    #[test]
    fn connection_status_round_trips_through_payload() {
        let event = BusEvent::connection(ConnectionStatus::Reconnecting {
            attempt: 2,
            delay_ms: 2000,
        });
        assert_eq!(event.payload["status"], "reconnecting");
        assert_eq!(
            event.connection_status(),
            Some(ConnectionStatus::Reconnecting {
                attempt: 2,
                delay_ms: 2000
            })
        );
    }
}
