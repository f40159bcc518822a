use crate::bus::{BusEvent, EventBus, EventKind, Subscription};
use crate::types::Notification;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Notifications kept before the oldest are dropped.
pub const DEFAULT_LIMIT: usize = 500;

/// In-memory notification list fed by inbound integration messages.
///
/// Bounded: once `limit` entries are held, each new one evicts the oldest.
#[derive(Clone)]
pub struct NotificationCenter {
    items: Arc<Mutex<VecDeque<Notification>>>,
    limit: usize,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::with_limit(DEFAULT_LIMIT)
    }
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            items: Arc::new(Mutex::new(VecDeque::new())),
            limit: limit.max(1),
        }
    }

    /// Record every inbound message published on `bus` from now on.
    pub fn attach(&self, bus: &EventBus) -> Subscription {
        let center = self.clone();
        bus.subscribe(EventKind::InboundMessage, move |event| {
            center.push(notification_from(event));
        })
    }

    pub fn push(&self, notification: Notification) {
        let mut items = self.lock();
        while items.len() >= self.limit {
            items.pop_front();
        }
        items.push_back(notification);
    }

    /// Newest first.
    pub fn list(&self) -> Vec<Notification> {
        let mut items: Vec<Notification> = self.lock().iter().cloned().collect();
        items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        items
    }

    /// Mark every notification from `app_id` as read. Returns how many changed.
    pub fn mark_read(&self, app_id: &str) -> usize {
        let mut items = self.lock();
        let mut changed = 0;
        for n in items.iter_mut().filter(|n| n.app_id == app_id && !n.read) {
            n.read = true;
            changed += 1;
        }
        changed
    }

    pub fn unread_count(&self) -> usize {
        self.lock().iter().filter(|n| !n.read).count()
    }

    pub fn unread_for(&self, app_id: &str) -> usize {
        self.lock()
            .iter()
            .filter(|n| n.app_id == app_id && !n.read)
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Notification>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Pull a display line out of an integration payload.
fn notification_from(event: &BusEvent) -> Notification {
    let message = ["message", "text", "body", "content"]
        .iter()
        .find_map(|k| event.payload.get(*k).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| match &event.payload {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
    Notification {
        id: uuid::Uuid::new_v4().to_string(),
        app_id: event.source.clone(),
        message,
        timestamp: event.timestamp,
        read: false,
    }
}
