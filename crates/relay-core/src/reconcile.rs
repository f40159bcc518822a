//! Optimistic chat message cache.
//!
//! A submitted message is shown immediately under a temporary id and
//! replaced once the server's authoritative list contains its permanent copy.
//! Matching prefers the `clientId` the server echoes back and falls back to
//! equal `(role, content)`.

use crate::types::{ChatMessage, Metadata, Role, CLIENT_ID_KEY, DELIVERY_STATUS_KEY};
use chrono::Utc;
use serde_json::Value;
use std::collections::HashSet;

pub const STATUS_SENDING: &str = "sending";
pub const STATUS_FAILED: &str = "failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TempState {
    Pending,
    Failed,
}

#[derive(Debug, Clone)]
struct TempEntry {
    message: ChatMessage,
    state: TempState,
    /// Permanent ids already known when this entry was submitted.
    baseline: HashSet<String>,
}

#[derive(Debug, Default)]
pub struct MessageCache {
    permanent: Vec<ChatMessage>,
    temps: Vec<TempEntry>,
    seq: u64,
}

impl MessageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a message immediately and return its temporary id.
    pub fn insert_optimistic(&mut self, role: Role, content: &str, metadata: Metadata) -> String {
        self.seq += 1;
        let now = Utc::now();
        let id = format!("temp-{}-{}", now.timestamp_millis(), self.seq);

        let mut metadata = metadata;
        metadata.insert(DELIVERY_STATUS_KEY.into(), Value::String(STATUS_SENDING.into()));
        metadata.insert(CLIENT_ID_KEY.into(), Value::String(id.clone()));

        let baseline = self.permanent.iter().map(|m| m.id.clone()).collect();
        self.temps.push(TempEntry {
            message: ChatMessage {
                id: id.clone(),
                role,
                content: content.to_string(),
                metadata,
                created_at: now,
            },
            state: TempState::Pending,
            baseline,
        });
        id
    }

    /// Replace the permanent list and drop every pending temporary that now
    /// has a permanent counterpart. Returns the ids of the dropped temporaries.
    pub fn apply_authoritative(&mut self, messages: Vec<ChatMessage>) -> Vec<String> {
        self.permanent = messages;
        let mut claimed: HashSet<&str> = HashSet::new();
        let mut matched: Vec<bool> = vec![false; self.temps.len()];

        // Exact correlation first so a content match cannot steal a copy
        // that belongs to a later submission.
        for (i, temp) in self.temps.iter().enumerate() {
            if temp.state != TempState::Pending {
                continue;
            }
            let found = self.permanent.iter().find(|p| {
                p.client_id() == Some(temp.message.id.as_str()) && !claimed.contains(p.id.as_str())
            });
            if let Some(p) = found {
                claimed.insert(p.id.as_str());
                matched[i] = true;
            }
        }

        for (i, temp) in self.temps.iter().enumerate() {
            if matched[i] || temp.state != TempState::Pending {
                continue;
            }
            let found = self.permanent.iter().find(|p| {
                p.client_id().is_none()
                    && p.role == temp.message.role
                    && p.content == temp.message.content
                    && !temp.baseline.contains(&p.id)
                    && !claimed.contains(p.id.as_str())
            });
            if let Some(p) = found {
                claimed.insert(p.id.as_str());
                matched[i] = true;
            }
        }

        let mut reconciled = Vec::new();
        let mut flags = matched.into_iter();
        self.temps.retain(|t| {
            let hit = flags.next().unwrap_or(false);
            if hit {
                reconciled.push(t.message.id.clone());
            }
            !hit
        });
        reconciled
    }

    /// Flag a temporary as undelivered. It stays visible.
    pub fn mark_failed(&mut self, temp_id: &str) -> bool {
        self.set_state(temp_id, TempState::Failed, STATUS_FAILED)
    }

    /// Move a failed temporary back to pending and return it for resubmission.
    pub fn retry(&mut self, temp_id: &str) -> Option<ChatMessage> {
        let entry = self.temps.iter().find(|t| t.message.id == temp_id)?;
        if entry.state != TempState::Failed {
            return None;
        }
        self.set_state(temp_id, TempState::Pending, STATUS_SENDING);
        self.temps
            .iter()
            .find(|t| t.message.id == temp_id)
            .map(|t| t.message.clone())
    }

    fn set_state(&mut self, temp_id: &str, state: TempState, status: &str) -> bool {
        match self.temps.iter_mut().find(|t| t.message.id == temp_id) {
            Some(entry) => {
                entry.state = state;
                entry
                    .message
                    .metadata
                    .insert(DELIVERY_STATUS_KEY.into(), Value::String(status.into()));
                true
            }
            None => false,
        }
    }

    /// `None` once the temporary has been reconciled (or never existed).
    pub fn state(&self, temp_id: &str) -> Option<TempState> {
        self.temps
            .iter()
            .find(|t| t.message.id == temp_id)
            .map(|t| t.state)
    }

    pub fn pending_count(&self) -> usize {
        self.temps
            .iter()
            .filter(|t| t.state == TempState::Pending)
            .count()
    }

    /// Permanent and temporary messages merged, oldest first. Ties keep
    /// permanent messages ahead of temporaries.
    pub fn messages(&self) -> Vec<ChatMessage> {
        let mut all: Vec<ChatMessage> = self
            .permanent
            .iter()
            .cloned()
            .chain(self.temps.iter().map(|t| t.message.clone()))
            .collect();
        all.sort_by_key(|m| m.created_at);
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn permanent(id: &str, role: Role, content: &str) -> ChatMessage {
        ChatMessage {
            id: id.to_string(),
            role,
            content: content.to_string(),
            metadata: Metadata::new(),
            created_at: Utc::now(),
        }
    }

    fn echoed(id: &str, content: &str, client_id: &str) -> ChatMessage {
        let mut m = permanent(id, Role::User, content);
        m.metadata.insert(CLIENT_ID_KEY.into(), json!(client_id));
        m
    }

    #[test]
    fn optimistic_insert_is_visible_and_sending() {
        let mut cache = MessageCache::new();
        let id = cache.insert_optimistic(Role::User, "hello", Metadata::new());
        assert!(id.starts_with("temp-"));

        let msgs = cache.messages();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].delivery_status(), Some(STATUS_SENDING));
        assert_eq!(msgs[0].client_id(), Some(id.as_str()));
        assert_eq!(cache.state(&id), Some(TempState::Pending));
    }

    #[test]
    fn content_match_leaves_exactly_one_copy() {
        let mut cache = MessageCache::new();
        let id = cache.insert_optimistic(Role::User, "hello", Metadata::new());
        let dropped = cache.apply_authoritative(vec![permanent("m1", Role::User, "hello")]);

        assert_eq!(dropped, vec![id.clone()]);
        let msgs = cache.messages();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].id, "m1");
        assert_eq!(cache.state(&id), None);
    }

    #[test]
    fn role_must_match_too() {
        let mut cache = MessageCache::new();
        cache.insert_optimistic(Role::User, "ok", Metadata::new());
        cache.apply_authoritative(vec![permanent("a1", Role::Assistant, "ok")]);
        assert_eq!(cache.messages().len(), 2);
        assert_eq!(cache.pending_count(), 1);
    }

    #[test]
    fn identical_submissions_get_distinct_ids_and_reconcile_independently() {
        let mut cache = MessageCache::new();
        let first = cache.insert_optimistic(Role::User, "same", Metadata::new());
        let second = cache.insert_optimistic(Role::User, "same", Metadata::new());
        assert_ne!(first, second);

        cache.apply_authoritative(vec![permanent("m1", Role::User, "same")]);
        assert_eq!(cache.state(&first), None);
        assert_eq!(cache.state(&second), Some(TempState::Pending));

        cache.apply_authoritative(vec![
            permanent("m1", Role::User, "same"),
            permanent("m2", Role::User, "same"),
        ]);
        assert_eq!(cache.state(&second), None);
        assert_eq!(cache.messages().len(), 2);
    }

    #[test]
    fn client_id_correlation_beats_submission_order() {
        let mut cache = MessageCache::new();
        let first = cache.insert_optimistic(Role::User, "same", Metadata::new());
        let second = cache.insert_optimistic(Role::User, "same", Metadata::new());

        // Only the second one has reached the server so far.
        cache.apply_authoritative(vec![echoed("m2", "same", &second)]);
        assert_eq!(cache.state(&first), Some(TempState::Pending));
        assert_eq!(cache.state(&second), None);
    }

    #[test]
    fn older_identical_permanent_does_not_reconcile_new_submission() {
        let mut cache = MessageCache::new();
        cache.apply_authoritative(vec![permanent("old", Role::User, "thanks")]);
        let id = cache.insert_optimistic(Role::User, "thanks", Metadata::new());

        cache.apply_authoritative(vec![permanent("old", Role::User, "thanks")]);
        assert_eq!(cache.state(&id), Some(TempState::Pending));

        cache.apply_authoritative(vec![
            permanent("old", Role::User, "thanks"),
            permanent("new", Role::User, "thanks"),
        ]);
        assert_eq!(cache.state(&id), None);
    }

    #[test]
    fn failed_message_stays_visible_until_retried() {
        let mut cache = MessageCache::new();
        let id = cache.insert_optimistic(Role::User, "boom", Metadata::new());
        assert!(cache.mark_failed(&id));

        cache.apply_authoritative(vec![permanent("m1", Role::User, "boom")]);
        let msgs = cache.messages();
        let failed = msgs.iter().find(|m| m.id == id).unwrap();
        assert_eq!(failed.delivery_status(), Some(STATUS_FAILED));

        let again = cache.retry(&id).unwrap();
        assert_eq!(again.delivery_status(), Some(STATUS_SENDING));
        assert_eq!(cache.state(&id), Some(TempState::Pending));
        assert!(cache.retry(&id).is_none());
    }

    #[test]
    fn unknown_temp_id_is_reported() {
        let mut cache = MessageCache::new();
        assert!(!cache.mark_failed("temp-0-0"));
        assert!(cache.retry("temp-0-0").is_none());
    }

    #[test]
    fn messages_are_sorted_by_created_at() {
        let mut cache = MessageCache::new();
        let id = cache.insert_optimistic(Role::User, "later", Metadata::new());
        let mut early = permanent("p0", Role::Assistant, "earlier");
        early.created_at = Utc::now() - Duration::minutes(5);
        cache.apply_authoritative(vec![early]);

        let ids: Vec<String> = cache.messages().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["p0".to_string(), id]);
    }

    #[test]
    fn caller_metadata_is_kept() {
        let mut cache = MessageCache::new();
        let mut meta = Metadata::new();
        meta.insert("source".into(), json!("composer"));
        cache.insert_optimistic(Role::User, "x", meta);
        assert_eq!(cache.messages()[0].metadata["source"], "composer");
    }
}
