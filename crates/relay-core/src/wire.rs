//! WebSocket frame envelope shared by server and client.
//!
//! Every frame is a JSON object `{type, ...payload, timestamp}`.

use crate::bus::{BusEvent, EventKind};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const PING: &str = "ping";
pub const PONG: &str = "pong";
/// Suffix of frames carrying an integration message, e.g. `slack_message`.
pub const INBOUND_SUFFIX: &str = "_message";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WsFrame {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
    #[serde(default)]
    pub timestamp: i64,
}

impl WsFrame {
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        let mut map = match payload {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        map.remove("type");
        map.remove("timestamp");
        Self {
            kind: kind.into(),
            payload: map,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn ping() -> Self {
        Self::new(PING, Value::Null)
    }

    pub fn pong() -> Self {
        Self::new(PONG, Value::Null)
    }

    pub fn is_ping(&self) -> bool {
        self.kind == PING
    }

    pub fn is_pong(&self) -> bool {
        self.kind == PONG
    }

    /// Frame for a bus event. Inbound messages are typed `<service>_message`.
    pub fn from_event(event: &BusEvent) -> Self {
        let kind = match event.kind {
            EventKind::InboundMessage => format!("{}{INBOUND_SUFFIX}", event.source),
            other => other.as_str().to_string(),
        };
        let mut frame = Self::new(kind, event.payload.clone());
        frame.timestamp = event.timestamp;
        frame
    }

    /// Bus event carried by this frame; `None` for ping/pong and unknown types.
    pub fn to_event(&self) -> Option<BusEvent> {
        let (kind, source) = match self.kind.as_str() {
            "connection_status" => (EventKind::ConnectionStatus, "relay".to_string()),
            "message_created" => (EventKind::MessageCreated, "relay".to_string()),
            other => {
                let service = other.strip_suffix(INBOUND_SUFFIX)?;
                if service.is_empty() {
                    return None;
                }
                (EventKind::InboundMessage, service.to_string())
            }
        };
        Some(BusEvent {
            kind,
            source,
            payload: Value::Object(self.payload.clone()),
            timestamp: self.timestamp,
        })
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!(r#"{{"type":"{}"}}"#, self.kind))
    }

    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_is_flattened_next_to_type() {
        let frame = WsFrame::new("slack_message", json!({ "text": "hi", "channel": "C1" }));
        let v: Value = serde_json::from_str(&frame.to_json()).unwrap();
        assert_eq!(v["type"], "slack_message");
        assert_eq!(v["text"], "hi");
        assert!(v["timestamp"].as_i64().unwrap() > 0);
    }

    #[test]
    fn reserved_keys_in_payload_are_dropped() {
        let frame = WsFrame::new("ping", json!({ "type": "spoof", "timestamp": 1 }));
        assert_eq!(frame.kind, "ping");
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn inbound_event_maps_to_service_message_frame_and_back() {
        let event = BusEvent::inbound("gorgias", json!({ "message": "ticket 42" }));
        let frame = WsFrame::from_event(&event);
        assert_eq!(frame.kind, "gorgias_message");
        assert_eq!(frame.timestamp, event.timestamp);

        let back = frame.to_event().unwrap();
        assert_eq!(back.kind, EventKind::InboundMessage);
        assert_eq!(back.source, "gorgias");
        assert_eq!(back.payload["message"], "ticket 42");
    }

    #[test]
    fn control_frames_carry_no_event() {
        assert!(WsFrame::ping().to_event().is_none());
        assert!(WsFrame::pong().to_event().is_none());
        assert!(WsFrame::new("_message", Value::Null).to_event().is_none());
    }

    #[test]
    fn parse_accepts_minimal_frame() {
        let frame = WsFrame::parse(r#"{"type":"pong"}"#).unwrap();
        assert!(frame.is_pong());
        assert_eq!(frame.timestamp, 0);
        assert!(WsFrame::parse("not json").is_none());
    }
}
