//! Room state events.

use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// A state event as delivered by the server in a sync response.
///
/// Field names follow the Matrix client-server JSON shape so events can be
/// stored and read back without a translation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,

    /// Event type, e.g. `m.room.member`.
    #[serde(rename = "type")]
    pub event_type: String,

    /// State key; empty for room-wide state such as `m.room.name`.
    pub state_key: String,

    pub sender: UserId,

    /// Event content, left uninterpreted.
    #[serde(default)]
    pub content: serde_json::Value,

    /// Server timestamp (Unix ms).
    #[serde(default)]
    pub origin_server_ts: i64,
}

impl StateEvent {
    pub fn new(
        event_type: impl Into<String>,
        state_key: impl Into<String>,
        sender: UserId,
        content: serde_json::Value,
    ) -> Self {
        Self {
            event_id: None,
            event_type: event_type.into(),
            state_key: state_key.into(),
            sender,
            content,
            origin_server_ts: 0,
        }
    }

    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    pub fn with_timestamp(mut self, origin_server_ts: i64) -> Self {
        self.origin_server_ts = origin_server_ts;
        self
    }

    /// The `(type, state_key)` pair that identifies this piece of state.
    pub fn state_slot(&self) -> (&str, &str) {
        (&self.event_type, &self.state_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_matrix_json_field_names() {
        let raw = json!({
            "event_id": "$abc",
            "type": "m.room.name",
            "state_key": "",
            "sender": "@alice:example.org",
            "content": { "name": "Lobby" },
            "origin_server_ts": 1700000000000i64
        });

        let event: StateEvent = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(event.state_slot(), ("m.room.name", ""));
        assert_eq!(event.content["name"], "Lobby");
        assert_eq!(serde_json::to_value(&event).unwrap(), raw);
    }

    #[test]
    fn test_rejects_invalid_sender() {
        let raw = json!({
            "type": "m.room.name",
            "state_key": "",
            "sender": "alice",
            "content": {}
        });
        assert!(serde_json::from_value::<StateEvent>(raw).is_err());
    }
}
