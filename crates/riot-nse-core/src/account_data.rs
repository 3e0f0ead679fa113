//! User and room account data.
//!
//! Account data is keyed by event type with free-form JSON content. Only the
//! handful of types the extension reads get typed accessors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Account data type carrying the user's push rules.
pub const PUSH_RULES_EVENT_TYPE: &str = "m.push_rules";

/// Room account data type carrying the room's tags.
pub const TAG_EVENT_TYPE: &str = "m.tag";

/// Global account data of the logged-in user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountData(BTreeMap<String, serde_json::Value>);

impl AccountData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, event_type: &str) -> Option<&serde_json::Value> {
        self.0.get(event_type)
    }

    pub fn insert(&mut self, event_type: impl Into<String>, content: serde_json::Value) {
        self.0.insert(event_type.into(), content);
    }

    /// The `m.push_rules` content, needed to decide whether to notify.
    pub fn push_rules(&self) -> Option<&serde_json::Value> {
        self.get(PUSH_RULES_EVENT_TYPE)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn event_types(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Account data attached to a single room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomAccountData(BTreeMap<String, serde_json::Value>);

impl RoomAccountData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, event_type: &str) -> Option<&serde_json::Value> {
        self.0.get(event_type)
    }

    pub fn insert(&mut self, event_type: impl Into<String>, content: serde_json::Value) {
        self.0.insert(event_type.into(), content);
    }

    /// Tag names from `m.tag` (e.g. `m.favourite`), empty if none.
    pub fn tags(&self) -> Vec<&str> {
        self.get(TAG_EVENT_TYPE)
            .and_then(|content| content.get("tags"))
            .and_then(serde_json::Value::as_object)
            .map(|tags| tags.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_push_rules_accessor() {
        let mut data = AccountData::new();
        assert!(data.push_rules().is_none());

        data.insert(PUSH_RULES_EVENT_TYPE, json!({ "global": { "override": [] } }));
        assert!(data.push_rules().unwrap().get("global").is_some());
    }

    #[test]
    fn test_room_tags() {
        let mut data = RoomAccountData::new();
        assert!(data.tags().is_empty());

        data.insert(
            TAG_EVENT_TYPE,
            json!({ "tags": { "m.favourite": { "order": 0.5 }, "u.work": {} } }),
        );
        assert_eq!(data.tags(), vec!["m.favourite", "u.work"]);
    }

    #[test]
    fn test_transparent_json() {
        let direct = json!({ "m.direct": { "@bob:example.org": ["!r:example.org"] } });
        let data: AccountData = serde_json::from_value(direct).unwrap();
        assert_eq!(data.event_types().collect::<Vec<_>>(), vec!["m.direct"]);
    }
}
