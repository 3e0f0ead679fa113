//! Room summaries.

use serde::{Deserialize, Serialize};

use crate::types::RoomId;

/// The local user's membership in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Membership {
    Join,
    Invite,
    Leave,
    Ban,
    Knock,
}

/// Precomputed, display-oriented facts about a room.
///
/// The notification extension reads these to render a notification title
/// without replaying the room's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub room_id: RoomId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    pub membership: Membership,

    #[serde(default)]
    pub joined_members_count: u64,

    #[serde(default)]
    pub invited_members_count: u64,

    #[serde(default)]
    pub is_encrypted: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_event_id: Option<String>,
}

impl RoomSummary {
    /// A summary for a joined room with nothing else known.
    pub fn joined(room_id: RoomId) -> Self {
        Self {
            room_id,
            display_name: None,
            avatar_url: None,
            membership: Membership::Join,
            joined_members_count: 0,
            invited_members_count: 0,
            is_encrypted: false,
            last_message_event_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_json() {
        assert_eq!(serde_json::to_string(&Membership::Invite).unwrap(), "\"invite\"");
    }

    #[test]
    fn test_joined_summary_defaults() {
        let summary = RoomSummary::joined(RoomId::parse("!r:example.org").unwrap());
        assert_eq!(summary.membership, Membership::Join);
        assert_eq!(summary.joined_members_count, 0);
        assert!(summary.display_name.is_none());
    }
}
