//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::json;

use riot_nse_core::{EventStreamToken, RoomId, StateEvent, UserId};

/// Generate a sync token shaped like the server's.
pub fn event_stream_token() -> impl Strategy<Value = EventStreamToken> {
    "s[0-9]{1,8}_[0-9]{1,6}_[0-9]{1,4}".prop_map(|s| {
        EventStreamToken::new(s).expect("pattern never yields an empty token")
    })
}

/// Generate a user id on one of a few servers.
pub fn user_id() -> impl Strategy<Value = UserId> {
    ("[a-z][a-z0-9._-]{0,15}", server_name()).prop_map(|(local, server)| {
        UserId::parse(format!("@{}:{}", local, server)).expect("valid user id")
    })
}

/// Generate a room id on one of a few servers.
pub fn room_id() -> impl Strategy<Value = RoomId> {
    ("[A-Za-z]{8,18}", server_name()).prop_map(|(opaque, server)| {
        RoomId::parse(format!("!{}:{}", opaque, server)).expect("valid room id")
    })
}

fn server_name() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("example.org"),
        Just("matrix.org"),
        Just("localhost:8448"),
    ]
}

/// Generate a room-wide state event of a common type.
pub fn state_event() -> impl Strategy<Value = StateEvent> {
    (
        prop_oneof![
            Just("m.room.name"),
            Just("m.room.topic"),
            Just("m.room.avatar"),
            Just("m.room.join_rules"),
        ],
        user_id(),
        "[ -~]{0,40}",
        0i64..=1_800_000_000_000i64,
    )
        .prop_map(|(event_type, sender, text, ts)| {
            StateEvent::new(event_type, "", sender, json!({ "value": text })).with_timestamp(ts)
        })
}
