//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::json;

use riot_nse::{NseConfig, StoreContainer};
use riot_nse_core::{
    Credentials, DeviceId, EventStreamToken, Membership, RoomId, RoomSummary, StateEvent, UserId,
};
use riot_nse_store::{MemoryStore, SessionStore};

/// Homeserver used by every fixture account.
pub const TEST_SERVER: &str = "example.org";

/// A test account: credentials plus data builders.
pub struct TestAccount {
    pub credentials: Credentials,
}

impl TestAccount {
    /// An account `@<localpart>:example.org` with a random device id.
    pub fn new(localpart: &str) -> Self {
        let user_id = UserId::parse(format!("@{}:{}", localpart, TEST_SERVER))
            .expect("fixture localpart must form a valid user id");
        let device: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(10)
            .map(char::from)
            .collect();

        let credentials = Credentials::new(user_id, format!("https://matrix.{}", TEST_SERVER))
            .with_device_id(DeviceId::new(device.to_uppercase()).expect("non-empty device id"))
            .with_access_token(format!("syt_{}", device));

        Self { credentials }
    }

    pub fn user_id(&self) -> UserId {
        self.credentials.user_id.clone()
    }

    /// A room id on the test server.
    pub fn room(&self, name: &str) -> RoomId {
        RoomId::parse(format!("!{}:{}", name, TEST_SERVER)).expect("valid room id")
    }

    /// A random sync token in the server's `s<n>_<n>` style.
    pub fn random_token(&self) -> EventStreamToken {
        let mut rng = rand::thread_rng();
        EventStreamToken::new(format!(
            "s{}_{}",
            rng.gen_range(1..1_000_000u32),
            rng.gen_range(1..10_000u32)
        ))
        .expect("non-empty token")
    }

    /// `m.room.name` sent by this account.
    pub fn room_name_event(&self, name: &str) -> StateEvent {
        StateEvent::new("m.room.name", "", self.user_id(), json!({ "name": name }))
    }

    /// `m.room.member` join for `member`, sent by that member.
    pub fn member_event(&self, member: &UserId, display_name: &str) -> StateEvent {
        StateEvent::new(
            "m.room.member",
            member.as_str(),
            member.clone(),
            json!({ "membership": "join", "displayname": display_name }),
        )
    }

    /// A joined-room summary with a display name.
    pub fn summary(&self, room_id: &RoomId, display_name: &str) -> RoomSummary {
        RoomSummary {
            display_name: Some(display_name.to_string()),
            membership: Membership::Join,
            joined_members_count: 2,
            ..RoomSummary::joined(room_id.clone())
        }
    }

    /// An in-memory store holding `token` as its cursor.
    pub fn seeded_memory_store(&self, token: &EventStreamToken) -> MemoryStore {
        let store = MemoryStore::new();
        store.set_event_stream_token(Some(token.clone()));
        store
    }

    /// A container already holding `store` for this account.
    pub fn container_with<S: SessionStore>(&self, store: S) -> StoreContainer<S> {
        StoreContainer::with_store(
            NseConfig::default(),
            self.credentials.clone(),
            Arc::new(store),
        )
    }
}

/// Create several distinct accounts for multi-account tests.
pub fn multi_account_fixtures(count: usize) -> Vec<TestAccount> {
    (0..count)
        .map(|i| TestAccount::new(&format!("user{}", i)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_shape() {
        let account = TestAccount::new("alice");
        assert_eq!(account.user_id().as_str(), "@alice:example.org");
        assert!(account.credentials.device_id.is_some());
        assert_eq!(account.room("lobby").as_str(), "!lobby:example.org");
    }

    #[test]
    fn test_multi_account() {
        let accounts = multi_account_fixtures(3);
        assert_ne!(accounts[0].user_id(), accounts[1].user_id());
        assert_ne!(accounts[1].user_id(), accounts[2].user_id());
    }

    #[tokio::test]
    async fn test_seeded_store() {
        let account = TestAccount::new("alice");
        let token = account.random_token();
        let store = account.seeded_memory_store(&token);
        assert_eq!(store.event_stream_token(), Some(token));
    }
}
