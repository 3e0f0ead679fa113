//! In-memory implementation of the SessionStore trait.
//!
//! This is primarily for testing. It has the same read/write semantics as
//! [`FileStore`](crate::FileStore) but keeps everything in memory, so it
//! reports itself as non-permanent.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use riot_nse_core::{
    AccountData, EventStreamToken, RoomAccountData, RoomId, RoomSummary, StateEvent, User, UserId,
};

use crate::error::Result;
use crate::traits::SessionStore;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    event_stream_token: Option<EventStreamToken>,

    user_account_data: Option<AccountData>,

    /// Room state in first-stored order; a later event for the same
    /// `(type, state_key)` replaces the earlier one in place.
    room_state: HashMap<RoomId, Vec<StateEvent>>,

    room_summaries: HashMap<RoomId, RoomSummary>,

    room_account_data: HashMap<RoomId, RoomAccountData>,

    users: HashMap<UserId, User>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryStoreInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryStoreInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Merge `incoming` into `existing`, replacing events by state slot.
pub(crate) fn merge_state(existing: &mut Vec<StateEvent>, incoming: &[StateEvent]) {
    for event in incoming {
        match existing
            .iter_mut()
            .find(|stored| stored.state_slot() == event.state_slot())
        {
            Some(stored) => *stored = event.clone(),
            None => existing.push(event.clone()),
        }
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    fn event_stream_token(&self) -> Option<EventStreamToken> {
        self.read().event_stream_token.clone()
    }

    fn set_event_stream_token(&self, token: Option<EventStreamToken>) {
        self.write().event_stream_token = token;
    }

    fn user_account_data(&self) -> Option<AccountData> {
        self.read().user_account_data.clone()
    }

    fn set_user_account_data(&self, data: Option<AccountData>) {
        self.write().user_account_data = data;
    }

    fn is_permanent(&self) -> bool {
        false
    }

    async fn store_state(&self, room_id: &RoomId, state_events: &[StateEvent]) -> Result<()> {
        let mut inner = self.write();
        let state = inner.room_state.entry(room_id.clone()).or_default();
        merge_state(state, state_events);
        Ok(())
    }

    async fn room_state(&self, room_id: &RoomId) -> Result<Vec<StateEvent>> {
        Ok(self.read().room_state.get(room_id).cloned().unwrap_or_default())
    }

    async fn store_room_summary(&self, summary: &RoomSummary) -> Result<()> {
        self.write()
            .room_summaries
            .insert(summary.room_id.clone(), summary.clone());
        Ok(())
    }

    async fn room_summary(&self, room_id: &RoomId) -> Result<Option<RoomSummary>> {
        Ok(self.read().room_summaries.get(room_id).cloned())
    }

    async fn store_room_account_data(
        &self,
        room_id: &RoomId,
        account_data: &RoomAccountData,
    ) -> Result<()> {
        self.write()
            .room_account_data
            .insert(room_id.clone(), account_data.clone());
        Ok(())
    }

    async fn room_account_data(&self, room_id: &RoomId) -> Result<Option<RoomAccountData>> {
        Ok(self.read().room_account_data.get(room_id).cloned())
    }

    async fn store_user(&self, user: &User) -> Result<()> {
        self.write().users.insert(user.user_id.clone(), user.clone());
        Ok(())
    }

    async fn user(&self, user_id: &UserId) -> Result<Option<User>> {
        Ok(self.read().users.get(user_id).cloned())
    }

    async fn commit(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn room() -> RoomId {
        RoomId::parse("!room:example.org").unwrap()
    }

    fn alice() -> UserId {
        UserId::parse("@alice:example.org").unwrap()
    }

    #[tokio::test]
    async fn test_memory_store_state_replaces_by_slot() {
        let store = MemoryStore::new();

        let name_v1 = StateEvent::new("m.room.name", "", alice(), json!({ "name": "One" }));
        let topic = StateEvent::new("m.room.topic", "", alice(), json!({ "topic": "t" }));
        let name_v2 = StateEvent::new("m.room.name", "", alice(), json!({ "name": "Two" }));

        store.store_state(&room(), &[name_v1, topic]).await.unwrap();
        store.store_state(&room(), &[name_v2]).await.unwrap();

        let state = store.room_state(&room()).await.unwrap();
        assert_eq!(state.len(), 2);
        assert_eq!(state[0].content["name"], "Two");

        assert_eq!(state[1].state_slot(), ("m.room.topic", ""));
        assert_eq!(state[1].content["topic"], "t");
    }

    #[tokio::test]
    async fn test_memory_store_metadata() {
        let store = MemoryStore::new();
        assert!(!store.is_permanent());
        assert!(store.event_stream_token().is_none());

        store.set_event_stream_token(Some(EventStreamToken::new("s1").unwrap()));
        assert_eq!(store.event_stream_token().unwrap().as_str(), "s1");

        store.set_event_stream_token(None);
        assert!(store.event_stream_token().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_unknown_room() {
        let store = MemoryStore::new();
        assert!(store.room_state(&room()).await.unwrap().is_empty());
        assert!(store.room_summary(&room()).await.unwrap().is_none());
        assert!(store.room_account_data(&room()).await.unwrap().is_none());
        assert!(store.user(&alice()).await.unwrap().is_none());
    }

    proptest::proptest! {
        #[test]
        fn test_merge_state_keeps_last_event_per_slot(
            writes in proptest::collection::vec((0usize..4, 0usize..3, 0u32..100), 0..40),
        ) {
            const TYPES: [&str; 4] =
                ["m.room.name", "m.room.topic", "m.room.member", "m.room.avatar"];
            const KEYS: [&str; 3] = ["", "@alice:example.org", "@bob:example.org"];

            let mut state = Vec::new();
            for (t, k, n) in &writes {
                let event = StateEvent::new(TYPES[*t], KEYS[*k], alice(), json!({ "n": n }));
                merge_state(&mut state, &[event]);
            }

            let mut slots: Vec<_> = state.iter().map(StateEvent::state_slot).collect();
            let total = slots.len();
            slots.sort();
            slots.dedup();
            proptest::prop_assert_eq!(slots.len(), total);

            for event in &state {
                let last = writes
                    .iter()
                    .rev()
                    .find(|(t, k, _)| event.state_slot() == (TYPES[*t], KEYS[*k]))
                    .map(|(_, _, n)| *n);
                proptest::prop_assert_eq!(event.content["n"].as_u64(), last.map(u64::from));
            }
        }
    }
}
