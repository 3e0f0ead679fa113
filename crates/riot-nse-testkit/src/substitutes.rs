//! Substitute stores for dependency substitution in tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use riot_nse_core::{
    AccountData, EventStreamToken, RoomAccountData, RoomId, RoomSummary, StateEvent, User, UserId,
};
use riot_nse_store::{Result, SessionStore, StoreError};

/// Snapshot of how often each operation reached a [`CountingStore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub event_stream_token: usize,
    pub set_event_stream_token: usize,
    pub user_account_data: usize,
    pub set_user_account_data: usize,
    pub store_state: usize,
    pub room_state: usize,
    pub store_room_summary: usize,
    pub room_summary: usize,
    pub store_room_account_data: usize,
    pub room_account_data: usize,
    pub store_user: usize,
    pub user: usize,
    pub commit: usize,
    pub close: usize,
}

impl CallCounts {
    /// Total number of write operations received.
    pub fn writes(&self) -> usize {
        self.set_event_stream_token
            + self.set_user_account_data
            + self.store_state
            + self.store_room_summary
            + self.store_room_account_data
            + self.store_user
            + self.commit
    }
}

#[derive(Default)]
struct Counters {
    event_stream_token: AtomicUsize,
    set_event_stream_token: AtomicUsize,
    user_account_data: AtomicUsize,
    set_user_account_data: AtomicUsize,
    store_state: AtomicUsize,
    room_state: AtomicUsize,
    store_room_summary: AtomicUsize,
    room_summary: AtomicUsize,
    store_room_account_data: AtomicUsize,
    room_account_data: AtomicUsize,
    store_user: AtomicUsize,
    user: AtomicUsize,
    commit: AtomicUsize,
    close: AtomicUsize,
}

fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::SeqCst);
}

/// Wraps a store and counts every call before delegating to it.
pub struct CountingStore<S> {
    inner: S,
    counters: Counters,
}

impl<S: SessionStore> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            counters: Counters::default(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn calls(&self) -> CallCounts {
        let c = &self.counters;
        let load = |a: &AtomicUsize| a.load(Ordering::SeqCst);
        CallCounts {
            event_stream_token: load(&c.event_stream_token),
            set_event_stream_token: load(&c.set_event_stream_token),
            user_account_data: load(&c.user_account_data),
            set_user_account_data: load(&c.set_user_account_data),
            store_state: load(&c.store_state),
            room_state: load(&c.room_state),
            store_room_summary: load(&c.store_room_summary),
            room_summary: load(&c.room_summary),
            store_room_account_data: load(&c.store_room_account_data),
            room_account_data: load(&c.room_account_data),
            store_user: load(&c.store_user),
            user: load(&c.user),
            commit: load(&c.commit),
            close: load(&c.close),
        }
    }
}

#[async_trait]
impl<S: SessionStore> SessionStore for CountingStore<S> {
    fn event_stream_token(&self) -> Option<EventStreamToken> {
        bump(&self.counters.event_stream_token);
        self.inner.event_stream_token()
    }

    fn set_event_stream_token(&self, token: Option<EventStreamToken>) {
        bump(&self.counters.set_event_stream_token);
        self.inner.set_event_stream_token(token)
    }

    fn user_account_data(&self) -> Option<AccountData> {
        bump(&self.counters.user_account_data);
        self.inner.user_account_data()
    }

    fn set_user_account_data(&self, data: Option<AccountData>) {
        bump(&self.counters.set_user_account_data);
        self.inner.set_user_account_data(data)
    }

    fn is_permanent(&self) -> bool {
        self.inner.is_permanent()
    }

    async fn store_state(&self, room_id: &RoomId, state_events: &[StateEvent]) -> Result<()> {
        bump(&self.counters.store_state);
        self.inner.store_state(room_id, state_events).await
    }

    async fn room_state(&self, room_id: &RoomId) -> Result<Vec<StateEvent>> {
        bump(&self.counters.room_state);
        self.inner.room_state(room_id).await
    }

    async fn store_room_summary(&self, summary: &RoomSummary) -> Result<()> {
        bump(&self.counters.store_room_summary);
        self.inner.store_room_summary(summary).await
    }

    async fn room_summary(&self, room_id: &RoomId) -> Result<Option<RoomSummary>> {
        bump(&self.counters.room_summary);
        self.inner.room_summary(room_id).await
    }

    async fn store_room_account_data(
        &self,
        room_id: &RoomId,
        account_data: &RoomAccountData,
    ) -> Result<()> {
        bump(&self.counters.store_room_account_data);
        self.inner.store_room_account_data(room_id, account_data).await
    }

    async fn room_account_data(&self, room_id: &RoomId) -> Result<Option<RoomAccountData>> {
        bump(&self.counters.room_account_data);
        self.inner.room_account_data(room_id).await
    }

    async fn store_user(&self, user: &User) -> Result<()> {
        bump(&self.counters.store_user);
        self.inner.store_user(user).await
    }

    async fn user(&self, user_id: &UserId) -> Result<Option<User>> {
        bump(&self.counters.user);
        self.inner.user(user_id).await
    }

    async fn commit(&self) -> Result<()> {
        bump(&self.counters.commit);
        self.inner.commit().await
    }

    async fn close(&self) -> Result<()> {
        bump(&self.counters.close);
        self.inner.close().await
    }
}

/// A store whose every fallible operation fails with
/// [`StoreError::Backend`] carrying a fixed message.
pub struct FailingStore {
    message: String,
}

impl FailingStore {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn fail<T>(&self) -> Result<T> {
        Err(StoreError::Backend(self.message.clone()))
    }
}

#[async_trait]
impl SessionStore for FailingStore {
    fn event_stream_token(&self) -> Option<EventStreamToken> {
        None
    }

    fn set_event_stream_token(&self, _token: Option<EventStreamToken>) {}

    fn user_account_data(&self) -> Option<AccountData> {
        None
    }

    fn set_user_account_data(&self, _data: Option<AccountData>) {}

    fn is_permanent(&self) -> bool {
        true
    }

    async fn store_state(&self, _room_id: &RoomId, _state_events: &[StateEvent]) -> Result<()> {
        self.fail()
    }

    async fn room_state(&self, _room_id: &RoomId) -> Result<Vec<StateEvent>> {
        self.fail()
    }

    async fn store_room_summary(&self, _summary: &RoomSummary) -> Result<()> {
        self.fail()
    }

    async fn room_summary(&self, _room_id: &RoomId) -> Result<Option<RoomSummary>> {
        self.fail()
    }

    async fn store_room_account_data(
        &self,
        _room_id: &RoomId,
        _account_data: &RoomAccountData,
    ) -> Result<()> {
        self.fail()
    }

    async fn room_account_data(&self, _room_id: &RoomId) -> Result<Option<RoomAccountData>> {
        self.fail()
    }

    async fn store_user(&self, _user: &User) -> Result<()> {
        self.fail()
    }

    async fn user(&self, _user_id: &UserId) -> Result<Option<User>> {
        self.fail()
    }

    async fn commit(&self) -> Result<()> {
        self.fail()
    }

    async fn close(&self) -> Result<()> {
        self.fail()
    }
}
