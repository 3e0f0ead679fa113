//! The overlay store handed to the sync engine inside the extension.
//!
//! It presents itself as a permanent store so the engine resumes from the
//! persisted cursor instead of running an initial sync, but it never writes
//! to the store the main application owns:
//!
//! | operation                         | behaviour                          |
//! |-----------------------------------|------------------------------------|
//! | cursor get                        | override, else underlying cursor   |
//! | cursor set                        | override only                      |
//! | user account data get / set       | underlying / discarded             |
//! | room state, summary, account data | reads delegate, writes discarded   |
//! | user lookup                       | built from the id, no store query  |
//! | permanence                        | always `true`                      |
//! | commit                            | nothing to flush                   |
//! | close                             | closes the underlying store        |

use std::sync::Arc;

use async_trait::async_trait;

use riot_nse_core::{
    AccountData, Credentials, EventStreamToken, RoomAccountData, RoomId, RoomSummary, StateEvent,
    User, UserId,
};
use riot_nse_store::{Result, SessionStore};

use crate::container::SharedStore;
use crate::cursor::CursorOverride;

/// A per-invocation view over the shared durable store.
///
/// Cheap to build; create one per handled notification and drop it
/// afterwards.
pub struct OverlayStore<S> {
    credentials: Credentials,
    underlying: Arc<S>,
    cursor: Arc<CursorOverride>,
}

impl<S: SessionStore> OverlayStore<S> {
    /// Build an overlay over an already created shared store.
    pub fn new(credentials: Credentials, shared: &SharedStore<S>) -> Self {
        Self {
            credentials,
            underlying: Arc::clone(shared.store()),
            cursor: Arc::clone(shared.cursor()),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The shared durable store this overlay reads from.
    pub fn underlying(&self) -> &Arc<S> {
        &self.underlying
    }
}

#[async_trait]
impl<S: SessionStore> SessionStore for OverlayStore<S> {
    fn event_stream_token(&self) -> Option<EventStreamToken> {
        self.cursor
            .get()
            .or_else(|| self.underlying.event_stream_token())
    }

    fn set_event_stream_token(&self, token: Option<EventStreamToken>) {
        tracing::debug!(token = ?token, "advancing overlay cursor");
        self.cursor.set(token);
    }

    fn user_account_data(&self) -> Option<AccountData> {
        self.underlying.user_account_data()
    }

    fn set_user_account_data(&self, _data: Option<AccountData>) {
        tracing::debug!("discarding account data update");
    }

    fn is_permanent(&self) -> bool {
        true
    }

    async fn store_state(&self, room_id: &RoomId, state_events: &[StateEvent]) -> Result<()> {
        tracing::debug!(
            room_id = %room_id,
            count = state_events.len(),
            "discarding room state"
        );
        Ok(())
    }

    async fn room_state(&self, room_id: &RoomId) -> Result<Vec<StateEvent>> {
        self.underlying.room_state(room_id).await
    }

    async fn store_room_summary(&self, summary: &RoomSummary) -> Result<()> {
        tracing::debug!(room_id = %summary.room_id, "discarding room summary");
        Ok(())
    }

    async fn room_summary(&self, room_id: &RoomId) -> Result<Option<RoomSummary>> {
        self.underlying.room_summary(room_id).await
    }

    async fn store_room_account_data(
        &self,
        room_id: &RoomId,
        _account_data: &RoomAccountData,
    ) -> Result<()> {
        tracing::debug!(room_id = %room_id, "discarding room account data");
        Ok(())
    }

    async fn room_account_data(&self, room_id: &RoomId) -> Result<Option<RoomAccountData>> {
        self.underlying.room_account_data(room_id).await
    }

    async fn store_user(&self, _user: &User) -> Result<()> {
        Ok(())
    }

    async fn user(&self, user_id: &UserId) -> Result<Option<User>> {
        if *user_id == self.credentials.user_id {
            return Ok(Some(User::own(user_id.clone())));
        }
        Ok(Some(User::minimal(user_id.clone())))
    }

    async fn commit(&self) -> Result<()> {
        Ok(())
    }

    /// Closes the shared store for every overlay in the process, not just
    /// this one.
    async fn close(&self) -> Result<()> {
        tracing::debug!(user_id = %self.credentials.user_id, "closing shared store from overlay");
        self.underlying.close().await
    }
}
