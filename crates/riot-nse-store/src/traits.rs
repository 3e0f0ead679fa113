//! SessionStore trait: the capability set a sync engine needs from a store.
//!
//! The sync engine is storage-agnostic. Implementations include the durable
//! SQLite [`FileStore`](crate::FileStore), the in-memory
//! [`MemoryStore`](crate::MemoryStore), and overlays that wrap another store.

use async_trait::async_trait;
use riot_nse_core::{
    AccountData, EventStreamToken, RoomAccountData, RoomId, RoomSummary, StateEvent, User, UserId,
};

use crate::error::Result;

/// The SessionStore trait: persisted sync state of one account.
///
/// Cursor and account-data accessors are synchronous because stores keep
/// them in memory once loaded; durable stores write them back on
/// [`commit`](SessionStore::commit). Room and user data are async so SQLite
/// work can run off the runtime threads.
///
/// # Design Notes
///
/// - **Permanence**: a sync engine only resumes from the cursor (incremental
///   sync) when [`is_permanent`](SessionStore::is_permanent) is true.
/// - **Errors**: read failures are returned to the caller as-is.
#[async_trait]
pub trait SessionStore: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Sync Metadata
    // ─────────────────────────────────────────────────────────────────────────

    /// The cursor the next incremental sync should resume from.
    fn event_stream_token(&self) -> Option<EventStreamToken>;

    /// Record the cursor after a sync response has been processed.
    ///
    /// `None` forgets the cursor, forcing the next sync to be initial.
    fn set_event_stream_token(&self, token: Option<EventStreamToken>);

    /// Global account data of the logged-in user (push rules, ...).
    fn user_account_data(&self) -> Option<AccountData>;

    /// Replace the user's global account data.
    fn set_user_account_data(&self, data: Option<AccountData>);

    /// Whether the store keeps data across process restarts.
    fn is_permanent(&self) -> bool;

    // ─────────────────────────────────────────────────────────────────────────
    // Room Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Store state events for a room.
    ///
    /// Events replace any stored event with the same `(type, state_key)`.
    async fn store_state(&self, room_id: &RoomId, state_events: &[StateEvent]) -> Result<()>;

    /// Get the stored state events of a room; empty if none.
    async fn room_state(&self, room_id: &RoomId) -> Result<Vec<StateEvent>>;

    /// Store or replace a room summary.
    async fn store_room_summary(&self, summary: &RoomSummary) -> Result<()>;

    /// Get a room's summary.
    async fn room_summary(&self, room_id: &RoomId) -> Result<Option<RoomSummary>>;

    /// Store or replace a room's account data.
    async fn store_room_account_data(
        &self,
        room_id: &RoomId,
        account_data: &RoomAccountData,
    ) -> Result<()>;

    /// Get a room's account data.
    async fn room_account_data(&self, room_id: &RoomId) -> Result<Option<RoomAccountData>>;

    // ─────────────────────────────────────────────────────────────────────────
    // User Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Store or replace a user profile.
    async fn store_user(&self, user: &User) -> Result<()>;

    /// Resolve a user by id.
    async fn user(&self, user_id: &UserId) -> Result<Option<User>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Flush pending metadata changes to durable storage.
    async fn commit(&self) -> Result<()>;

    /// Close the store. Operations after close fail.
    async fn close(&self) -> Result<()>;
}
