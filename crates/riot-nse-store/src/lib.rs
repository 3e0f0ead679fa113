//! # Riot NSE Store
//!
//! Storage abstraction for Matrix session state. Provides the
//! [`SessionStore`] capability trait consumed by the sync engine, with a
//! durable SQLite implementation and an in-memory one.
//!
//! ## Key Types
//!
//! - [`SessionStore`] - The async trait for all session store operations
//! - [`FileStore`] - SQLite-backed durable store scoped to one account
//! - [`MemoryStore`] - Non-permanent in-memory store for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use riot_nse_core::{Credentials, UserId};
//! use riot_nse_store::{FileStore, SessionStore};
//!
//! async fn example() {
//!     let credentials = Credentials::new(
//!         UserId::parse("@alice:example.org").unwrap(),
//!         "https://matrix.example.org",
//!     );
//!
//!     // Open the account's database and load the persisted cursor
//!     let store = FileStore::open("session.sqlite3", credentials).unwrap();
//!     store.load_metadata().await.unwrap();
//!
//!     let since = store.event_stream_token();
//!     // ... run an incremental sync from `since` ...
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Cached metadata**: the event-stream cursor and user account data live in
//!   memory after `load_metadata` and are written back on `commit`.
//! - **Owner check**: a database persisted for another account is wiped when
//!   a writable store loads its metadata. A store opened with
//!   [`FileStore::open_read_only`] reports [`StoreError::ForeignOwner`] and
//!   leaves the file alone.
//! - **Closed stores**: every operation after `close` fails with
//!   [`StoreError::Closed`].

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::FileStore;
pub use traits::SessionStore;
