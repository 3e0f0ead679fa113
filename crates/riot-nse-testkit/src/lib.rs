//! # Riot NSE Testkit
//!
//! Testing utilities for the notification extension store.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: an account with credentials and builders for realistic
//!   room data
//! - **Generators**: Proptest strategies for tokens, ids and state events
//! - **Substitutes**: stores that count the calls they receive or fail every
//!   read, for checking what an overlay forwards
//!
//! ## Test Fixtures
//!
//! ```rust
//! use riot_nse_testkit::fixtures::TestAccount;
//!
//! let account = TestAccount::new("alice");
//! let event = account.room_name_event("Lobby");
//! assert_eq!(event.sender, account.user_id());
//! ```
//!
//! ## Counting Calls
//!
//! ```rust,ignore
//! let store = CountingStore::new(MemoryStore::new());
//! overlay_over(&store).user(&bob).await?;
//! assert_eq!(store.calls().user, 0);
//! ```

pub mod fixtures;
pub mod generators;
pub mod substitutes;

pub use fixtures::{multi_account_fixtures, TestAccount};
pub use generators::{event_stream_token, room_id, state_event, user_id};
pub use substitutes::{CallCounts, CountingStore, FailingStore};
