//! # Riot NSE
//!
//! Store plumbing for the notification service extension: a lightweight
//! process that wakes up for one push notification, runs a short
//! incremental sync to fetch the event, and exits.
//!
//! ## Overview
//!
//! The extension must resume from the sync cursor the main application
//! persisted, without writing anything back to the store the main
//! application owns. This crate provides:
//!
//! - **[`StoreContainer`]**: process-level holder that opens the durable store
//!   once and hands it to every overlay
//! - **[`OverlayStore`]**: per-notification [`SessionStore`] that reads
//!   through to the durable store and keeps cursor advances in memory
//! - **[`CursorOverride`]**: the in-memory cursor shared by all overlays of a
//!   container
//! - **[`NseConfig`]**: where stores live and how mismatched accounts are
//!   handled
//!
//! ## Usage
//!
//! ```rust,no_run
//! use riot_nse::{NseConfig, StoreContainer, SessionStore};
//! use riot_nse::core::{Credentials, UserId};
//! use riot_nse::store::FileStore;
//!
//! async fn handle_notification(container: &StoreContainer<FileStore>) {
//!     let credentials = Credentials::new(
//!         UserId::parse("@alice:example.org").unwrap(),
//!         "https://matrix.example.org",
//!     );
//!
//!     // Opens the store read-only and loads its metadata on the first
//!     // notification only
//!     let store = container.open_overlay(credentials).await.unwrap();
//!
//!     let since = store.event_stream_token();
//!     // ... sync from `since`, then record the new cursor in memory ...
//! }
//!
//! let container = StoreContainer::<FileStore>::new(NseConfig::default());
//! ```
//!
//! ## Known Limitations
//!
//! - Closing any overlay closes the shared store for all of them.
//! - Nothing serializes concurrent invocations against the same account;
//!   the host is expected not to run them.
//!
//! ## Re-exports
//!
//! - `riot_nse::core` - Identifiers, credentials, events
//! - `riot_nse::store` - The store trait and its implementations

pub mod config;
pub mod container;
pub mod cursor;
pub mod error;
pub mod overlay;

// Re-export component crates
pub use riot_nse_core as core;
pub use riot_nse_store as store;

pub use config::{CredentialPolicy, NseConfig};
pub use container::{SharedStore, StoreContainer};
pub use cursor::CursorOverride;
pub use error::{OverlayError, Result};
pub use overlay::OverlayStore;

pub use riot_nse_store::{SessionStore, StoreError};
