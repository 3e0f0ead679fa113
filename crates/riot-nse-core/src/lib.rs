//! # Riot NSE Core
//!
//! Pure data model shared by the notification extension and the main
//! application store: identifiers, account credentials, room state events,
//! room summaries, account data and users.
//!
//! This crate contains no I/O and no storage. It only defines the values that
//! flow through a [`SessionStore`](../riot_nse_store/trait.SessionStore.html).
//!
//! ## Key Types
//!
//! - [`UserId`] / [`RoomId`] - Validated Matrix identifiers
//! - [`EventStreamToken`] - Opaque incremental sync cursor
//! - [`Credentials`] - Identity of one logged-in account
//! - [`StateEvent`] - A room state event as received from the server
//! - [`User`] - A user as resolved by a store, own account or other

pub mod account_data;
pub mod credentials;
pub mod error;
pub mod event;
pub mod room;
pub mod types;
pub mod user;

pub use account_data::{AccountData, RoomAccountData, PUSH_RULES_EVENT_TYPE, TAG_EVENT_TYPE};
pub use credentials::Credentials;
pub use error::IdError;
pub use event::StateEvent;
pub use room::{Membership, RoomSummary};
pub use types::{DeviceId, EventStreamToken, RoomId, UserId};
pub use user::{User, UserKind};
