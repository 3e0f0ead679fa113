//! Account credentials.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{DeviceId, UserId};

/// Identity of one logged-in account on one device.
///
/// Handed to the extension by its host at startup and never mutated
/// afterwards. The access token is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// The account's user id.
    pub user_id: UserId,
    /// The device (session) this login belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<DeviceId>,
    /// Homeserver base URL.
    pub homeserver: String,
    /// Identity server base URL, if one is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl Credentials {
    /// Credentials with only the fields that scope a store.
    pub fn new(user_id: UserId, homeserver: impl Into<String>) -> Self {
        Self {
            user_id,
            device_id: None,
            homeserver: homeserver.into(),
            identity_server: None,
            access_token: None,
        }
    }

    pub fn with_device_id(mut self, device_id: DeviceId) -> Self {
        self.device_id = Some(device_id);
        self
    }

    pub fn with_identity_server(mut self, url: impl Into<String>) -> Self {
        self.identity_server = Some(url.into());
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Whether both credentials name the same account on the same homeserver.
    ///
    /// Device and token are ignored: a re-login on the same account keeps
    /// using the same durable store.
    pub fn same_account(&self, other: &Credentials) -> bool {
        self.user_id == other.user_id && self.is_on_homeserver(&other.homeserver)
    }

    /// Whether `homeserver` names this account's homeserver, ignoring a
    /// trailing slash.
    pub fn is_on_homeserver(&self, homeserver: &str) -> bool {
        self.homeserver.trim_end_matches('/') == homeserver.trim_end_matches('/')
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("device_id", &self.device_id)
            .field("homeserver", &self.homeserver)
            .field("identity_server", &self.identity_server)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}
