//! Strong type definitions for session identifiers.
//!
//! All identifiers are newtypes so a room id can never be passed where a user
//! id is expected. Sigil-prefixed Matrix identifiers are validated on parse
//! and on deserialization.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::IdError;

/// Validate a sigil-prefixed `<sigil><localpart>:<server>` identifier.
fn validate_sigil_id(id: &str, sigil: char) -> Result<(), IdError> {
    if id.is_empty() {
        return Err(IdError::Empty);
    }
    if id.chars().any(char::is_whitespace) {
        return Err(IdError::Whitespace(id.to_string()));
    }
    let Some(rest) = id.strip_prefix(sigil) else {
        return Err(IdError::MissingSigil {
            id: id.to_string(),
            sigil,
        });
    };
    let Some((localpart, server)) = rest.split_once(':') else {
        return Err(IdError::MissingServerName(id.to_string()));
    };
    if localpart.is_empty() {
        return Err(IdError::EmptyLocalpart(id.to_string()));
    }
    if server.is_empty() {
        return Err(IdError::MissingServerName(id.to_string()));
    }
    Ok(())
}

macro_rules! matrix_id {
    ($(#[$meta:meta])* $name:ident, $sigil:expr) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// The sigil every identifier of this kind starts with.
            pub const SIGIL: char = $sigil;

            /// Parse and validate an identifier.
            pub fn parse(id: impl Into<String>) -> Result<Self, IdError> {
                let id = id.into();
                validate_sigil_id(&id, Self::SIGIL)?;
                Ok(Self(id))
            }

            /// The full identifier, sigil included.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// The part between the sigil and the first `:`.
            pub fn localpart(&self) -> &str {
                let rest = &self.0[Self::SIGIL.len_utf8()..];
                rest.split_once(':').map(|(l, _)| l).unwrap_or(rest)
            }

            /// The server name after the first `:`.
            pub fn server_name(&self) -> &str {
                self.0.split_once(':').map(|(_, s)| s).unwrap_or_default()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::parse(s)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = IdError;

            fn try_from(s: &str) -> Result<Self, Self::Error> {
                Self::parse(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

matrix_id!(
    /// A Matrix user identifier, `@localpart:server`.
    UserId,
    '@'
);

matrix_id!(
    /// A Matrix room identifier, `!opaque:server`.
    RoomId,
    '!'
);

/// An opaque device (session) identifier issued by the homeserver at login.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Create a device id. Only emptiness is rejected.
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdError::Empty);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId({})", self.0)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

/// The incremental sync cursor (`next_batch` / `since`).
///
/// Opaque to every client component: it is only stored and handed back to
/// the server.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventStreamToken(String);

impl EventStreamToken {
    /// Wrap a token received from the server. Empty tokens are rejected.
    pub fn new(token: impl Into<String>) -> Result<Self, IdError> {
        let token = token.into();
        if token.is_empty() {
            return Err(IdError::Empty);
        }
        Ok(Self(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EventStreamToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventStreamToken({})", self.0)
    }
}

impl fmt::Display for EventStreamToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EventStreamToken {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<EventStreamToken> for String {
    fn from(token: EventStreamToken) -> Self {
        token.0
    }
}
