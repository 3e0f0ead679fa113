//! Users as resolved by a session store.

use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// Whether a [`User`] is the session's own account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserKind {
    /// The logged-in account itself.
    Own,
    /// Any other user.
    Other,
}

/// A user profile. Identifier-only users carry no display name or avatar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    pub kind: UserKind,
}

impl User {
    /// The session's own user, built from the identifier alone.
    pub fn own(user_id: UserId) -> Self {
        Self {
            user_id,
            display_name: None,
            avatar_url: None,
            kind: UserKind::Own,
        }
    }

    /// A generic user built from the identifier alone.
    pub fn minimal(user_id: UserId) -> Self {
        Self {
            user_id,
            display_name: None,
            avatar_url: None,
            kind: UserKind::Other,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn is_own(&self) -> bool {
        self.kind == UserKind::Own
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_own_and_minimal_differ() {
        let id = UserId::parse("@alice:example.org").unwrap();
        let own = User::own(id.clone());
        let other = User::minimal(id);
        assert!(own.is_own());
        assert!(!other.is_own());
        assert_ne!(own, other);
    }
}
