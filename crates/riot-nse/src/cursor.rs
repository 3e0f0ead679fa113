//! Process-local event-stream cursor override.

use std::sync::{PoisonError, RwLock};

use riot_nse_core::EventStreamToken;

/// A cursor that shadows the durable store's cursor without persisting.
///
/// One cell is owned by each [`StoreContainer`](crate::StoreContainer) and
/// shared by every overlay built from it, so a cursor advanced by one
/// notification is the starting point of the next one in the same process.
#[derive(Debug, Default)]
pub struct CursorOverride {
    token: RwLock<Option<EventStreamToken>>,
}

impl CursorOverride {
    pub fn new() -> Self {
        Self::default()
    }

    /// The overriding cursor, if one has been set.
    pub fn get(&self) -> Option<EventStreamToken> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Set the override. `None` clears it so reads fall through again.
    pub fn set(&self, token: Option<EventStreamToken>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn is_set(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_clear() {
        let cursor = CursorOverride::new();
        assert!(!cursor.is_set());

        cursor.set(Some(EventStreamToken::new("s1").unwrap()));
        assert_eq!(cursor.get().unwrap().as_str(), "s1");

        cursor.set(None);
        assert!(cursor.get().is_none());
    }
}
