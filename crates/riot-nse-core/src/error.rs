//! Error types for the core data model.

use thiserror::Error;

/// Errors raised while parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("identifier is empty")]
    Empty,

    #[error("identifier {id:?} must start with '{sigil}'")]
    MissingSigil { id: String, sigil: char },

    #[error("identifier {0:?} has no server name")]
    MissingServerName(String),

    #[error("identifier {0:?} has an empty localpart")]
    EmptyLocalpart(String),

    #[error("identifier {0:?} contains whitespace")]
    Whitespace(String),
}
