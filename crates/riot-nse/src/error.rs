//! Error types for the overlay layer.

use riot_nse_core::UserId;
use riot_nse_store::StoreError;
use thiserror::Error;

/// Errors that can occur while setting up an overlay.
///
/// Once an [`OverlayStore`](crate::OverlayStore) exists it never raises
/// errors of its own; its operations return the underlying [`StoreError`]
/// unchanged.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// Storage error, including failure to open or load the shared store.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// The shared store was created for a different account.
    #[error("shared store belongs to {owner}, refusing overlay for {requested}")]
    CredentialMismatch { owner: UserId, requested: UserId },

    /// Configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for overlay setup.
pub type Result<T> = std::result::Result<T, OverlayError>;
