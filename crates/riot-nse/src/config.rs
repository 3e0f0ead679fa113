//! Configuration for the notification extension store.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use riot_nse_core::Credentials;

use crate::error::{OverlayError, Result};

/// File name of each account's session database.
pub const STORE_FILE_NAME: &str = "session.sqlite3";

/// What to do when an overlay is requested for a different account than the
/// one the shared store was opened for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialPolicy {
    /// Fail with [`OverlayError::CredentialMismatch`].
    #[default]
    Reject,
    /// Keep using the existing store and log a warning. Only sound when the
    /// process serves a single account.
    Reuse,
}

/// Configuration for the extension's store container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NseConfig {
    /// Directory holding one sub-directory per account, shared with the
    /// main application.
    pub store_root: PathBuf,
    /// Mismatched-credentials handling.
    pub credential_policy: CredentialPolicy,
}

impl Default for NseConfig {
    fn default() -> Self {
        Self {
            store_root: PathBuf::from("SessionStore"),
            credential_policy: CredentialPolicy::default(),
        }
    }
}

impl NseConfig {
    /// Parse a JSON configuration. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| OverlayError::Config(e.to_string()))
    }

    /// Read and parse a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| OverlayError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Path of the session database for an account.
    ///
    /// The user id is made filesystem-safe: `@alice:example.org` becomes
    /// `alice_example.org`.
    pub fn store_path(&self, credentials: &Credentials) -> PathBuf {
        self.store_root
            .join(account_dir_name(credentials))
            .join(STORE_FILE_NAME)
    }
}

fn account_dir_name(credentials: &Credentials) -> String {
    credentials
        .user_id
        .as_str()
        .trim_start_matches('@')
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' | '=' => c,
            _ => '_',
        })
        .collect()
}
