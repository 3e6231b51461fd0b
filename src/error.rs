//! Error types for EmberKV.
//!
//! Every fallible store operation returns [`Result`], whose error side is
//! [`StoreError`]. Callers are expected to branch on [`StoreError::NotFound`]
//! as ordinary control flow; the other variants indicate a caller bug
//! (`InvalidArgument`) or a bug in the store itself (`Corrupted`).

use thiserror::Error;

/// Errors returned by the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key does not exist or its TTL has elapsed.
    #[error("key not found: {key}")]
    NotFound { key: String },

    /// Malformed input, e.g. a non-positive TTL.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The key table and the prefix index disagree.
    #[error("internal consistency failure: {0}")]
    Corrupted(String),

    /// The background reaper could not be started.
    #[error("failed to start expiry reaper: {0}")]
    Reaper(#[from] std::io::Error),
}

impl StoreError {
    pub(crate) fn not_found(key: &[u8]) -> Self {
        StoreError::NotFound {
            key: String::from_utf8_lossy(key).into_owned(),
        }
    }

    /// Returns true if this error means "absent or expired".
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
