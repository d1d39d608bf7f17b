//! Storage error types.

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The store could not be opened at the given path.
    #[error("failed to open store at '{path}': {reason}")]
    Open { path: String, reason: String },

    /// Reading a key failed.
    #[error("failed to read key '{key}': {reason}")]
    Read { key: String, reason: String },

    /// Writing a key failed.
    #[error("failed to write key '{key}': {reason}")]
    Write { key: String, reason: String },

    /// Removing a key failed.
    #[error("failed to remove key '{key}': {reason}")]
    Remove { key: String, reason: String },

    /// The store refuses all access (e.g. disabled by the operator).
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },

    /// A transaction could not be started or committed.
    #[error("transaction failed: {reason}")]
    Transaction { reason: String },
}
