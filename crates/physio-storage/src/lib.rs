//! Durable key-value storage for the clinic site.
//!
//! This crate defines the [`KeyValueStore`] trait: a string-keyed,
//! string-valued store with the same shape as a browser's local storage.
//! It knows nothing about popups or forms. The scheduler in `physio-core`
//! keeps its advisory cooldown timestamps here.
//!
//! Two implementations are provided:
//!
//! - [`RedbStore`] — persistent, backed by redb (feature `redb-backend`)
//! - [`MemoryStore`] — in-memory, for development and tests

mod error;
mod memory;
#[cfg(feature = "redb-backend")]
mod redb_store;

pub use error::StorageError;
pub use memory::MemoryStore;
#[cfg(feature = "redb-backend")]
pub use redb_store::RedbStore;

/// A pluggable string key-value store.
///
/// Keys use `/` as a namespace separator (e.g.
/// `popup/<visitor>/popupLastClosedTimestamp`). Writes are last-write-wins;
/// there are no transactions spanning several keys.
///
/// Implementations must be safe to share across async tasks (`Send + Sync`).
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the underlying store fails.
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] if the underlying store fails.
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Remove`] if the underlying store fails.
    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}
