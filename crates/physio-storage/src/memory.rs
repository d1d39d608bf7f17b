//! In-memory store.
//!
//! Data lives in a `BTreeMap` behind a `RwLock` and is lost when the process
//! exits. Used when `PHYSIO_STORAGE=memory` and throughout the test suites.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{KeyValueStore, StorageError};

/// An in-memory store backed by a sorted map.
///
/// Clones share the same underlying map.
///
/// # Examples
///
/// ```
/// # use physio_storage::{KeyValueStore, MemoryStore};
/// # #[tokio::main]
/// # async fn main() -> Result<(), physio_storage::StorageError> {
/// let store = MemoryStore::new();
/// store.set_item("popupLastClosedTimestamp", "6000").await?;
/// let val = store.get_item("popupLastClosedTimestamp").await?;
/// assert_eq!(val.as_deref(), Some("6000"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items
            .write()
            .await
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get_item("popupFormSubmittedTimestamp").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_replaces_previous_value() {
        let store = MemoryStore::new();
        store.set_item("k", "1000").await.unwrap();
        store.set_item("k", "2000").await.unwrap();
        assert_eq!(store.get_item("k").await.unwrap().as_deref(), Some("2000"));
    }

    #[tokio::test]
    async fn remove_missing_key_is_noop() {
        let store = MemoryStore::new();
        store.remove_item("nope").await.unwrap();
        assert_eq!(store.get_item("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn remove_leaves_other_keys() {
        let store = MemoryStore::new();
        store.set_item("popup/a/popupLastClosedTimestamp", "1").await.unwrap();
        store.set_item("popup/b/popupLastClosedTimestamp", "3").await.unwrap();

        store.remove_item("popup/a/popupLastClosedTimestamp").await.unwrap();
        assert_eq!(store.get_item("popup/a/popupLastClosedTimestamp").await.unwrap(), None);
        assert_eq!(
            store.get_item("popup/b/popupLastClosedTimestamp").await.unwrap().as_deref(),
            Some("3")
        );
    }

    #[tokio::test]
    async fn clones_share_items() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.set_item("k", "v").await.unwrap();
        assert_eq!(other.get_item("k").await.unwrap().as_deref(), Some("v"));
    }
}
