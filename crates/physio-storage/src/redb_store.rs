//! Persistent store backed by redb.
//!
//! One table holds every item; namespacing lives in the keys. redb calls are
//! blocking, so each operation runs on the Tokio blocking pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};

use crate::{KeyValueStore, StorageError};

const ITEMS: TableDefinition<&str, &str> = TableDefinition::new("items");

/// A [`KeyValueStore`] persisted in a single redb file.
///
/// # Examples
///
/// ```no_run
/// # use physio_storage::RedbStore;
/// let store = RedbStore::open("./data/site.redb").unwrap();
/// ```
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
    path: PathBuf,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

fn txn_err(e: impl std::fmt::Display) -> StorageError {
    StorageError::Transaction {
        reason: e.to_string(),
    }
}

impl RedbStore {
    /// Open or create the database file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the file cannot be created or is not
    /// a redb database, and [`StorageError::Transaction`] if the items table
    /// cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let db = Database::create(path).map_err(|e| StorageError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        // A write transaction creates the table if it is missing.
        let txn = db.begin_write().map_err(txn_err)?;
        txn.open_table(ITEMS).map_err(txn_err)?;
        txn.commit().map_err(txn_err)?;

        Ok(Self {
            db: Arc::new(db),
            path: path.to_path_buf(),
        })
    }

    /// Filesystem path of the database.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T, StorageError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || op(&db))
            .await
            .map_err(|e| StorageError::Transaction {
                reason: format!("blocking task failed: {e}"),
            })?
    }
}

#[async_trait::async_trait]
impl KeyValueStore for RedbStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let key = key.to_owned();
        self.blocking(move |db| {
            let txn = db.begin_read().map_err(txn_err)?;
            let table = txn.open_table(ITEMS).map_err(txn_err)?;
            let value = table
                .get(key.as_str())
                .map_err(|e| StorageError::Read {
                    key: key.clone(),
                    reason: e.to_string(),
                })?
                .map(|v| v.value().to_owned());
            Ok(value)
        })
        .await
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let key = key.to_owned();
        let value = value.to_owned();
        self.blocking(move |db| {
            let txn = db.begin_write().map_err(txn_err)?;
            {
                let mut table = txn.open_table(ITEMS).map_err(txn_err)?;
                table
                    .insert(key.as_str(), value.as_str())
                    .map_err(|e| StorageError::Write {
                        key: key.clone(),
                        reason: e.to_string(),
                    })?;
            }
            txn.commit().map_err(txn_err)
        })
        .await
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let key = key.to_owned();
        self.blocking(move |db| {
            let txn = db.begin_write().map_err(txn_err)?;
            {
                let mut table = txn.open_table(ITEMS).map_err(txn_err)?;
                table
                    .remove(key.as_str())
                    .map_err(|e| StorageError::Remove {
                        key: key.clone(),
                        reason: e.to_string(),
                    })?;
            }
            txn.commit().map_err(txn_err)
        })
        .await
    }
}
