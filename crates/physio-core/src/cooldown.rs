//! Persisted popup cooldown timestamps.
//!
//! Two advisory timestamps live in the visitor's key-value store as
//! epoch-millisecond strings. Writes are last-write-wins. If the store is
//! unavailable every read behaves as "no record" and every write is dropped
//! with a warning; the popup then falls back to its default timing.

use std::sync::Arc;

use physio_storage::KeyValueStore;
use serde::Serialize;
use tracing::warn;

/// Set when the visitor completes the popup form.
pub const FORM_SUBMITTED_KEY: &str = "popupFormSubmittedTimestamp";

/// Set when the visitor dismisses the popup without submitting.
pub const LAST_CLOSED_KEY: &str = "popupLastClosedTimestamp";

/// The two persisted suppression timestamps, in epoch milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CooldownRecord {
    pub form_submitted_at: Option<i64>,
    pub last_closed_at: Option<i64>,
}

/// Reads and writes [`CooldownRecord`] entries for one visitor.
#[derive(Clone)]
pub struct CooldownStore {
    store: Arc<dyn KeyValueStore>,
    prefix: String,
}

impl std::fmt::Debug for CooldownStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CooldownStore")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl CooldownStore {
    /// Keys are stored exactly as [`FORM_SUBMITTED_KEY`] and
    /// [`LAST_CLOSED_KEY`], as a single browser would.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            prefix: String::new(),
        }
    }

    /// Keys are stored under `popup/<visitor>/`, so one store can serve many
    /// visitors.
    #[must_use]
    pub fn for_visitor(store: Arc<dyn KeyValueStore>, visitor: &str) -> Self {
        Self {
            store,
            prefix: format!("popup/{visitor}/"),
        }
    }

    fn key(&self, name: &str) -> String {
        format!("{}{name}", self.prefix)
    }

    /// Read both timestamps.
    pub async fn load(&self) -> CooldownRecord {
        CooldownRecord {
            form_submitted_at: self.form_submitted_at().await,
            last_closed_at: self.last_closed_at().await,
        }
    }

    pub async fn form_submitted_at(&self) -> Option<i64> {
        self.read_stamp(FORM_SUBMITTED_KEY).await
    }

    pub async fn last_closed_at(&self) -> Option<i64> {
        self.read_stamp(LAST_CLOSED_KEY).await
    }

    pub async fn record_submitted(&self, at: i64) {
        self.write_stamp(FORM_SUBMITTED_KEY, at).await;
    }

    pub async fn record_closed(&self, at: i64) {
        self.write_stamp(LAST_CLOSED_KEY, at).await;
    }

    pub async fn clear_submitted(&self) {
        self.remove(FORM_SUBMITTED_KEY).await;
    }

    pub async fn clear_closed(&self) {
        self.remove(LAST_CLOSED_KEY).await;
    }

    async fn read_stamp(&self, name: &str) -> Option<i64> {
        let key = self.key(name);
        let raw = match self.store.get_item(&key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key = %key, error = %e, "cooldown store unreadable, assuming no record");
                return None;
            }
        };

        if let Ok(stamp) = raw.trim().parse::<i64>() {
            Some(stamp)
        } else {
            warn!(key = %key, value = %raw, "discarding malformed cooldown timestamp");
            self.remove(name).await;
            None
        }
    }

    async fn write_stamp(&self, name: &str, at: i64) {
        let key = self.key(name);
        if let Err(e) = self.store.set_item(&key, &at.to_string()).await {
            warn!(key = %key, error = %e, "failed to persist cooldown timestamp");
        }
    }

    async fn remove(&self, name: &str) {
        let key = self.key(name);
        if let Err(e) = self.store.remove_item(&key).await {
            warn!(key = %key, error = %e, "failed to clear cooldown timestamp");
        }
    }
}
