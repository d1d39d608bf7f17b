//! Shared application state for the clinic server.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! Axum handlers via `Arc`. Besides the injected collaborators it keeps the
//! registry of live popup sessions, one per visitor id. The registry is what
//! keeps each visitor's scheduler a singleton: mounting twice returns the
//! same session and never starts a second reveal timer.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};

use physio_core::clock::Clock;
use physio_core::consultation::Mailer;
use physio_core::cooldown::CooldownStore;
use physio_core::gateway::{AppointmentStore, NotificationGateway};
use physio_core::popup::PopupSession;
use physio_core::schedule::PopupConfig;
use physio_core::scheduler::PopupScheduler;
use physio_core::submission::SubmissionOrchestrator;
use physio_storage::KeyValueStore;

use crate::config::ServerConfig;

/// Longest accepted visitor id.
pub const MAX_VISITOR_ID_LEN: usize = 64;

/// A live popup session and when it was last touched.
pub struct SessionEntry {
    pub session: Arc<PopupSession>,
    pub last_seen: Instant,
}

/// Shared application state passed to all HTTP handlers.
pub struct AppState {
    pub config: ServerConfig,
    /// Cooldown timestamps for every visitor.
    pub store: Arc<dyn KeyValueStore>,
    pub appointments: Arc<dyn AppointmentStore>,
    pub notifications: Arc<dyn NotificationGateway>,
    pub mailer: Arc<dyn Mailer>,
    pub clock: Arc<dyn Clock>,
    /// Live popup sessions keyed by visitor id.
    pub sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    #[must_use]
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn KeyValueStore>,
        appointments: Arc<dyn AppointmentStore>,
        notifications: Arc<dyn NotificationGateway>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            store,
            appointments,
            notifications,
            mailer,
            clock,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Popup timing for new sessions. Maintenance mode disables the popup.
    #[must_use]
    pub fn popup_config(&self) -> PopupConfig {
        PopupConfig {
            disabled: self.config.maintenance,
            ..PopupConfig::default()
        }
    }

    /// The session for `visitor`, created if absent.
    pub async fn open_session(&self, visitor: &str) -> Arc<PopupSession> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.entry(visitor.to_owned()).or_insert_with(|| {
            debug!(visitor, "new popup session");
            SessionEntry {
                session: Arc::new(self.new_session(visitor)),
                last_seen: Instant::now(),
            }
        });
        entry.last_seen = Instant::now();
        Arc::clone(&entry.session)
    }

    /// The existing session for `visitor`, if any.
    pub async fn session(&self, visitor: &str) -> Option<Arc<PopupSession>> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(visitor)?;
        entry.last_seen = Instant::now();
        Some(Arc::clone(&entry.session))
    }

    /// Remove and unmount the session for `visitor`. Returns whether one
    /// existed.
    pub async fn close_session(&self, visitor: &str) -> bool {
        let removed = self.sessions.write().await.remove(visitor);
        match removed {
            Some(entry) => {
                entry.session.unmount();
                true
            }
            None => false,
        }
    }

    /// Unmount and drop every session idle for at least `max_idle`.
    /// Sessions with a submission in flight are kept.
    pub async fn sweep_idle(&self, max_idle: Duration) -> usize {
        let mut expired = Vec::new();
        {
            let mut sessions = self.sessions.write().await;
            sessions.retain(|visitor, entry| {
                let idle = entry.last_seen.elapsed() >= max_idle;
                if idle && !entry.session.view().submitting {
                    expired.push((visitor.clone(), Arc::clone(&entry.session)));
                    false
                } else {
                    true
                }
            });
        }

        for (visitor, session) in &expired {
            session.unmount();
            debug!(visitor = %visitor, "idle popup session dropped");
        }
        if !expired.is_empty() {
            info!(dropped = expired.len(), "idle popup sessions swept");
        }
        expired.len()
    }

    fn new_session(&self, visitor: &str) -> PopupSession {
        let scheduler = PopupScheduler::new(
            self.popup_config(),
            CooldownStore::for_visitor(Arc::clone(&self.store), visitor),
            Arc::clone(&self.clock),
        );
        let orchestrator = SubmissionOrchestrator::new(
            Arc::clone(&self.appointments),
            Arc::clone(&self.notifications),
        );
        PopupSession::new(scheduler, orchestrator)
    }
}

/// Whether `visitor` is usable as a session key and storage namespace.
#[must_use]
pub fn is_valid_visitor_id(visitor: &str) -> bool {
    !visitor.is_empty()
        && visitor.len() <= MAX_VISITOR_ID_LEN
        && visitor
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
