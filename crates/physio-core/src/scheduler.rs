//! Popup display scheduler.
//!
//! A small state machine driven by one-shot Tokio timers:
//!
//! ```text
//! Unmounted --mount--> Suppressed(reason) | Waiting(reveal_at)
//! Waiting   --timer--> Visible | Suppressed(submitted)
//! Visible   --close--> Waiting(now + reshow delay)
//! Visible   --submitted--> VisibleSuccess --close--> Suppressed(submitted)
//! any       --unmount--> Unmounted
//! ```
//!
//! At most one reveal timer is pending per scheduler. Mounting an already
//! mounted scheduler returns the current state without starting a second
//! timer, and unmounting (or dropping) aborts the pending one. Concurrent
//! mounts are serialized: the later caller waits for the first to settle.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::clock::{delay_duration, Clock};
use crate::cooldown::{CooldownRecord, CooldownStore};
use crate::schedule::{Decision, PopupConfig, SuppressReason};

/// Visibility state of the popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PopupState {
    /// Not mounted; no timer, no persisted reads.
    Unmounted,
    /// Will not be shown for the rest of this mount.
    Suppressed { reason: SuppressReason },
    /// A reveal timer is pending.
    Waiting { reveal_at: i64 },
    /// The form is showing.
    Visible,
    /// The thank-you view is showing after a successful submission.
    VisibleSuccess,
}

impl PopupState {
    /// Whether anything is on screen.
    #[must_use]
    pub fn is_shown(self) -> bool {
        matches!(self, Self::Visible | Self::VisibleSuccess)
    }
}

impl fmt::Display for PopupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unmounted => f.write_str("unmounted"),
            Self::Suppressed {
                reason: SuppressReason::Submitted,
            } => f.write_str("suppressed (submitted)"),
            Self::Suppressed {
                reason: SuppressReason::Disabled,
            } => f.write_str("suppressed (disabled)"),
            Self::Waiting { reveal_at } => write!(f, "waiting until {reveal_at}"),
            Self::Visible => f.write_str("visible"),
            Self::VisibleSuccess => f.write_str("visible (success)"),
        }
    }
}

/// State reachable from the reveal timer task.
struct Shared {
    config: PopupConfig,
    cooldowns: CooldownStore,
    clock: Arc<dyn Clock>,
    state: watch::Sender<PopupState>,
    reveals: AtomicU64,
}

impl Shared {
    /// Timer expiry. Re-checks the submission cooldown, since another page
    /// may have completed the form while the timer was pending.
    async fn fire(&self, reveal_at: i64) {
        let now = self.clock.now_millis();
        let submitted_at = self.cooldowns.form_submitted_at().await;
        let next = if self.config.submission_active(submitted_at, now) {
            PopupState::Suppressed {
                reason: SuppressReason::Submitted,
            }
        } else {
            PopupState::Visible
        };

        let applied = self.state.send_if_modified(|state| {
            if *state != (PopupState::Waiting { reveal_at }) {
                return false;
            }
            if next == PopupState::Visible {
                self.reveals.fetch_add(1, Ordering::AcqRel);
            }
            *state = next;
            true
        });

        if applied {
            info!(now, state = %next, "popup reveal timer fired");
        } else {
            debug!(reveal_at, "stale popup reveal timer ignored");
        }
    }
}

/// Decides when the lead-capture popup is shown.
pub struct PopupScheduler {
    shared: Arc<Shared>,
    mounted: AtomicBool,
    /// Held for the whole of `mount`, across the cooldown read.
    mounting: tokio::sync::Mutex<()>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for PopupScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopupScheduler")
            .field("state", &self.state())
            .field("cooldowns", &self.shared.cooldowns)
            .finish_non_exhaustive()
    }
}

impl PopupScheduler {
    #[must_use]
    pub fn new(config: PopupConfig, cooldowns: CooldownStore, clock: Arc<dyn Clock>) -> Self {
        let (state, _) = watch::channel(PopupState::Unmounted);
        Self {
            shared: Arc::new(Shared {
                config,
                cooldowns,
                clock,
                state,
                reveals: AtomicU64::new(0),
            }),
            mounted: AtomicBool::new(false),
            mounting: tokio::sync::Mutex::new(()),
            timer: Mutex::new(None),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> PopupState {
        *self.shared.state.borrow()
    }

    /// Watch state transitions, including those made by the reveal timer.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PopupState> {
        self.shared.state.subscribe()
    }

    /// Number of times the form has been revealed since construction.
    #[must_use]
    pub fn reveals(&self) -> u64 {
        self.shared.reveals.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn config(&self) -> &PopupConfig {
        &self.shared.config
    }

    /// Read the persisted cooldowns once and enter the initial state.
    ///
    /// Idempotent: a second mount returns the current state and leaves the
    /// pending timer alone. A mount racing one that is still reading storage
    /// waits for it and returns the state it settled on.
    pub async fn mount(&self) -> PopupState {
        let _mounting = self.mounting.lock().await;
        if self.mounted.swap(true, Ordering::AcqRel) {
            return self.state();
        }

        let shared = &self.shared;
        let now = shared.clock.now_millis();
        let record = if shared.config.disabled {
            CooldownRecord::default()
        } else {
            shared.cooldowns.load().await
        };
        let plan = shared.config.plan(&record, now);

        if plan.clear_submitted {
            shared.cooldowns.clear_submitted().await;
        }
        if plan.clear_closed {
            shared.cooldowns.clear_closed().await;
        }

        if !self.mounted.load(Ordering::Acquire) {
            // Unmounted while reading storage.
            return PopupState::Unmounted;
        }

        let state = self.apply(plan.decision);
        info!(now, record = ?record, state = %state, "popup scheduler mounted");
        state
    }

    /// The visitor dismissed the popup.
    ///
    /// Closing the form records the close time and schedules the next reveal
    /// after the reshow delay. Closing the thank-you view suppresses the
    /// popup for the rest of the mount. In any other state this is a no-op.
    pub async fn close(&self) -> PopupState {
        let shared = &self.shared;
        match self.state() {
            PopupState::Visible => {
                let now = shared.clock.now_millis();
                shared.cooldowns.record_closed(now).await;
                if !self.mounted.load(Ordering::Acquire) {
                    return self.state();
                }
                let (delay_ms, _) = shared.config.reveal_delay(Some(now), now);
                let state = self.apply(Decision::Wait {
                    delay_ms,
                    reveal_at: now.saturating_add(delay_ms),
                });
                info!(closed_at = now, state = %state, "popup closed");
                state
            }
            PopupState::VisibleSuccess => {
                let state = PopupState::Suppressed {
                    reason: SuppressReason::Submitted,
                };
                shared.state.send_replace(state);
                info!("popup closed after submission");
                state
            }
            other => other,
        }
    }

    /// The popup form was submitted successfully.
    ///
    /// Persists the submission time, which suppresses the popup on every
    /// mount for the cooldown window, and switches to the thank-you view.
    pub async fn record_submission(&self) -> PopupState {
        let shared = &self.shared;
        if shared.config.disabled {
            return self.state();
        }

        let now = shared.clock.now_millis();
        shared.cooldowns.record_submitted(now).await;

        let state = match self.state() {
            PopupState::Unmounted => PopupState::Unmounted,
            PopupState::Visible | PopupState::VisibleSuccess => {
                shared.state.send_replace(PopupState::VisibleSuccess);
                PopupState::VisibleSuccess
            }
            PopupState::Suppressed { .. } | PopupState::Waiting { .. } => {
                self.apply(Decision::Suppress(SuppressReason::Submitted))
            }
        };
        info!(submitted_at = now, state = %state, "popup submission recorded");
        state
    }

    /// Cancel any pending reveal and return to [`PopupState::Unmounted`].
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::Release);
        self.cancel_timer();
        self.shared.state.send_replace(PopupState::Unmounted);
        debug!("popup scheduler unmounted");
    }

    fn apply(&self, decision: Decision) -> PopupState {
        match decision {
            Decision::Suppress(reason) => {
                self.cancel_timer();
                let state = PopupState::Suppressed { reason };
                self.shared.state.send_replace(state);
                state
            }
            Decision::Wait {
                delay_ms,
                reveal_at,
            } => {
                // State first: the timer only fires into the exact Waiting
                // state it was armed for.
                let state = PopupState::Waiting { reveal_at };
                self.shared.state.send_replace(state);
                self.arm(delay_ms, reveal_at);
                state
            }
        }
    }

    fn arm(&self, delay_ms: i64, reveal_at: i64) {
        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay_duration(delay_ms)).await;
            shared.fire(reveal_at).await;
        });
        let previous = self
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
        debug!(delay_ms, reveal_at, "popup reveal timer armed");
    }

    fn cancel_timer(&self) {
        let pending = self
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = pending {
            handle.abort();
        }
    }
}

impl Drop for PopupScheduler {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
