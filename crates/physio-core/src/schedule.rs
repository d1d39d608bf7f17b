//! Popup timing policy.
//!
//! Pure functions from a [`CooldownRecord`] and the current time to a
//! display decision. The [`scheduler`](crate::scheduler) applies the decision;
//! nothing here touches storage or timers.

use serde::Serialize;

use crate::cooldown::CooldownRecord;

/// Delay before the first reveal when the visitor has never closed the popup.
pub const INITIAL_DELAY_MS: i64 = 5_000;

/// Minimum gap between a close and the next reveal.
pub const RESHOW_DELAY_MS: i64 = 60_000;

/// How long a completed form suppresses the popup (24 hours).
pub const SUBMITTED_COOLDOWN_MS: i64 = 86_400_000;

/// Reveal delay once a previous close has fully expired.
pub const EXPIRED_CLOSE_DELAY_MS: i64 = 300;

/// Why the popup will not be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressReason {
    /// The visitor completed the form within the cooldown window.
    Submitted,
    /// The site-wide disable switch (maintenance mode) is on.
    Disabled,
}

/// Popup timing configuration. Injected once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupConfig {
    /// Site-wide disable switch. Overrides every timer.
    pub disabled: bool,
    pub initial_delay_ms: i64,
    pub reshow_delay_ms: i64,
    pub submitted_cooldown_ms: i64,
    pub expired_close_delay_ms: i64,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            initial_delay_ms: INITIAL_DELAY_MS,
            reshow_delay_ms: RESHOW_DELAY_MS,
            submitted_cooldown_ms: SUBMITTED_COOLDOWN_MS,
            expired_close_delay_ms: EXPIRED_CLOSE_DELAY_MS,
        }
    }
}

/// The display decision for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Do not schedule a reveal.
    Suppress(SuppressReason),
    /// Reveal after `delay_ms`, i.e. at `reveal_at`.
    Wait { delay_ms: i64, reveal_at: i64 },
}

/// A decision plus the expired records that should be removed from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub decision: Decision,
    pub clear_submitted: bool,
    pub clear_closed: bool,
}

impl PopupConfig {
    /// Whether a submission at `submitted_at` still suppresses the popup.
    #[must_use]
    pub fn submission_active(&self, submitted_at: Option<i64>, now: i64) -> bool {
        submitted_at.is_some_and(|at| now.saturating_sub(at) < self.submitted_cooldown_ms)
    }

    /// Delay until the next reveal given the last close, and whether that
    /// close record has expired.
    ///
    /// A close younger than the reshow delay yields exactly
    /// `reshow_delay - (now - last_closed_at)`.
    #[must_use]
    pub fn reveal_delay(&self, last_closed_at: Option<i64>, now: i64) -> (i64, bool) {
        match last_closed_at {
            None => (self.initial_delay_ms, false),
            Some(at) => {
                let elapsed = now.saturating_sub(at);
                if elapsed < self.reshow_delay_ms {
                    (self.reshow_delay_ms.saturating_sub(elapsed), false)
                } else {
                    (self.expired_close_delay_ms, true)
                }
            }
        }
    }

    /// Evaluate `record` at `now`.
    #[must_use]
    pub fn plan(&self, record: &CooldownRecord, now: i64) -> Plan {
        if self.disabled {
            return Plan {
                decision: Decision::Suppress(SuppressReason::Disabled),
                clear_submitted: false,
                clear_closed: false,
            };
        }

        if self.submission_active(record.form_submitted_at, now) {
            return Plan {
                decision: Decision::Suppress(SuppressReason::Submitted),
                clear_submitted: false,
                clear_closed: false,
            };
        }

        let (delay_ms, clear_closed) = self.reveal_delay(record.last_closed_at, now);
        Plan {
            decision: Decision::Wait {
                delay_ms,
                reveal_at: now.saturating_add(delay_ms),
            },
            clear_submitted: record.form_submitted_at.is_some(),
            clear_closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(form_submitted_at: Option<i64>, last_closed_at: Option<i64>) -> CooldownRecord {
        CooldownRecord {
            form_submitted_at,
            last_closed_at,
        }
    }

    #[test]
    fn fresh_visitor_waits_initial_delay() {
        let plan = PopupConfig::default().plan(&CooldownRecord::default(), 0);
        assert_eq!(
            plan.decision,
            Decision::Wait {
                delay_ms: 5_000,
                reveal_at: 5_000
            }
        );
        assert!(!plan.clear_submitted);
        assert!(!plan.clear_closed);
    }

    #[test]
    fn recent_close_waits_out_the_remainder_exactly() {
        let config = PopupConfig::default();
        let now = 1_700_000_000_000;
        for elapsed in [0, 1, 999, 30_000, 59_999] {
            let plan = config.plan(&record(None, Some(now - elapsed)), now);
            assert_eq!(
                plan.decision,
                Decision::Wait {
                    delay_ms: 60_000 - elapsed,
                    reveal_at: now + 60_000 - elapsed,
                },
                "elapsed {elapsed}"
            );
            assert!(!plan.clear_closed);
        }
    }

    #[test]
    fn expired_close_reveals_almost_immediately_and_is_cleared() {
        let plan = PopupConfig::default().plan(&record(None, Some(0)), 60_000);
        assert_eq!(
            plan.decision,
            Decision::Wait {
                delay_ms: 300,
                reveal_at: 60_300
            }
        );
        assert!(plan.clear_closed);
    }

    #[test]
    fn active_submission_suppresses_regardless_of_close() {
        let config = PopupConfig::default();
        let now = 100_000_000;
        for closed in [None, Some(now), Some(now - 10), Some(0)] {
            let plan = config.plan(&record(Some(now - 86_399_999), closed), now);
            assert_eq!(plan.decision, Decision::Suppress(SuppressReason::Submitted));
        }
    }

    #[test]
    fn expired_submission_is_cleared_and_scheduling_proceeds() {
        let now = 100_000_000;
        let plan = PopupConfig::default().plan(&record(Some(now - 86_400_000), None), now);
        assert!(plan.clear_submitted);
        assert_eq!(
            plan.decision,
            Decision::Wait {
                delay_ms: 5_000,
                reveal_at: now + 5_000
            }
        );
    }

    #[test]
    fn disabled_switch_overrides_everything() {
        let config = PopupConfig {
            disabled: true,
            ..PopupConfig::default()
        };
        let plan = config.plan(&CooldownRecord::default(), 0);
        assert_eq!(plan.decision, Decision::Suppress(SuppressReason::Disabled));
    }
}
