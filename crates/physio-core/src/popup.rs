//! Popup session: ties the scheduler to the form it reveals.
//!
//! The scheduler decides *when* the popup is on screen; the session owns what
//! is on screen. It resets the draft each time the form is revealed, keeps
//! the draft when a submission fails so the visitor can retry, and holds the
//! thank-you view until the visitor closes it.

use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, info};

use crate::draft::FormDraft;
use crate::error::SessionError;
use crate::scheduler::{PopupScheduler, PopupState};
use crate::submission::{SubmissionOrchestrator, SubmissionOutcome};

/// What the visitor sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PopupPhase {
    Hidden,
    Form,
    Success,
}

impl From<PopupState> for PopupPhase {
    fn from(state: PopupState) -> Self {
        match state {
            PopupState::Visible => Self::Form,
            PopupState::VisibleSuccess => Self::Success,
            PopupState::Unmounted | PopupState::Suppressed { .. } | PopupState::Waiting { .. } => {
                Self::Hidden
            }
        }
    }
}

/// Snapshot of a popup session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopupView {
    pub state: PopupState,
    pub phase: PopupPhase,
    /// Outcome of the latest submission since the form was revealed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission: Option<SubmissionOutcome>,
    /// The submit and close affordances are disabled while this is set.
    pub submitting: bool,
    pub draft: FormDraft,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reveal_at: Option<i64>,
}

#[derive(Debug, Default)]
struct FormState {
    draft: FormDraft,
    submission: Option<SubmissionOutcome>,
    /// Scheduler reveal count this form belongs to.
    seen_reveals: u64,
}

impl FormState {
    fn reset(&mut self) {
        self.draft = FormDraft::default();
        self.submission = None;
    }
}

/// One visitor's popup.
#[derive(Debug)]
pub struct PopupSession {
    scheduler: PopupScheduler,
    orchestrator: SubmissionOrchestrator,
    form: Mutex<FormState>,
}

impl PopupSession {
    #[must_use]
    pub fn new(scheduler: PopupScheduler, orchestrator: SubmissionOrchestrator) -> Self {
        Self {
            scheduler,
            orchestrator,
            form: Mutex::new(FormState::default()),
        }
    }

    #[must_use]
    pub fn scheduler(&self) -> &PopupScheduler {
        &self.scheduler
    }

    /// Mount the scheduler. Idempotent.
    pub async fn mount(&self) -> PopupView {
        self.scheduler.mount().await;
        self.view()
    }

    /// Current snapshot. A form revealed since the last call starts blank.
    #[must_use]
    pub fn view(&self) -> PopupView {
        let state = self.scheduler.state();
        let mut form = self.form.lock().unwrap_or_else(PoisonError::into_inner);
        self.sync(&mut form, state);

        let submitting = self.orchestrator.is_submitting();
        PopupView {
            state,
            phase: state.into(),
            submission: if submitting {
                Some(SubmissionOutcome::Pending)
            } else {
                form.submission
            },
            submitting,
            draft: form.draft.clone(),
            reveal_at: match state {
                PopupState::Waiting { reveal_at } => Some(reveal_at),
                _ => None,
            },
        }
    }

    /// Dismiss the popup.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Busy`] while a submission is in flight.
    pub async fn close(&self) -> Result<PopupView, SessionError> {
        if self.orchestrator.is_submitting() && self.scheduler.state() != PopupState::VisibleSuccess
        {
            return Err(SessionError::Busy);
        }

        let state = self.scheduler.close().await;
        if !state.is_shown() {
            self.form
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .reset();
        }
        Ok(self.view())
    }

    /// Submit `draft` from the visible form.
    ///
    /// The draft is kept whatever the outcome, so a failed submission can be
    /// retried as is. On success the scheduler records the submission and the
    /// thank-you view is shown.
    ///
    /// # Errors
    ///
    /// - [`SessionError::NotVisible`] unless the form is showing.
    /// - [`SessionError::Submit`] for validation failures and duplicate
    ///   submissions.
    pub async fn submit(
        &self,
        draft: FormDraft,
    ) -> Result<(SubmissionOutcome, PopupView), SessionError> {
        let state = self.scheduler.state();
        if state != PopupState::Visible {
            return Err(SessionError::NotVisible {
                state: state.to_string(),
            });
        }

        {
            let mut form = self.form.lock().unwrap_or_else(PoisonError::into_inner);
            self.sync(&mut form, state);
            if !self.orchestrator.is_submitting() {
                form.draft = draft.clone();
                // A new attempt replaces the last outcome, even if it fails validation.
                form.submission = None;
            }
        }

        let outcome = self.orchestrator.submit(&draft).await?;

        self.form
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .submission = Some(outcome);

        if outcome == SubmissionOutcome::Success {
            self.scheduler.record_submission().await;
        }
        info!(outcome = ?outcome, "popup form submitted");
        Ok((outcome, self.view()))
    }

    /// Cancel any pending reveal and discard the form.
    pub fn unmount(&self) {
        self.scheduler.unmount();
        self.form
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .reset();
    }

    fn sync(&self, form: &mut FormState, state: PopupState) {
        let reveals = self.scheduler.reveals();
        if reveals != form.seen_reveals && state != PopupState::VisibleSuccess {
            debug!(reveals, "popup revealed, starting a blank form");
            form.reset();
            form.seen_reveals = reveals;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use physio_storage::{KeyValueStore, MemoryStore};

    use super::*;
    use crate::clock::{Clock, MonotonicClock};
    use crate::cooldown::{CooldownStore, FORM_SUBMITTED_KEY, LAST_CLOSED_KEY};
    use crate::draft::tests::complete_draft;
    use crate::error::SubmitError;
    use crate::schedule::{PopupConfig, SuppressReason};
    use crate::submission::tests::{FakeEndpoints, Reply};

    fn session(store: &MemoryStore, fake: &Arc<FakeEndpoints>) -> PopupSession {
        let scheduler = PopupScheduler::new(
            PopupConfig::default(),
            CooldownStore::new(Arc::new(store.clone())),
            Arc::new(MonotonicClock::starting_at(0)),
        );
        PopupSession::new(scheduler, fake.orchestrator())
    }

    async fn wait_until_shown(session: &PopupSession) {
        let mut rx = session.scheduler().subscribe();
        rx.wait_for(|s| *s == PopupState::Visible).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn reveal_close_and_reshow_timeline() {
        let store = MemoryStore::new();
        let fake = FakeEndpoints::new(Reply::Success, Reply::Success);
        let session = session(&store, &fake);
        let clock = MonotonicClock::starting_at(0);

        let view = session.mount().await;
        assert_eq!(view.phase, PopupPhase::Hidden);
        assert_eq!(view.reveal_at, Some(5_000));

        wait_until_shown(&session).await;
        assert_eq!(clock.now_millis(), 5_000);
        assert_eq!(session.view().phase, PopupPhase::Form);

        tokio::time::advance(Duration::from_millis(1_000)).await;
        let view = session.close().await.unwrap();
        assert_eq!(view.state, PopupState::Waiting { reveal_at: 66_000 });
        assert_eq!(
            store.get_item(LAST_CLOSED_KEY).await.unwrap().as_deref(),
            Some("6000")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn successful_submission_shows_thank_you_and_records_time() {
        let store = MemoryStore::new();
        let fake = FakeEndpoints::new(Reply::Success, Reply::Success);
        let session = session(&store, &fake);
        session.mount().await;
        wait_until_shown(&session).await;

        let (outcome, view) = session.submit(complete_draft()).await.unwrap();
        assert_eq!(outcome, SubmissionOutcome::Success);
        assert_eq!(view.phase, PopupPhase::Success);
        assert_eq!(view.submission, Some(SubmissionOutcome::Success));
        assert_eq!(
            store.get_item(FORM_SUBMITTED_KEY).await.unwrap().as_deref(),
            Some("5000")
        );

        // The thank-you view stays until it is closed.
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(session.view().phase, PopupPhase::Success);

        let view = session.close().await.unwrap();
        assert_eq!(
            view.state,
            PopupState::Suppressed {
                reason: SuppressReason::Submitted
            }
        );
        assert!(view.draft.is_blank());
    }

    #[tokio::test(start_paused = true)]
    async fn half_failed_submission_keeps_draft_for_retry() {
        let store = MemoryStore::new();
        let fake = FakeEndpoints::new(Reply::Success, Reply::Refused);
        let session = session(&store, &fake);
        session.mount().await;
        wait_until_shown(&session).await;

        let (outcome, view) = session.submit(complete_draft()).await.unwrap();
        assert_eq!(outcome, SubmissionOutcome::Error);
        assert_eq!(view.phase, PopupPhase::Form);
        assert_eq!(view.draft, complete_draft());
        assert_eq!(store.get_item(FORM_SUBMITTED_KEY).await.unwrap(), None);

        // Retrying with the same draft is allowed.
        session.submit(view.draft).await.unwrap();
        assert_eq!(fake.calls(), (2, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_retry_clears_previous_outcome() {
        let store = MemoryStore::new();
        let fake = FakeEndpoints::new(Reply::Unreachable, Reply::Success);
        let session = session(&store, &fake);
        session.mount().await;
        wait_until_shown(&session).await;

        let (outcome, _) = session.submit(complete_draft()).await.unwrap();
        assert_eq!(outcome, SubmissionOutcome::Error);
        assert_eq!(session.view().submission, Some(SubmissionOutcome::Error));

        let partial = FormDraft {
            age: String::new(),
            ..complete_draft()
        };
        let err = session.submit(partial.clone()).await.unwrap_err();
        assert!(matches!(err, SessionError::Submit(SubmitError::Validation(_))));

        let view = session.view();
        assert_eq!(view.submission, None);
        assert_eq!(view.draft, partial);
        assert_eq!(fake.calls(), (1, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn reshown_form_starts_blank() {
        let store = MemoryStore::new();
        let fake = FakeEndpoints::new(Reply::Success, Reply::Success);
        let session = session(&store, &fake);
        session.mount().await;
        wait_until_shown(&session).await;

        let partial = FormDraft {
            phone: String::new(),
            ..complete_draft()
        };
        let err = session.submit(partial.clone()).await.unwrap_err();
        assert!(matches!(err, SessionError::Submit(SubmitError::Validation(_))));
        assert_eq!(session.view().draft, partial);
        assert_eq!(fake.calls(), (0, 0));

        session.close().await.unwrap();
        wait_until_shown(&session).await;
        let view = session.view();
        assert!(view.draft.is_blank());
        assert_eq!(view.submission, None);
    }

    #[tokio::test(start_paused = true)]
    async fn submit_requires_visible_form() {
        let store = MemoryStore::new();
        let fake = FakeEndpoints::new(Reply::Success, Reply::Success);
        let session = session(&store, &fake);
        session.mount().await;

        match session.submit(complete_draft()).await {
            Err(SessionError::NotVisible { state }) => assert_eq!(state, "waiting until 5000"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(fake.calls(), (0, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn close_is_refused_while_submitting() {
        let store = MemoryStore::new();
        let fake = FakeEndpoints::slow(Reply::Success, Reply::Success, Duration::from_secs(1));
        let session = session(&store, &fake);
        session.mount().await;
        wait_until_shown(&session).await;

        let (submitted, closed) = tokio::join!(session.submit(complete_draft()), async {
            tokio::task::yield_now().await;
            let view = session.view();
            assert!(view.submitting);
            assert_eq!(view.submission, Some(SubmissionOutcome::Pending));
            session.close().await
        });

        assert_eq!(submitted.unwrap().0, SubmissionOutcome::Success);
        assert!(matches!(closed, Err(SessionError::Busy)));
        assert_eq!(session.view().phase, PopupPhase::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn unmount_discards_form() {
        let store = MemoryStore::new();
        let fake = FakeEndpoints::new(Reply::Success, Reply::Refused);
        let session = session(&store, &fake);
        session.mount().await;
        wait_until_shown(&session).await;
        session.submit(complete_draft()).await.unwrap();

        session.unmount();
        let view = session.view();
        assert_eq!(view.state, PopupState::Unmounted);
        assert!(view.draft.is_blank());
        assert_eq!(view.submission, None);
    }
}
