//! Dual-channel submission of the popup form.
//!
//! A validated draft goes to the appointment store and the forms relay at
//! the same time. The booking counts as done only when both report
//! `success: true`. When exactly one side succeeds nothing is rolled back:
//! the appointment may exist without a notification email, or the clinic may
//! get an email for an appointment that was never stored. Such partial
//! failures are logged at `warn` so they can be reconciled by hand.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{info, warn};

use crate::draft::FormDraft;
use crate::error::{GatewayError, SubmitError};
use crate::gateway::{AppointmentStore, Envelope, NotificationGateway};

/// Joint result of the two remote calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionOutcome {
    /// Both calls are in flight.
    Pending,
    /// Both calls answered `success: true`.
    Success,
    /// At least one call failed or answered `success: false`.
    Error,
}

/// Sends a popup draft to both endpoints and combines the answers.
pub struct SubmissionOrchestrator {
    appointments: Arc<dyn AppointmentStore>,
    notifications: Arc<dyn NotificationGateway>,
    in_flight: AtomicBool,
}

impl std::fmt::Debug for SubmissionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionOrchestrator")
            .field("in_flight", &self.is_submitting())
            .finish_non_exhaustive()
    }
}

/// Clears the in-flight flag however the submission ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SubmissionOrchestrator {
    #[must_use]
    pub fn new(
        appointments: Arc<dyn AppointmentStore>,
        notifications: Arc<dyn NotificationGateway>,
    ) -> Self {
        Self {
            appointments,
            notifications,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether a submission is currently in flight.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Validate `draft`, then send it to both endpoints concurrently.
    ///
    /// Remote failures never surface as `Err`; they become
    /// [`SubmissionOutcome::Error`].
    ///
    /// # Errors
    ///
    /// - [`SubmitError::Validation`] if a field is missing or malformed; no
    ///   request is made.
    /// - [`SubmitError::InFlight`] if another submission has not finished.
    pub async fn submit(&self, draft: &FormDraft) -> Result<SubmissionOutcome, SubmitError> {
        draft.validate()?;

        if self.in_flight.swap(true, Ordering::AcqRel) {
            return Err(SubmitError::InFlight);
        }
        let _guard = InFlight(&self.in_flight);

        let (saved, notified) = tokio::join!(
            self.appointments.save(draft),
            self.notifications.notify_consultation(draft),
        );

        Ok(combine(&saved, &notified))
    }
}

fn combine(
    saved: &Result<Envelope, GatewayError>,
    notified: &Result<Envelope, GatewayError>,
) -> SubmissionOutcome {
    let saved_ok = matches!(saved, Ok(Envelope { success: true, .. }));
    let notified_ok = matches!(notified, Ok(Envelope { success: true, .. }));

    match (saved_ok, notified_ok) {
        (true, true) => {
            info!("consultation request stored and relayed");
            SubmissionOutcome::Success
        }
        (true, false) | (false, true) => {
            warn!(
                appointment = ?saved,
                notification = ?notified,
                "partial submission failure: one side succeeded and is not rolled back"
            );
            SubmissionOutcome::Error
        }
        (false, false) => {
            warn!(
                appointment = ?saved,
                notification = ?notified,
                "consultation submission failed"
            );
            SubmissionOutcome::Error
        }
    }
}
