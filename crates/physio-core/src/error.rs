//! Error types for `physio-core`.
//!
//! Each variant carries enough context to diagnose the failure from a log
//! line. Nothing here is fatal to a page: the server turns every error into a
//! JSON response.

use std::fmt;

use serde::Serialize;

/// A single field that failed validation, with the message shown next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Wire name of the field (e.g. `consultationMode`).
    pub field: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl FieldError {
    pub(crate) fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Local validation failure. Reported inline; the form is never sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Every offending field, in form order.
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    /// Whether `field` is among the failures.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }

    pub(crate) fn from_fields(fields: Vec<FieldError>) -> Result<(), Self> {
        if fields.is_empty() {
            Ok(())
        } else {
            Err(Self { fields })
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid form:")?;
        for (i, field) in self.fields.iter().enumerate() {
            let sep = if i == 0 { " " } else { "; " };
            write!(f, "{sep}{}: {}", field.field, field.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Errors from a remote form endpoint (appointment store or forms relay).
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The request never produced a response (DNS, connect, timeout).
    #[error("request to {endpoint} failed: {reason}")]
    Transport { endpoint: String, reason: String },

    /// The endpoint answered with a non-JSON or malformed body.
    #[error("unreadable response from {endpoint} (HTTP {status}): {reason}")]
    Decode {
        endpoint: String,
        status: u16,
        reason: String,
    },
}

/// Errors from the dual-submission orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// A required field is missing or malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A submission for this form is already in flight.
    #[error("a submission is already in progress")]
    InFlight,
}

/// Errors from the popup session (presentation lifecycle).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The popup is not showing the form, so there is nothing to submit.
    #[error("popup is not showing the form (state: {state})")]
    NotVisible { state: String },

    /// The popup cannot be closed while a submission is in flight.
    #[error("popup is busy submitting")]
    Busy,

    /// The submission itself was refused.
    #[error(transparent)]
    Submit(#[from] SubmitError),
}

/// Errors from the contact form relay.
#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    /// A required field is missing or malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The relay could not be reached.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The relay answered `success: false`.
    #[error("{message}")]
    Rejected { message: String },
}

/// Errors from the transactional-email provider.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// No API key is configured, so nothing can be sent.
    #[error("mail provider is not configured")]
    NotConfigured,

    /// The request never produced a response.
    #[error("mail request failed: {reason}")]
    Transport { reason: String },

    /// The provider rejected the message.
    #[error("mail provider rejected the message (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },
}
