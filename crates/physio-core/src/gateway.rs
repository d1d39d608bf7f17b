//! Remote form endpoints.
//!
//! Two collaborators receive a submitted popup form: the appointment store
//! (the clinic's app server) and the forms relay that turns a submission into
//! a notification email. Both answer with a `{success: bool, ...}` envelope.
//! The server crate implements these traits over HTTP.

use serde::{Deserialize, Serialize};

use crate::contact::ContactMessage;
use crate::draft::FormDraft;
use crate::error::GatewayError;

/// Subject line of the notification email for a popup submission.
pub const CONSULTATION_SUBJECT: &str = "New Free Consultation Request";

/// Sender name shown on relayed emails.
pub const FROM_NAME: &str = "Clinic Website";

/// Response body shared by both endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Envelope {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// Durable record of a booking request.
#[async_trait::async_trait]
pub trait AppointmentStore: Send + Sync + 'static {
    /// Persist `draft` as an appointment request.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if the endpoint is unreachable or its answer
    /// cannot be read. A reachable endpoint that refuses the draft answers
    /// `Ok` with `success: false`.
    async fn save(&self, draft: &FormDraft) -> Result<Envelope, GatewayError>;
}

/// Forms-as-a-service relay that emails submissions to the clinic.
#[async_trait::async_trait]
pub trait NotificationGateway: Send + Sync + 'static {
    /// Relay a popup submission as [`ConsultationNotice`].
    ///
    /// # Errors
    ///
    /// Same contract as [`AppointmentStore::save`].
    async fn notify_consultation(&self, draft: &FormDraft) -> Result<Envelope, GatewayError>;

    /// Relay a contact-page message as [`ContactNotice`].
    ///
    /// # Errors
    ///
    /// Same contract as [`AppointmentStore::save`].
    async fn send_contact(&self, message: &ContactMessage) -> Result<Envelope, GatewayError>;
}

/// Body sent to the forms relay for a popup submission: the draft fields
/// plus the relay credential and fixed subject.
#[derive(Debug, Serialize)]
pub struct ConsultationNotice<'a> {
    #[serde(flatten)]
    pub draft: &'a FormDraft,
    pub access_key: &'a str,
    pub subject: &'static str,
    pub from_name: &'static str,
}

impl<'a> ConsultationNotice<'a> {
    #[must_use]
    pub fn new(draft: &'a FormDraft, access_key: &'a str) -> Self {
        Self {
            draft,
            access_key,
            subject: CONSULTATION_SUBJECT,
            from_name: FROM_NAME,
        }
    }
}

/// Body sent to the forms relay for a contact-page message.
#[derive(Debug, Serialize)]
pub struct ContactNotice<'a> {
    pub access_key: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub subject: String,
    pub message: &'a str,
}

impl<'a> ContactNotice<'a> {
    #[must_use]
    pub fn new(message: &'a ContactMessage, access_key: &'a str) -> Self {
        Self {
            access_key,
            name: &message.name,
            email: &message.email,
            subject: message.subject_line(),
            message: &message.message,
        }
    }
}
