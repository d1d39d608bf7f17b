//! Contact page form.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::draft::looks_like_email;
use crate::error::{ContactError, FieldError, ValidationError};
use crate::gateway::NotificationGateway;

/// Shown when the relay refuses a message without saying why.
pub const FALLBACK_FAILURE: &str = "Failed to send message. Please try again.";

/// A message from the contact page. `subject` is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactMessage {
    /// Subject line of the relayed email.
    #[must_use]
    pub fn subject_line(&self) -> String {
        format!("Contact Form: {}", self.subject.trim())
    }

    /// # Errors
    ///
    /// Returns [`ValidationError`] if the name, email or message is missing,
    /// or the email is malformed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut fields = Vec::new();
        if self.name.trim().is_empty() {
            fields.push(FieldError::new("name", "Name is required"));
        }
        if self.email.trim().is_empty() {
            fields.push(FieldError::new("email", "Email is required"));
        } else if !looks_like_email(&self.email) {
            fields.push(FieldError::new("email", "Email is invalid"));
        }
        if self.message.trim().is_empty() {
            fields.push(FieldError::new("message", "Message is required"));
        }
        ValidationError::from_fields(fields)
    }
}

/// Validate `message` and relay it.
///
/// # Errors
///
/// - [`ContactError::Validation`] before anything is sent.
/// - [`ContactError::Gateway`] if the relay is unreachable.
/// - [`ContactError::Rejected`] if the relay answers `success: false`.
pub async fn relay(
    gateway: &dyn NotificationGateway,
    message: &ContactMessage,
) -> Result<(), ContactError> {
    message.validate()?;

    let envelope = gateway.send_contact(message).await?;
    if envelope.success {
        info!(subject = %message.subject_line(), "contact message relayed");
        Ok(())
    } else {
        warn!(reply = ?envelope.message, "forms relay refused contact message");
        Err(ContactError::Rejected {
            message: envelope
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| FALLBACK_FAILURE.to_owned()),
        })
    }
}
