//! Consultation request emailed straight to the clinic.
//!
//! Unlike the popup, this form has no appointment record: the request is
//! rendered as an HTML email and handed to a [`Mailer`].

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::error::MailError;

/// Sender used when none is configured.
pub const DEFAULT_FROM: &str = "Contact Form <onboarding@resend.dev>";

/// A consultation request as posted by the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsultationRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub subject: Option<String>,
    pub message: String,
    pub contact_preference: String,
}

/// A message ready for the mail provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub reply_to: String,
    pub html: String,
}

impl ConsultationRequest {
    /// The given subject, or `New message from <name>` when it is blank.
    #[must_use]
    pub fn subject_line(&self) -> String {
        match self.subject.as_deref().map(str::trim) {
            Some(subject) if !subject.is_empty() => subject.to_owned(),
            _ => format!("New message from {}", self.name),
        }
    }

    /// Render the email. Every field is HTML-escaped.
    #[must_use]
    pub fn to_email(&self, from: &str, to: &[String]) -> OutgoingEmail {
        let mut html = String::from("<h1>New Contact Form Submission</h1>\n");
        for (label, value) in [
            ("Name", &self.name),
            ("Email", &self.email),
            ("Phone", &self.phone),
            ("Preferred Contact", &self.contact_preference),
        ] {
            let _ = writeln!(html, "<p><strong>{label}:</strong> {}</p>", escape_html(value));
        }
        html.push_str("<hr>\n<h2>Message:</h2>\n");
        let _ = writeln!(html, "<p>{}</p>", escape_html(&self.message));

        OutgoingEmail {
            from: from.to_owned(),
            to: to.to_vec(),
            subject: self.subject_line(),
            reply_to: self.email.clone(),
            html,
        }
    }
}

/// Escape the five characters that matter in HTML text and attributes.
#[must_use]
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Transactional email provider.
#[async_trait::async_trait]
pub trait Mailer: Send + Sync + 'static {
    /// Send `email`, returning the provider's response body.
    ///
    /// # Errors
    ///
    /// Returns [`MailError`] if the provider is unconfigured, unreachable,
    /// or refuses the message.
    async fn send(&self, email: &OutgoingEmail) -> Result<serde_json::Value, MailError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request() -> ConsultationRequest {
        ConsultationRequest {
            name: "Arjun".to_owned(),
            email: "arjun@example.com".to_owned(),
            phone: "9123456780".to_owned(),
            subject: None,
            message: "Shoulder <stiffness> & pain".to_owned(),
            contact_preference: "phone".to_owned(),
        }
    }

    #[test]
    fn blank_subject_falls_back_to_name() {
        assert_eq!(request().subject_line(), "New message from Arjun");
        let blank = ConsultationRequest {
            subject: Some("  ".to_owned()),
            ..request()
        };
        assert_eq!(blank.subject_line(), "New message from Arjun");
        let given = ConsultationRequest {
            subject: Some("Follow-up".to_owned()),
            ..request()
        };
        assert_eq!(given.subject_line(), "Follow-up");
    }

    #[test]
    fn email_is_escaped_and_replies_to_sender() {
        let to = vec!["clinic@example.com".to_owned()];
        let email = request().to_email(DEFAULT_FROM, &to);
        assert_eq!(email.reply_to, "arjun@example.com");
        assert_eq!(email.to, to);
        assert!(email.html.contains("<p>Shoulder &lt;stiffness&gt; &amp; pain</p>"));
        assert!(email.html.contains("<p><strong>Preferred Contact:</strong> phone</p>"));
    }

    #[test]
    fn request_reads_camel_case() {
        let parsed: ConsultationRequest =
            serde_json::from_str(r#"{"name":"A","contactPreference":"email"}"#).unwrap();
        assert_eq!(parsed.contact_preference, "email");
        assert_eq!(parsed.subject, None);
    }

    #[test]
    fn escape_covers_quotes() {
        assert_eq!(escape_html(r#"a"b'c"#), "a&quot;b&#39;c");
    }
}
