//! HTTP implementations of the form endpoints and the mail provider.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use physio_core::consultation::{Mailer, OutgoingEmail};
use physio_core::contact::ContactMessage;
use physio_core::draft::FormDraft;
use physio_core::error::{GatewayError, MailError};
use physio_core::gateway::{
    AppointmentStore, ConsultationNotice, ContactNotice, Envelope, NotificationGateway,
};

/// Build the shared outbound client.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialised.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("physio-server/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// POST `body` as JSON and read a `{success, ...}` envelope back.
///
/// The envelope is read whatever the status code: both endpoints report
/// refusals in the body.
async fn post_envelope(
    client: &reqwest::Client,
    endpoint: &str,
    body: &impl Serialize,
) -> Result<Envelope, GatewayError> {
    let resp = client
        .post(endpoint)
        .json(body)
        .send()
        .await
        .map_err(|e| GatewayError::Transport {
            endpoint: endpoint.to_owned(),
            reason: e.to_string(),
        })?;

    let status = resp.status().as_u16();
    let bytes = resp.bytes().await.map_err(|e| GatewayError::Transport {
        endpoint: endpoint.to_owned(),
        reason: e.to_string(),
    })?;
    debug!(endpoint, status, "upstream answered");

    serde_json::from_slice(&bytes).map_err(|e| GatewayError::Decode {
        endpoint: endpoint.to_owned(),
        status,
        reason: e.to_string(),
    })
}

/// The clinic's appointment API.
#[derive(Debug, Clone)]
pub struct HttpAppointmentStore {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAppointmentStore {
    /// Appointments are posted to `{api_url}/appointments`.
    #[must_use]
    pub fn new(client: reqwest::Client, api_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/appointments", api_url.trim_end_matches('/')),
        }
    }
}

#[async_trait::async_trait]
impl AppointmentStore for HttpAppointmentStore {
    async fn save(&self, draft: &FormDraft) -> Result<Envelope, GatewayError> {
        post_envelope(&self.client, &self.endpoint, draft).await
    }
}

/// The forms-as-a-service relay.
#[derive(Clone)]
pub struct HttpFormsRelay {
    client: reqwest::Client,
    endpoint: String,
    access_key: String,
}

impl std::fmt::Debug for HttpFormsRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFormsRelay")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl HttpFormsRelay {
    #[must_use]
    pub fn new(client: reqwest::Client, endpoint: &str, access_key: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_owned(),
            access_key: access_key.to_owned(),
        }
    }
}

#[async_trait::async_trait]
impl NotificationGateway for HttpFormsRelay {
    async fn notify_consultation(&self, draft: &FormDraft) -> Result<Envelope, GatewayError> {
        let notice = ConsultationNotice::new(draft, &self.access_key);
        post_envelope(&self.client, &self.endpoint, &notice).await
    }

    async fn send_contact(&self, message: &ContactMessage) -> Result<Envelope, GatewayError> {
        let notice = ContactNotice::new(message, &self.access_key);
        post_envelope(&self.client, &self.endpoint, &notice).await
    }
}

/// Resend transactional email API.
#[derive(Clone)]
pub struct ResendMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for ResendMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResendMailer")
            .field("endpoint", &self.endpoint)
            .field("configured", &self.api_key.is_some())
            .finish_non_exhaustive()
    }
}

impl ResendMailer {
    #[must_use]
    pub fn new(client: reqwest::Client, endpoint: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.to_owned(),
            api_key,
        }
    }
}

#[async_trait::async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<serde_json::Value, MailError> {
        let Some(api_key) = &self.api_key else {
            return Err(MailError::NotConfigured);
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(email)
            .send()
            .await
            .map_err(|e| MailError::Transport {
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                message: body,
            });
        }

        resp.json().await.map_err(|e| MailError::Transport {
            reason: format!("failed to parse provider response: {e}"),
        })
    }
}
