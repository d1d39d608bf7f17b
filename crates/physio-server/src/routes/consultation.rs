//! Consultation email route: `POST /v1/consultation`
//!
//! Renders the request as an HTML email to the clinic inbox and returns the
//! mail provider's response body as is.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tracing::{info, warn};

use physio_core::consultation::ConsultationRequest;
use physio_core::error::MailError;

use crate::error::AppError;
use crate::state::AppState;

/// Build the `/v1/consultation` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", post(send_consultation))
}

async fn send_consultation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ConsultationRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if state.config.mail_to.is_empty() {
        warn!("consultation email requested but no recipient is configured");
        return Err(MailError::NotConfigured.into());
    }

    let email = request.to_email(&state.config.mail_from, &state.config.mail_to);
    let sent = state.mailer.send(&email).await.map_err(|e| {
        warn!(error = %e, "consultation email failed");
        AppError::from(e)
    })?;

    info!(subject = %email.subject, "consultation email sent");
    Ok(Json(sent))
}
