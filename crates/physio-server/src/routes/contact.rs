//! Contact page route: `POST /v1/contact`

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;

use physio_core::contact::{self, ContactMessage};

use crate::error::AppError;
use crate::state::AppState;

/// Build the `/v1/contact` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", post(send_contact))
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: &'static str,
}

async fn send_contact(
    State(state): State<Arc<AppState>>,
    Json(message): Json<ContactMessage>,
) -> Result<Json<ContactResponse>, AppError> {
    contact::relay(state.notifications.as_ref(), &message).await?;
    Ok(Json(ContactResponse {
        success: true,
        message: "Message Sent Successfully!",
    }))
}
