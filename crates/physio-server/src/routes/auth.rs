//! Admin sign-in route: `POST /v1/auth/login`

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::state::AppState;

/// Build the `/v1/auth` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/login", post(login))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> (StatusCode, Json<LoginResponse>) {
    let accepted = state
        .config
        .admin
        .as_ref()
        .is_some_and(|admin| admin.verify(&req.email, &req.password));

    if accepted {
        info!("admin signed in");
        (
            StatusCode::OK,
            Json(LoginResponse {
                success: true,
                message: None,
            }),
        )
    } else {
        warn!("admin sign-in refused");
        (
            StatusCode::UNAUTHORIZED,
            Json(LoginResponse {
                success: false,
                message: Some("Invalid credentials"),
            }),
        )
    }
}
