//! Maintenance mode middleware.
//!
//! When `MAINTENANCE_MODE` is on, every route except the health check
//! answers 503: pages get the static notice, API routes a JSON error.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{Html, IntoResponse, Response};
use serde_json::json;

use crate::routes::ui::{MAINTENANCE_DETAIL, MAINTENANCE_TITLE, maintenance_page};
use crate::state::AppState;

/// Path that stays reachable during maintenance.
pub const HEALTH_PATH: &str = "/v1/health";

/// Short-circuit every request with the maintenance notice while the switch
/// is on.
pub async fn maintenance_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.maintenance || request.uri().path() == HEALTH_PATH {
        return next.run(request).await;
    }

    if request.uri().path().starts_with("/v1/") {
        let body = json!({
            "error": "maintenance",
            "message": format!("{MAINTENANCE_TITLE}. {MAINTENANCE_DETAIL}"),
        });
        (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Html(maintenance_page())).into_response()
    }
}
