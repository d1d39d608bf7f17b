//! Popup session routes: `/v1/popup/{visitor}/*`
//!
//! One session per visitor id. `POST /{visitor}` mounts it (idempotently),
//! `DELETE /{visitor}` unmounts it; the other routes act on a mounted
//! session and answer 404 otherwise.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;

use physio_core::draft::FormDraft;
use physio_core::popup::{PopupSession, PopupView};
use physio_core::submission::SubmissionOutcome;

use crate::error::AppError;
use crate::state::{AppState, MAX_VISITOR_ID_LEN, is_valid_visitor_id};

/// Build the `/v1/popup` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/{visitor}",
            post(mount_popup).get(read_popup).delete(unmount_popup),
        )
        .route("/{visitor}/close", post(close_popup))
        .route("/{visitor}/submit", post(submit_popup))
}

// ── Response types ───────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub outcome: SubmissionOutcome,
    pub view: PopupView,
}

// ── Handlers ─────────────────────────────────────────────────────────

async fn mount_popup(
    State(state): State<Arc<AppState>>,
    Path(visitor): Path<String>,
) -> Result<Json<PopupView>, AppError> {
    check_visitor(&visitor)?;
    let session = state.open_session(&visitor).await;
    Ok(Json(session.mount().await))
}

async fn read_popup(
    State(state): State<Arc<AppState>>,
    Path(visitor): Path<String>,
) -> Result<Json<PopupView>, AppError> {
    let session = existing(&state, &visitor).await?;
    Ok(Json(session.view()))
}

async fn close_popup(
    State(state): State<Arc<AppState>>,
    Path(visitor): Path<String>,
) -> Result<Json<PopupView>, AppError> {
    let session = existing(&state, &visitor).await?;
    Ok(Json(session.close().await?))
}

async fn submit_popup(
    State(state): State<Arc<AppState>>,
    Path(visitor): Path<String>,
    Json(draft): Json<FormDraft>,
) -> Result<Json<SubmitResponse>, AppError> {
    let session = existing(&state, &visitor).await?;
    let (outcome, view) = session.submit(draft).await?;
    Ok(Json(SubmitResponse { outcome, view }))
}

async fn unmount_popup(
    State(state): State<Arc<AppState>>,
    Path(visitor): Path<String>,
) -> Result<StatusCode, AppError> {
    check_visitor(&visitor)?;
    state.close_session(&visitor).await;
    Ok(StatusCode::NO_CONTENT)
}

// ── Helpers ──────────────────────────────────────────────────────────

fn check_visitor(visitor: &str) -> Result<(), AppError> {
    if is_valid_visitor_id(visitor) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "visitor id must be 1-{MAX_VISITOR_ID_LEN} characters of letters, digits, '-' or '_'"
        )))
    }
}

async fn existing(state: &AppState, visitor: &str) -> Result<Arc<PopupSession>, AppError> {
    check_visitor(visitor)?;
    state
        .session(visitor)
        .await
        .ok_or_else(|| AppError::NotFound(format!("no popup mounted for visitor {visitor}")))
}
