//! HTTP error types for the clinic server.
//!
//! Maps domain errors from `physio-core` into HTTP responses. Every error
//! variant produces a JSON body with a machine-readable `error` field and a
//! human-readable `message`; validation failures also list the offending
//! fields.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use physio_core::error::{
    ContactError, FieldError, MailError, SessionError, SubmitError, ValidationError,
};

/// Application-level error returned from HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Client sent invalid input.
    #[error("{0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("{0}")]
    NotFound(String),
    /// The request conflicts with the current state (e.g. submission in
    /// flight).
    #[error("{0}")]
    Conflict(String),
    /// One or more form fields are invalid.
    #[error(transparent)]
    Validation(ValidationError),
    /// An upstream service failed or refused the request.
    #[error("{0}")]
    BadGateway(String),
    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldError>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, error_type, fields) = match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request", Vec::new()),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", Vec::new()),
            Self::Conflict(_) => (StatusCode::CONFLICT, "conflict", Vec::new()),
            Self::Validation(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_failed",
                err.fields,
            ),
            Self::BadGateway(_) => (StatusCode::BAD_GATEWAY, "bad_gateway", Vec::new()),
            Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                Vec::new(),
            ),
        };

        let body = ErrorBody {
            error: error_type,
            message,
            fields,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Validation(inner) => Self::Validation(inner),
            SubmitError::InFlight => Self::Conflict(err.to_string()),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotVisible { .. } | SessionError::Busy => {
                Self::Conflict(err.to_string())
            }
            SessionError::Submit(inner) => inner.into(),
        }
    }
}

impl From<ContactError> for AppError {
    fn from(err: ContactError) -> Self {
        match err {
            ContactError::Validation(inner) => Self::Validation(inner),
            ContactError::Gateway(_) | ContactError::Rejected { .. } => {
                Self::BadGateway(err.to_string())
            }
        }
    }
}

impl From<MailError> for AppError {
    fn from(err: MailError) -> Self {
        Self::Internal(err.to_string())
    }
}
