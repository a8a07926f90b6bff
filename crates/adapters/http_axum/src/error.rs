//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use presence_domain::error::{PresenceError, ValidationError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`PresenceError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(PresenceError);

impl From<PresenceError> for ApiError {
    fn from(err: PresenceError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            PresenceError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            PresenceError::NotFound(err) => {
                tracing::warn!(error = %err, "not found");
                (StatusCode::NOT_FOUND, err.to_string())
            }
            PresenceError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            PresenceError::Notification(err) => {
                tracing::error!(error = %err, "notification error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
