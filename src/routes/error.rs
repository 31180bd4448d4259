use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::services::image_payload::ImagePayloadError;
use crate::services::studio::StudioError;

/// Error returned by API handlers, rendered as `{ "error", "message" }`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Invalid upload: {0}")]
    Upload(#[from] MultipartError),

    #[error(transparent)]
    Studio(#[from] StudioError),
}

impl From<ImagePayloadError> for ApiError {
    fn from(err: ImagePayloadError) -> Self {
        ApiError::Studio(StudioError::InvalidImage(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Upload(err) => match err.status() {
                StatusCode::PAYLOAD_TOO_LARGE => (StatusCode::PAYLOAD_TOO_LARGE, "TOO_LARGE"),
                status => (status, "BAD_REQUEST"),
            },
            ApiError::Studio(err) => match err {
                StudioError::NoActiveSession => (StatusCode::NOT_FOUND, "NO_SESSION"),
                StudioError::ItemNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                StudioError::InvalidImage(ImagePayloadError::UnsupportedFormat) => {
                    (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_IMAGE")
                }
                StudioError::InvalidImage(_) => (StatusCode::BAD_REQUEST, "INVALID_IMAGE"),
                StudioError::Configuration(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "NOT_CONFIGURED")
                }
                StudioError::Superseded => (StatusCode::CONFLICT, "SUPERSEDED"),
                StudioError::StillAnalyzing | StudioError::RunInProgress => {
                    (StatusCode::CONFLICT, "BUSY")
                }
                StudioError::ItemNotReady(_) => (StatusCode::CONFLICT, "NOT_READY"),
                StudioError::Task(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            },
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": code,
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}
