use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    External(String),
    #[error("Failed to upload {} of {attempted} images", .failed.len())]
    PartialUpload {
        attempted: usize,
        uploaded: usize,
        failed: Vec<String>,
    },
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    uploaded: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed: Option<Vec<String>>,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn external(message: impl Into<String>) -> Self {
        Self::External(message.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::External(_) | Self::PartialUpload { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let error = self.to_string();
        let body = match self {
            Self::PartialUpload {
                uploaded, failed, ..
            } => ErrorBody {
                error,
                uploaded: Some(uploaded),
                failed: Some(failed),
            },
            _ => ErrorBody {
                error,
                uploaded: None,
                failed: None,
            },
        };
        (status, Json(body)).into_response()
    }
}
