//! Error types for the splice server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use pdfsplice_core::SpliceError;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Processing failed: {0}")]
    Processing(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ServerError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg.clone())
            }
            ServerError::NotFound(name) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("File not found: {}", name),
            ),
            // Processing detail stays server-side
            ServerError::Processing(detail) => {
                tracing::error!("Processing error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PROCESSING_ERROR",
                    "PDF processing failed".to_string(),
                )
            }
            ServerError::Io(e) => {
                tracing::error!("I/O error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal error".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<SpliceError> for ServerError {
    fn from(err: SpliceError) -> Self {
        match err {
            SpliceError::InvalidRange(msg) => ServerError::InvalidRequest(msg),
            SpliceError::TooFewDocuments(count) => ServerError::InvalidRequest(format!(
                "At least 2 PDF files are required, got {}",
                count
            )),
            other => ServerError::Processing(other.to_string()),
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for ServerError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        ServerError::InvalidRequest(format!("Failed to read upload: {}", err))
    }
}
