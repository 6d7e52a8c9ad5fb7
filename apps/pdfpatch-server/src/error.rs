//! Error types for the pdfpatch server

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pdfpatch_core::PdfPatchError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    #[error("Mutation failed: {0}")]
    MutationFailed(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("Server busy: {0} jobs already running")]
    Busy(usize),

    #[error("Internal error: {0}")]
    Internal(String),
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
        let (status, code) = match &self {
            ServerError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ServerError::InvalidPdf(_) => (StatusCode::BAD_REQUEST, "INVALID_PDF"),
            ServerError::MutationFailed(_) => (StatusCode::BAD_REQUEST, "MUTATION_FAILED"),
            ServerError::Timeout(_) => (StatusCode::REQUEST_TIMEOUT, "TIMEOUT"),
            ServerError::Busy(_) => (StatusCode::SERVICE_UNAVAILABLE, "BUSY"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<PdfPatchError> for ServerError {
    fn from(err: PdfPatchError) -> Self {
        match err {
            PdfPatchError::OpenFailure(msg) => ServerError::InvalidPdf(msg),
            PdfPatchError::SaveFailure(_) | PdfPatchError::Io(_) => {
                ServerError::Internal(err.to_string())
            }
            PdfPatchError::Directives(e) => ServerError::InvalidRequest(e.to_string()),
            other => ServerError::MutationFailed(other.to_string()),
        }
    }
}

impl From<MultipartError> for ServerError {
    fn from(err: MultipartError) -> Self {
        ServerError::InvalidRequest(format!("Multipart error: {}", err))
    }
}
