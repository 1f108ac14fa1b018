use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Field required: {0}")]
    MissingField(String),

    #[error("{1}")]
    Rejected(StatusCode, String),

    #[error("Eroare la generarea audio: {0}")]
    Synthesis(String),

    #[error("Eroare la procesare: {0}")]
    Processing(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Re-labels a synthesis failure raised on the upload path.
    pub fn into_processing(self) -> Self {
        match self {
            AppError::Synthesis(cause) => AppError::Processing(cause),
            AppError::Io(e) => AppError::Processing(e.to_string()),
            other => other,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::MissingField(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Rejected(status, _) => *status,
            AppError::Synthesis(_)
            | AppError::Processing(_)
            | AppError::Config(_)
            | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Malformed or oversized multipart bodies keep the status axum assigns
/// (400 or 413).
impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::Rejected(e.status(), e.body_text())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "Request failed: {}", detail);
        } else {
            tracing::warn!(status = status.as_u16(), "Request rejected: {}", detail);
        }

        (status, Json(ErrorResponse { detail })).into_response()
    }
}
