use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::storage::{StoreError, UploadError};
use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Persistence(_) | AppError::Upload(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Persistence(_) => "DATABASE_ERROR",
            AppError::Upload(_) => "UPLOAD_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::ValidationError(msg) | AppError::AuthError(msg) | AppError::NotFound(msg) => {
                error!(error = ?self, message = %msg, "Application error");
            }
            AppError::Persistence(e) => {
                error!(error = ?e, "Persistence error");
            }
            AppError::Upload(e) => {
                error!(error = ?e, "Upload error");
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        self.log();

        // Storage failures stay in the logs
        let public_message = match &self {
            AppError::ValidationError(msg) | AppError::AuthError(msg) | AppError::NotFound(msg) => {
                msg.clone()
            }
            AppError::Persistence(_) => "A database error occurred".to_string(),
            AppError::Upload(_) => "The file could not be stored".to_string(),
        };

        error_response(code, public_message, None, status)
    }
}
