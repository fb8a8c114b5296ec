#![forbid(unsafe_code)]

use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use survey_kernel_contracts::submission::{ApiErrorCode, ApiResponse, FieldError};
use survey_storage::repo::{SubmissionWriteError, WriteStage};
use survey_storage::survey_db::StorageError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),
    #[error("Invalid reference data")]
    InvalidReference,
    #[error("{0}")]
    Internal(&'static str),
    #[error("Endpoint not found")]
    NotFound,
    #[error("Too many requests from this IP, please try again later.")]
    RateLimited { retry_after_secs: u64 },
    #[error("{message}")]
    UnreadableBody { status: StatusCode, message: String },
}

impl ApiError {
    /// Logs the storage failure and classifies it for the client.
    pub fn from_storage(err: &StorageError, message: &'static str) -> Self {
        error!(error = %err, "{message}");
        if err.is_invalid_reference() {
            Self::InvalidReference
        } else {
            Self::Internal(message)
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidReference => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::UnreadableBody { status, .. } => *status,
        }
    }

    pub fn code(&self) -> Option<ApiErrorCode> {
        match self {
            Self::Validation(_) => None,
            Self::InvalidReference => Some(ApiErrorCode::InvalidReference),
            Self::Internal(_) => Some(ApiErrorCode::InternalError),
            Self::NotFound => Some(ApiErrorCode::NotFound),
            Self::RateLimited { .. } => Some(ApiErrorCode::RateLimited),
            Self::UnreadableBody { .. } => Some(ApiErrorCode::UnhandledError),
        }
    }
}

impl From<SubmissionWriteError> for ApiError {
    fn from(err: SubmissionWriteError) -> Self {
        match (err.stage, &err.source) {
            (WriteStage::Validate, StorageError::ContractViolation(violation)) => {
                Self::Validation(vec![FieldError::new("request", violation.to_string())])
            }
            (stage, source) => Self::from_storage(source, stage.failure_message()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let retry_after = match &self {
            Self::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        };
        let message = self.to_string();
        let details = match self {
            Self::Validation(details) => Some(details),
            _ => None,
        };
        let body: ApiResponse<()> = ApiResponse::failure(message, code, details);
        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
