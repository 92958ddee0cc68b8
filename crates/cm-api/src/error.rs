//! API error handling
//!
//! Maps domain errors onto HTTP responses with a classified JSON body.
//! Internal causes are logged server-side and never leak to the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cm_attachments::StorageError;
use cm_listings::ListingError;
use serde::Serialize;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    NotFound { resource: &'static str, id: String },
    Unauthorized(String),
    BadRequest(String),
    Ingestion(String),
    Internal(String),
}

impl ApiError {
    pub fn not_found(resource: &'static str, id: impl std::fmt::Display) -> Self {
        ApiError::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ApiError::Unauthorized(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn ingestion(msg: impl Into<String>) -> Self {
        ApiError::Ingestion(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Ingestion(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound { .. } => "not_found",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Ingestion(_) => "ingestion_failed",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            ApiError::NotFound { resource, id } => format!("{} with id {} not found", resource, id),
            ApiError::Unauthorized(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Ingestion(msg)
            | ApiError::Internal(msg) => msg.clone(),
        };

        let body = ErrorBody {
            error: self.error_code(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<ListingError> for ApiError {
    fn from(err: ListingError) -> Self {
        match err {
            ListingError::NotFound(id) => ApiError::not_found("Car", id),
            ListingError::NotOwner { .. } => ApiError::unauthorized("Not authorized"),
            ListingError::Store(cause) => {
                tracing::error!(error = %cause, "record store failure");
                ApiError::internal("Server error")
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::TooLarge { size, max } => ApiError::bad_request(format!(
                "Uploaded file of {} bytes exceeds the {} byte limit",
                size, max
            )),
            cause => {
                tracing::error!(error = %cause, "attachment ingestion failure");
                ApiError::ingestion("Could not store uploaded attachments")
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
