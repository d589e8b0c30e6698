//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use spellbook_core::dto::error::{ErrorBody, MALFORMED_RESULT};

use crate::gateway::StoreError;
use crate::service::{ClassError, JobError, ReviewError};

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
    DatabaseError(sqlx::Error),
    InternalError(String),
    /// A stored job result that cannot be parsed; tagged so clients can tell
    /// it apart from a transient failure
    MalformedResult(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorBody::new(msg)),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorBody::new(msg)),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, ErrorBody::new(msg)),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, ErrorBody::new(msg)),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, ErrorBody::new(msg)),
            ApiError::DatabaseError(err) => {
                tracing::error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("Internal server error"),
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::new(msg))
            }
            ApiError::MalformedResult(msg) => {
                tracing::error!("Malformed result: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new(msg).with_code(MALFORMED_RESULT),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::DatabaseError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => ApiError::NotFound(format!("Object {} not found", key)),
            StoreError::InvalidKey(key) => ApiError::BadRequest(format!("Invalid object key {:?}", key)),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::Validation(msg) => ApiError::BadRequest(msg),
            JobError::ClassNotFound(id) => ApiError::NotFound(format!("Class {} not found", id)),
            JobError::NoInputs(id) => {
                ApiError::NotFound(format!("Class {} has no notes to generate a quiz from", id))
            }
            JobError::JobNotFound(id) => ApiError::NotFound(format!("Job {} not found", id)),
            JobError::ResultNotFound(id) => {
                ApiError::NotFound(format!("Result for job {} not found", id))
            }
            JobError::Conflict(id) => {
                ApiError::Conflict(format!("Score already recorded for job {}", id))
            }
            JobError::MalformedResult { .. } => ApiError::MalformedResult(err.to_string()),
            JobError::Database(err) => ApiError::DatabaseError(err),
            JobError::Store(err) => err.into(),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<ClassError> for ApiError {
    fn from(err: ClassError) -> Self {
        match err {
            ClassError::Validation(msg) => ApiError::BadRequest(msg),
            ClassError::ClassNotFound(id) => ApiError::NotFound(format!("Class {} not found", id)),
            ClassError::NoteNotFound(key) => ApiError::NotFound(format!("Note {} not found", key)),
            ClassError::Store(err) => err.into(),
            ClassError::Database(err) => ApiError::DatabaseError(err),
            ClassError::Records(err) => ApiError::InternalError(err.to_string()),
        }
    }
}

impl From<ReviewError> for ApiError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::Validation(msg) => ApiError::BadRequest(msg),
            ReviewError::Job(err) => err.into(),
            ReviewError::Llm { .. } => ApiError::InternalError(err.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
