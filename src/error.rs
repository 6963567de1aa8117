//! Error types.
//!
//! `RepositoryError` is what storage backends return. `ApiError` is what
//! handlers return; it renders itself as the standard response envelope.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use crate::models::ApiResponse;

pub const INVALID_ID: &str = "Invalid Id";
pub const ZERO_ID: &str = "Cannot have 0 in id";
pub const COUPON_NAME_EXISTS: &str = "Coupon Name already exists";
pub const BAD_CREDENTIALS: &str = "Username and/or password is incorrect";
pub const USERNAME_EXISTS: &str = "Username already exists";

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("blocking task failed: {0}")]
    Blocking(#[from] tokio::task::JoinError),

    #[error("token signing failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<String>),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("{0}")]
    BadRequest(&'static str),

    /// A 400 with an empty error list.
    #[error("request rejected")]
    Rejected,

    /// Body or path segment that could not be parsed.
    #[error("malformed request: {0}")]
    Malformed(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("insufficient role")]
    Forbidden,

    #[error("{0}")]
    Internal(&'static str),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Internal(_) | ApiError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn messages(self) -> Vec<String> {
        match self {
            ApiError::Validation(errors) => errors,
            ApiError::Conflict(msg) | ApiError::BadRequest(msg) => vec![msg.to_string()],
            ApiError::Rejected => Vec::new(),
            ApiError::Malformed(detail) => vec![detail],
            ApiError::Unauthorized => vec!["Authentication required".to_string()],
            ApiError::Forbidden => vec!["Forbidden".to_string()],
            ApiError::Internal(detail) => {
                error!("Internal failure: {}", detail);
                vec!["Internal server error".to_string()]
            }
            ApiError::Repository(e) => {
                error!("Storage failure: {}", e);
                vec!["Internal server error".to_string()]
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Malformed(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Malformed(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let envelope: ApiResponse<()> = ApiResponse::failure(status, self.messages());
        (status, Json(envelope)).into_response()
    }
}
