//! Login error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use relay_common::AppError;
use relay_core::DomainError;
use thiserror::Error;

use super::LoginResponse;

/// Login gateway error type
#[derive(Debug, Error)]
pub enum LoginError {
    /// Malformed or invalid request body
    #[error("{0}")]
    InvalidRequest(String),

    /// Unknown username or wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Registration with an existing username
    #[error("Username already taken")]
    UsernameTaken(String),

    /// Account store failure
    #[error("Database error")]
    Storage(#[source] DomainError),

    /// Hashing or other internal failure
    #[error("Internal server error")]
    Internal(#[source] AppError),
}

impl LoginError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::UsernameTaken(_) => StatusCode::CONFLICT,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for LoginError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::UsernameTaken(username) => Self::UsernameTaken(username),
            other => Self::Storage(other),
        }
    }
}

impl From<AppError> for LoginError {
    fn from(err: AppError) -> Self {
        Self::Internal(err)
    }
}

impl IntoResponse for LoginError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = ?self, "Login request failed");
        }

        (status, Json(LoginResponse::failure(self.to_string()))).into_response()
    }
}
