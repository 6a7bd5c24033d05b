//! Gateway error responses

use axum::{
    extract::ws::rejection::WebSocketUpgradeRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use relay_common::{AppError, ErrorResponse};
use thiserror::Error;

/// Errors returned by gateway routes outside the login endpoints
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Not a valid WebSocket upgrade request
    #[error(transparent)]
    Upgrade(#[from] WebSocketUpgradeRejection),

    #[error(transparent)]
    App(#[from] AppError),
}

impl GatewayError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Upgrade(rejection) => rejection.status(),
            Self::App(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            Self::Upgrade(rejection) => rejection.into_response(),
            Self::App(e) => {
                let status =
                    StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                if status.is_server_error() {
                    tracing::error!(error = ?e, "Request failed");
                }
                (status, Json(ErrorResponse::from(&e))).into_response()
            }
        }
    }
}
