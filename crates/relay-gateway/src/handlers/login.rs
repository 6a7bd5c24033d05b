//! Login handlers

use axum::{extract::State, http::StatusCode, Json};

use super::ValidatedJson;
use crate::login::{Credentials, LoginError, LoginOutcome, LoginResponse};
use crate::server::GatewayState;

/// Log in with username and password
///
/// POST /login
pub async fn login(
    State(state): State<GatewayState>,
    ValidatedJson(request): ValidatedJson<Credentials>,
) -> Result<Json<LoginResponse>, LoginError> {
    let outcome = state.login().login(&request.username, &request.password).await?;

    let message = match outcome {
        LoginOutcome::Authenticated(_) => "Login successful",
        LoginOutcome::Registered(_) => "Account created, login successful",
    };
    Ok(Json(LoginResponse::success(message)))
}

/// Create a new account
///
/// POST /register
pub async fn register(
    State(state): State<GatewayState>,
    ValidatedJson(request): ValidatedJson<Credentials>,
) -> Result<(StatusCode, Json<LoginResponse>), LoginError> {
    state.login().register(&request.username, &request.password).await?;
    Ok((StatusCode::CREATED, Json(LoginResponse::success("Account created"))))
}
