//! WebSocket handler
//!
//! Upgrades `/ws` requests and hands each connection to the broadcast hub.

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
};
use relay_common::AppError;

use crate::connection::Transport;
use crate::server::{GatewayError, GatewayState};

/// WebSocket upgrade handler
///
/// Refuses the upgrade before any handle exists when the request is not a
/// valid upgrade, the origin is not allowed or the hub is full.
pub async fn ws_handler(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "WebSocket upgrade rejected");
            return GatewayError::from(rejection).into_response();
        }
    };

    let config = state.config();
    let origin = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok());
    let host = headers.get(header::HOST).and_then(|v| v.to_str().ok());
    if !config
        .cors
        .allows_upgrade(origin, host, config.app.env.is_production())
    {
        tracing::warn!(origin = ?origin, "WebSocket origin not allowed");
        let origin = origin.unwrap_or("<none>").to_string();
        return GatewayError::from(AppError::OriginNotAllowed(origin)).into_response();
    }

    if !state.hub().has_capacity() {
        tracing::warn!(
            connections = state.hub().connection_count(),
            "WebSocket refused, hub at capacity"
        );
        return GatewayError::from(AppError::Unavailable("Too many connections".to_string()))
            .into_response();
    }

    ws.on_upgrade(|socket| handle_socket(state, socket))
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: GatewayState, socket: WebSocket) {
    let handle = state.hub().open(Transport::websocket(socket));
    let connection_id = handle.id();

    tracing::info!(connection_id = %connection_id, "WebSocket connection established");

    // Capacity can run out between the check and the upgrade
    if let Err(e) = state.hub().serve(handle).await {
        tracing::info!(connection_id = %connection_id, error = %e, "WebSocket connection refused");
    }
}
