//! Gateway server setup
//!
//! Routes, state construction and the serve loop with graceful shutdown.

mod error;
mod middleware;
mod state;

pub use error::GatewayError;
pub use middleware::REQUEST_ID_HEADER;
pub use state::GatewayState;

use axum::{
    routing::{get, post},
    Router,
};
use relay_common::{AppConfig, AppError};
use relay_core::AccountRepository;
use relay_db::{create_pool, run_migrations, DatabaseConfig, SqliteAccountRepository};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tracing::{error, info};

use crate::handlers::{health_check, login, register, ws_handler};
use crate::hub::{BroadcastHub, HubConfig};
use crate::login::LoginGateway;

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/health", get(health_check))
}

/// Build the complete application
///
/// Any path without a route is served from the static directory.
pub fn create_app(state: GatewayState) -> Router {
    let config = state.config();
    let static_files = ServeDir::new(&config.static_files.dir).append_index_html_on_directories(true);

    let router = create_router().fallback_service(static_files);
    let is_production = config.app.env.is_production();
    let router = middleware::apply_middleware(router, &config.cors, is_production);
    router.with_state(state)
}

/// Initialize all dependencies and create `GatewayState`
pub async fn create_gateway_state(config: AppConfig) -> Result<GatewayState, AppError> {
    config.hub.validate()?;

    info!(url = %config.database.url, "Opening SQLite database...");
    let db_config = DatabaseConfig::new(config.database.url.clone(), config.database.max_connections);
    let pool = create_pool(&db_config)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    run_migrations(&pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let accounts = Arc::new(SqliteAccountRepository::new(pool));
    let account_count = accounts
        .count()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    info!(accounts = account_count, "Database ready");

    let login = LoginGateway::new(accounts).with_auto_register(config.login.auto_register);

    let hub_config = HubConfig::from(&config.hub);
    info!(
        send_timeout_ms = hub_config.send_timeout.as_millis(),
        max_connections = ?hub_config.max_connections,
        echo = ?hub_config.echo,
        "Broadcast hub configured"
    );
    let hub = BroadcastHub::new_shared(hub_config);

    Ok(GatewayState::new(hub, login, config))
}

/// Serve the application until `shutdown` is cancelled
///
/// On shutdown every WebSocket connection is closed so that their tasks end
/// and the server can drain.
pub async fn run_server(
    listener: TcpListener,
    app: Router,
    hub: Arc<BroadcastHub>,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let addr = listener.local_addr().map_err(AppError::Server)?;

    info!("Gateway listening on http://{}", addr);
    info!("WebSocket endpoint at ws://{}/ws", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            info!("Shutdown signal received, closing connections");
            hub.close_all();
        })
        .await
        .map_err(AppError::Server)?;

    info!("Gateway stopped");
    Ok(())
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = config.server.address();

    let state = create_gateway_state(config).await?;
    let hub = Arc::clone(state.hub());
    let app = create_app(state);

    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(source) => return Err(AppError::Bind { addr, source }),
    };

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    run_server(listener, app, hub, shutdown).await
}

/// Cancel `shutdown` on Ctrl+C or SIGTERM
async fn wait_for_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    shutdown.cancel();
}
