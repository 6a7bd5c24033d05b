//! Test helpers for integration tests
//!
//! Provides utilities for spawning test servers, making HTTP requests
//! and driving WebSocket clients.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use relay_common::AppConfig;
use relay_gateway::{create_app, create_gateway_state, run_server, BroadcastHub};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

/// How long to wait for anything the server should do promptly
pub const WAIT: Duration = Duration::from_secs(5);

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    hub: Arc<BroadcastHub>,
    shutdown: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    /// Start a new test server with an in-memory database
    pub async fn start() -> Result<Self> {
        Self::start_with_config(test_config()).await
    }

    /// Start a test server with custom config
    pub async fn start_with_config(config: AppConfig) -> Result<Self> {
        let state = create_gateway_state(config).await?;
        let hub = Arc::clone(state.hub());
        let app = create_app(state);

        // Port 0 lets the OS pick a free port
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let shutdown = CancellationToken::new();
        let handle = {
            let hub = Arc::clone(&hub);
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                run_server(listener, app, hub, shutdown).await.ok();
            })
        };

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            hub,
            shutdown,
            handle: Some(handle),
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the WebSocket endpoint URL
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Get the server's broadcast hub
    pub fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Make a POST request with JSON body
    pub async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.post(&url).json(body).send().await?)
    }

    /// Make a POST request with a raw body
    pub async fn post_raw(&self, path: &str, content_type: &str, body: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self
            .client
            .post(&url)
            .header("Content-Type", content_type)
            .body(body.to_string())
            .send()
            .await?)
    }

    /// Open a WebSocket connection
    pub async fn connect(&self) -> Result<WsClient> {
        let request = self.ws_url().into_client_request()?;
        WsClient::connect(request).await
    }

    /// Open a WebSocket connection with an `Origin` header
    pub async fn connect_with_origin(&self, origin: &str) -> Result<WsClient> {
        let mut request = self.ws_url().into_client_request()?;
        request
            .headers_mut()
            .insert(header::ORIGIN, HeaderValue::from_str(origin)?);
        WsClient::connect(request).await
    }

    /// Open `n` connections and wait until all are registered
    pub async fn connect_many(&self, n: usize) -> Result<Vec<WsClient>> {
        let mut clients = Vec::with_capacity(n);
        for _ in 0..n {
            clients.push(self.connect().await?);
        }
        self.wait_for_connections(n).await?;
        Ok(clients)
    }

    /// Wait until the hub holds exactly `n` connections
    pub async fn wait_for_connections(&self, n: usize) -> Result<()> {
        tokio::time::timeout(WAIT, async {
            while self.hub.connection_count() != n {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .with_context(|| {
            format!(
                "expected {n} connections, hub has {}",
                self.hub.connection_count()
            )
        })
    }

    /// Trigger graceful shutdown and wait for the server task
    pub async fn shutdown(&mut self) -> Result<()> {
        self.shutdown.cancel();
        if let Some(handle) = self.handle.take() {
            tokio::time::timeout(WAIT, handle)
                .await
                .context("server did not stop")??;
        }
        Ok(())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// WebSocket client for tests
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl std::fmt::Debug for WsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsClient").finish_non_exhaustive()
    }
}

impl WsClient {
    async fn connect(
        request: tokio_tungstenite::tungstenite::handshake::client::Request,
    ) -> Result<Self> {
        let (stream, _response) = tokio_tungstenite::connect_async(request).await?;
        Ok(Self { stream })
    }

    /// Send a text frame
    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.stream.send(Message::Text(text.into())).await?;
        Ok(())
    }

    /// Send a binary frame
    pub async fn send_binary(&mut self, data: &[u8]) -> Result<()> {
        self.stream.send(Message::Binary(data.to_vec())).await?;
        Ok(())
    }

    /// Wait for the next data frame, skipping control frames
    ///
    /// Returns `None` when the server closed the connection.
    pub async fn recv(&mut self) -> Result<Option<Message>> {
        tokio::time::timeout(WAIT, async {
            loop {
                match self.stream.next().await {
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(_))) | None => return Ok(None),
                    Some(Ok(message)) => return Ok(Some(message)),
                    Some(Err(e)) => return Err(anyhow::Error::from(e)),
                }
            }
        })
        .await
        .context("timed out waiting for a frame")?
    }

    /// Wait for the next frame and require it to be text
    pub async fn recv_text(&mut self) -> Result<String> {
        match self.recv().await? {
            Some(Message::Text(text)) => Ok(text.to_string()),
            other => anyhow::bail!("expected text frame, got {other:?}"),
        }
    }

    /// Assert that no data frame arrives within `window`
    pub async fn expect_silence(&mut self, window: Duration) -> Result<()> {
        match tokio::time::timeout(window, self.stream.next()).await {
            Err(_) => Ok(()),
            Ok(frame) => anyhow::bail!("expected silence, got {frame:?}"),
        }
    }

    /// Check whether the server closed this connection
    ///
    /// Connection errors count as closed.
    pub async fn is_closed_by_server(&mut self) -> bool {
        matches!(self.recv().await, Ok(None) | Err(_))
    }

    /// Close the connection with a close handshake
    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await?;
        Ok(())
    }
}

/// Create a test configuration
///
/// Uses an in-memory database and a short write deadline.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = "sqlite::memory:".to_string();
    config.hub.send_timeout_ms = 500;
    config
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(
    response: Response,
    expected_status: StatusCode,
) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(response.json().await?)
}

/// Assert response status without parsing body
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(())
}
