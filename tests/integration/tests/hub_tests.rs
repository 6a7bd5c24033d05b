//! WebSocket hub integration tests
//!
//! Each test starts its own server on a random port with an in-memory
//! database, then drives it with real WebSocket clients.
//!
//! Run with: cargo test -p integration-tests --test hub_tests

use std::time::Duration;

use integration_tests::{assert_status, test_config, TestServer};
use relay_common::Environment;
use reqwest::StatusCode;
use tokio_tungstenite::tungstenite::{self, Message};

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health").await.expect("Request failed");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "OK");
}

// ============================================================================
// Broadcast Tests
// ============================================================================

#[tokio::test]
async fn test_broadcast_reaches_every_connection() {
    let server = TestServer::start().await.unwrap();
    let mut clients = server.connect_many(3).await.unwrap();

    clients[0].send_text("hello").await.unwrap();

    for client in &mut clients {
        assert_eq!(client.recv_text().await.unwrap(), "hello");
    }
}

#[tokio::test]
async fn test_severed_connection_leaves_registry() {
    let server = TestServer::start().await.unwrap();
    let mut clients = server.connect_many(3).await.unwrap();
    let mut c = clients.pop().unwrap();
    let b = clients.pop().unwrap();
    let mut a = clients.pop().unwrap();

    a.send_text("hello").await.unwrap();
    assert_eq!(a.recv_text().await.unwrap(), "hello");
    assert_eq!(c.recv_text().await.unwrap(), "hello");

    // Sever B without a close handshake
    drop(b);

    a.send_text("world").await.unwrap();
    assert_eq!(a.recv_text().await.unwrap(), "world");
    assert_eq!(c.recv_text().await.unwrap(), "world");

    server.wait_for_connections(2).await.unwrap();
    assert_eq!(server.hub().connection_count(), 2);
}

#[tokio::test]
async fn test_clean_close_deregisters() {
    let server = TestServer::start().await.unwrap();
    let mut clients = server.connect_many(2).await.unwrap();

    clients.pop().unwrap().close().await.unwrap();
    server.wait_for_connections(1).await.unwrap();

    clients[0].send_text("still here").await.unwrap();
    assert_eq!(clients[0].recv_text().await.unwrap(), "still here");
}

#[tokio::test]
async fn test_binary_frames_pass_through() {
    let server = TestServer::start().await.unwrap();
    let mut clients = server.connect_many(2).await.unwrap();

    clients[0].send_binary(&[0xde, 0xad, 0xbe, 0xef]).await.unwrap();

    match clients[1].recv().await.unwrap() {
        Some(Message::Binary(data)) => assert_eq!(data.to_vec(), vec![0xde, 0xad, 0xbe, 0xef]),
        other => panic!("expected binary frame, got {other:?}"),
    }
}

#[tokio::test]
async fn test_order_preserved_per_sender() {
    let server = TestServer::start().await.unwrap();
    let mut clients = server.connect_many(2).await.unwrap();

    for i in 0..50 {
        clients[0].send_text(&format!("m{i}")).await.unwrap();
    }

    for i in 0..50 {
        assert_eq!(clients[1].recv_text().await.unwrap(), format!("m{i}"));
    }
}

#[tokio::test]
async fn test_exclude_sender_policy() {
    let mut config = test_config();
    config.hub.echo_to_sender = false;
    let server = TestServer::start_with_config(config).await.unwrap();
    let mut clients = server.connect_many(2).await.unwrap();

    clients[0].send_text("not for me").await.unwrap();

    assert_eq!(clients[1].recv_text().await.unwrap(), "not for me");
    clients[0]
        .expect_silence(Duration::from_millis(200))
        .await
        .unwrap();
}

// ============================================================================
// Upgrade Refusal Tests
// ============================================================================

#[tokio::test]
async fn test_plain_get_is_not_upgraded() {
    let server = TestServer::start().await.unwrap();
    let response = server.get("/ws").await.unwrap();

    assert!(response.status().is_client_error());
    assert_eq!(server.hub().connection_count(), 0);
}

#[tokio::test]
async fn test_capacity_limit_refuses_upgrade() {
    let mut config = test_config();
    config.hub.max_connections = 1;
    let server = TestServer::start_with_config(config).await.unwrap();
    let _first = server.connect_many(1).await.unwrap();

    let refused = server.connect().await.unwrap_err();
    let status = match refused.downcast_ref::<tungstenite::Error>() {
        Some(tungstenite::Error::Http(response)) => response.status(),
        other => panic!("expected HTTP rejection, got {other:?}"),
    };

    assert_eq!(status.as_u16(), 503);
    assert_eq!(server.hub().connection_count(), 1);
}

#[tokio::test]
async fn test_origin_allow_list() {
    let mut config = test_config();
    config.cors.allowed_origins = vec!["http://localhost:3000".to_string()];
    let server = TestServer::start_with_config(config).await.unwrap();

    let refused = server
        .connect_with_origin("http://evil.example")
        .await
        .unwrap_err();
    match refused.downcast_ref::<tungstenite::Error>() {
        Some(tungstenite::Error::Http(response)) => assert_eq!(response.status().as_u16(), 403),
        other => panic!("expected HTTP rejection, got {other:?}"),
    }

    let mut allowed = server
        .connect_with_origin("http://localhost:3000")
        .await
        .unwrap();
    server.wait_for_connections(1).await.unwrap();

    allowed.send_text("hi").await.unwrap();
    assert_eq!(allowed.recv_text().await.unwrap(), "hi");
}

#[tokio::test]
async fn test_production_without_allow_list_is_same_origin() {
    let mut config = test_config();
    config.app.env = Environment::Production;
    let server = TestServer::start_with_config(config).await.unwrap();

    let refused = server
        .connect_with_origin("http://evil.example")
        .await
        .unwrap_err();
    match refused.downcast_ref::<tungstenite::Error>() {
        Some(tungstenite::Error::Http(response)) => assert_eq!(response.status().as_u16(), 403),
        other => panic!("expected HTTP rejection, got {other:?}"),
    }

    let own_origin = server.base_url();
    let mut same_origin = server.connect_with_origin(&own_origin).await.unwrap();
    let mut no_origin = server.connect().await.unwrap();
    server.wait_for_connections(2).await.unwrap();

    same_origin.send_text("hi").await.unwrap();
    assert_eq!(same_origin.recv_text().await.unwrap(), "hi");
    assert_eq!(no_origin.recv_text().await.unwrap(), "hi");
}

// ============================================================================
// Shutdown Tests
// ============================================================================

#[tokio::test]
async fn test_shutdown_closes_connections() {
    let mut server = TestServer::start().await.unwrap();
    let mut clients = server.connect_many(2).await.unwrap();

    server.shutdown().await.unwrap();

    assert_eq!(server.hub().connection_count(), 0);
    for client in &mut clients {
        assert!(client.is_closed_by_server().await);
    }
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let server = TestServer::start().await.unwrap();
    let response = server.get("/definitely-missing.js").await.unwrap();
    assert_status(response, StatusCode::NOT_FOUND).await.unwrap();
}
