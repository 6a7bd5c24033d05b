//! Login and static file integration tests
//!
//! Run with: cargo test -p integration-tests --test login_tests

use integration_tests::{
    assert_json, assert_status, fixtures::*, test_config, TestServer,
};
use reqwest::StatusCode;

// ============================================================================
// Register Tests
// ============================================================================

#[tokio::test]
async fn test_register() {
    let server = TestServer::start().await.expect("Failed to start server");
    let request = CredentialsRequest::unique();

    let response = server.post("/register", &request).await.unwrap();
    let body: LoginResponse = assert_json(response, StatusCode::CREATED).await.unwrap();

    assert!(body.success);
    assert_eq!(body.message, "Account created");
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let server = TestServer::start().await.unwrap();
    let request = CredentialsRequest::unique();

    server.post("/register", &request).await.unwrap();

    let response = server.post("/register", &request).await.unwrap();
    let body: LoginResponse = assert_json(response, StatusCode::CONFLICT).await.unwrap();
    assert!(!body.success);
}

// ============================================================================
// Login Tests
// ============================================================================

#[tokio::test]
async fn test_login() {
    let server = TestServer::start().await.unwrap();
    let request = CredentialsRequest::unique();
    server.post("/register", &request).await.unwrap();

    let response = server.post("/login", &request).await.unwrap();
    let body: LoginResponse = assert_json(response, StatusCode::OK).await.unwrap();

    assert!(body.success);
    assert_eq!(body.message, "Login successful");
}

#[tokio::test]
async fn test_login_wrong_password() {
    let server = TestServer::start().await.unwrap();
    let request = CredentialsRequest::unique();
    server.post("/register", &request).await.unwrap();

    let response = server
        .post("/login", &request.with_password("WrongPass!"))
        .await
        .unwrap();
    let body: LoginResponse = assert_json(response, StatusCode::UNAUTHORIZED).await.unwrap();

    assert!(!body.success);
    assert_eq!(body.message, "Invalid username or password");
}

#[tokio::test]
async fn test_login_unknown_user_is_not_created() {
    let server = TestServer::start().await.unwrap();
    let request = CredentialsRequest::unique();

    let response = server.post("/login", &request).await.unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();

    // Registering afterwards still works, so nothing was created implicitly
    let response = server.post("/register", &request).await.unwrap();
    assert_status(response, StatusCode::CREATED).await.unwrap();
}

#[tokio::test]
async fn test_login_auto_register() {
    let mut config = test_config();
    config.login.auto_register = true;
    let server = TestServer::start_with_config(config).await.unwrap();
    let request = CredentialsRequest::unique();

    let response = server.post("/login", &request).await.unwrap();
    let body: LoginResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(body.success);
    assert_eq!(body.message, "Account created, login successful");

    let response = server.post("/login", &request).await.unwrap();
    let body: LoginResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body.message, "Login successful");

    let response = server
        .post("/login", &request.with_password("WrongPass!"))
        .await
        .unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();
}

#[tokio::test]
async fn test_login_invalid_payload() {
    let server = TestServer::start().await.unwrap();

    let response = server
        .post_raw("/login", "application/json", "{not json")
        .await
        .unwrap();
    let body: LoginResponse = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert!(!body.success);

    let response = server
        .post("/login", &serde_json::json!({"username": "", "password": "x"}))
        .await
        .unwrap();
    assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();
}

// ============================================================================
// Static File Tests
// ============================================================================

#[tokio::test]
async fn test_static_files_served() {
    let dir = std::env::temp_dir().join(format!("relay-static-{}", unique_suffix()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), "<h1>relay</h1>").unwrap();

    let mut config = test_config();
    config.static_files.dir = dir.to_string_lossy().into_owned();
    let server = TestServer::start_with_config(config).await.unwrap();

    let response = server.get("/index.html").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "<h1>relay</h1>");

    let response = server.get("/").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    std::fs::remove_dir_all(&dir).ok();
}
