//! Web API Authentication Tests
//!
//! Integration tests for registration, login and role management.

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use common::{bearer, create_test_app, create_test_app_with, create_test_config, login, token_for};
use serde_json::{json, Value};

#[tokio::test]
async fn test_register_success() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/auth/register")
        .json(&json!({
            "username": "alice",
            "password": "password123",
            "role": "student"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["message"], "User registered successfully");
}

#[tokio::test]
async fn test_register_defaults_to_student() {
    let app = create_test_app().await;

    app.server
        .post("/auth/register")
        .json(&json!({
            "username": "bob",
            "password": "password123"
        }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = app
        .server
        .post("/auth/login")
        .json(&json!({"username": "bob", "password": "password123"}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["role"], "student");
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let app = create_test_app().await;
    common::register_user(&app.server, "alice", "password123", "student").await;

    let response = app
        .server
        .post("/auth/register")
        .json(&json!({
            "username": "alice",
            "password": "other",
            "role": "faculty"
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_register_invalid_role() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/auth/register")
        .json(&json!({
            "username": "mallory",
            "password": "password123",
            "role": "superuser"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "Invalid role: superuser");
}

#[tokio::test]
async fn test_register_missing_fields() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/auth/register")
        .json(&json!({"username": "", "password": ""}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_register_malformed_json() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/auth/register")
        .content_type("application/json")
        .text("{not json")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_returns_token_and_role() {
    let app = create_test_app().await;
    common::register_user(&app.server, "prof", "secret", "faculty").await;

    let response = app
        .server
        .post("/auth/login")
        .json(&json!({"username": "prof", "password": "secret"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["role"], "faculty");

    let token = body["token"].as_str().unwrap();
    let payload = token.split('.').nth(1).unwrap();
    let claims: Value = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();
    assert_eq!(claims["username"], "prof");
    assert_eq!(claims["role"], "faculty");
    let ttl = claims["exp"].as_u64().unwrap() - claims["iat"].as_u64().unwrap();
    assert_eq!(ttl, 3600);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = create_test_app().await;
    common::register_user(&app.server, "alice", "password123", "student").await;

    let response = app
        .server
        .post("/auth/login")
        .json(&json!({"username": "alice", "password": "wrong"}))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "Invalid username or password");
}

#[tokio::test]
async fn test_login_unknown_user() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/auth/login")
        .json(&json!({"username": "nobody", "password": "password123"}))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "Invalid username or password");
}

#[tokio::test]
async fn test_login_rate_limited() {
    let mut config = create_test_config();
    config.login_rate_limit = 2;
    let app = create_test_app_with(config).await;

    for _ in 0..2 {
        app.server
            .post("/auth/login")
            .json(&json!({"username": "nobody", "password": "x"}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    let response = app
        .server
        .post("/auth/login")
        .json(&json!({"username": "nobody", "password": "x"}))
        .await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "TOO_MANY_REQUESTS");
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = create_test_app().await;

    let response = app.server.get("/auth/users").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = app
        .server
        .get("/auth/users")
        .add_header(AUTHORIZATION, "Bearer not-a-token".to_string())
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_users_admin_only() {
    let app = create_test_app().await;
    let admin = token_for(&app.server, "root", "admin").await;
    let student = token_for(&app.server, "alice", "student").await;

    let response = app
        .server
        .get("/auth/users")
        .add_header(AUTHORIZATION, bearer(&student))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = app
        .server
        .get("/auth/users")
        .add_header(AUTHORIZATION, bearer(&admin))
        .await;
    response.assert_status_ok();
    let users: Vec<Value> = response.json();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("password").is_none()));
    assert!(users.iter().all(|u| u.get("password_hash").is_none()));
    assert!(users
        .iter()
        .any(|u| u["username"] == "alice" && u["role"] == "student"));
}

#[tokio::test]
async fn test_update_role() {
    let app = create_test_app().await;
    let admin = token_for(&app.server, "root", "admin").await;
    common::register_user(&app.server, "alice", "password123", "student").await;

    let users: Vec<Value> = app
        .server
        .get("/auth/users")
        .add_header(AUTHORIZATION, bearer(&admin))
        .await
        .json();
    let alice_id = users
        .iter()
        .find(|u| u["username"] == "alice")
        .and_then(|u| u["id"].as_i64())
        .unwrap();

    let response = app
        .server
        .put(&format!("/auth/update-role/{}", alice_id))
        .add_header(AUTHORIZATION, bearer(&admin))
        .json(&json!({"role": "faculty"}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["role"], "faculty");

    // New logins carry the new role
    let response = app
        .server
        .post("/auth/login")
        .json(&json!({"username": "alice", "password": "password123"}))
        .await;
    let body: Value = response.json();
    assert_eq!(body["role"], "faculty");
}

#[tokio::test]
async fn test_update_role_invalid_role() {
    let app = create_test_app().await;
    let admin = token_for(&app.server, "root", "admin").await;

    let response = app
        .server
        .put("/auth/update-role/1")
        .add_header(AUTHORIZATION, bearer(&admin))
        .json(&json!({"role": "overlord"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_role_unknown_user() {
    let app = create_test_app().await;
    let admin = token_for(&app.server, "root", "admin").await;

    let response = app
        .server
        .put("/auth/update-role/9999")
        .add_header(AUTHORIZATION, bearer(&admin))
        .json(&json!({"role": "faculty"}))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "User not found");
}

#[tokio::test]
async fn test_update_role_requires_admin() {
    let app = create_test_app().await;
    let faculty = token_for(&app.server, "prof", "faculty").await;

    let response = app
        .server
        .put("/auth/update-role/1")
        .add_header(AUTHORIZATION, bearer(&faculty))
        .json(&json!({"role": "admin"}))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_login_after_register_roundtrip() {
    let app = create_test_app().await;
    common::register_user(&app.server, "carol", "pw", "admin").await;
    let token = login(&app.server, "carol", "pw").await;
    assert_eq!(token.split('.').count(), 3);
}
