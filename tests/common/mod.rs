//! Shared helpers for web API integration tests.

#![allow(dead_code)]

use academia::auth::TokenIssuer;
use academia::config::WebConfig;
use academia::storage::LocalObjectStore;
use academia::web::handlers::AppState;
use academia::web::middleware::RateLimitState;
use academia::web::router::create_router;
use academia::{Database, DatabaseProvider};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

pub const JWT_SECRET: &str = "test-secret-key-for-testing-only";
pub const BASE_URL: &str = "http://localhost";
pub const MAX_UPLOAD_SIZE: u64 = 1024 * 1024;

/// Minimal bytes that pass as a PDF upload.
pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n%test document\n%%EOF\n";

/// A running test application.
///
/// The temporary file directory lives as long as this value.
pub struct TestApp {
    pub server: TestServer,
    pub db: Arc<DatabaseProvider>,
    pub files: TempDir,
}

/// Create a test configuration.
pub fn create_test_config() -> WebConfig {
    WebConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        jwt_secret: JWT_SECRET.to_string(),
        login_rate_limit: 100,
        api_rate_limit: 10_000,
        public_base_url: Some(BASE_URL.to_string()),
        ..Default::default()
    }
}

/// Create a test server with an in-memory database and a temporary file store.
pub async fn create_test_app() -> TestApp {
    create_test_app_with(create_test_config()).await
}

/// Create a test server with a custom web configuration.
pub async fn create_test_app_with(config: WebConfig) -> TestApp {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let db = Arc::new(DatabaseProvider::from_database(db));

    let files = tempfile::tempdir().expect("Failed to create temp dir");
    let store = LocalObjectStore::new(files.path(), config.public_base_url())
        .expect("Failed to create object store");

    let tokens = Arc::new(TokenIssuer::new(&config.jwt_secret, config.jwt_expiry_secs));
    let app_state = AppState::new(db.clone(), Arc::new(store), tokens)
        .with_max_upload_size(MAX_UPLOAD_SIZE);

    let rate_limits = Arc::new(RateLimitState::new(
        config.login_rate_limit,
        config.api_rate_limit,
    ));
    let router = create_router(Arc::new(app_state), rate_limits, &config);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp { server, db, files }
}

/// Register a user with the given role.
pub async fn register_user(server: &TestServer, username: &str, password: &str, role: &str) {
    server
        .post("/auth/register")
        .json(&json!({
            "username": username,
            "password": password,
            "role": role,
        }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);
}

/// Log in and return the token.
pub async fn login(server: &TestServer, username: &str, password: &str) -> String {
    let response = server
        .post("/auth/login")
        .json(&json!({
            "username": username,
            "password": password,
        }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    body["token"]
        .as_str()
        .expect("login response has a token")
        .to_string()
}

/// Register a user with the given role and return a token for it.
pub async fn token_for(server: &TestServer, username: &str, role: &str) -> String {
    register_user(server, username, "password123", role).await;
    login(server, username, "password123").await
}

/// Authorization header value for a token.
pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// A PDF file part.
pub fn pdf_part(file_name: &str, bytes: &[u8]) -> Part {
    Part::bytes(bytes.to_vec())
        .file_name(file_name.to_string())
        .mime_type("application/pdf")
}

/// A complete upload form.
pub fn upload_form(title: &str, year: &str, subject_code: &str, exam_type: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("title", title.to_string())
        .add_text("year", year.to_string())
        .add_text("subjectCode", subject_code.to_string())
        .add_text("examType", exam_type.to_string())
        .add_part("file", pdf_part("exam.pdf", PDF_BYTES))
}

/// Path component of a retrieval URL, for requesting it from the test server.
pub fn url_path(file_url: &str) -> String {
    file_url
        .strip_prefix(BASE_URL)
        .unwrap_or(file_url)
        .to_string()
}

/// Upload a resource as the given user and return the response body.
pub async fn upload_resource(server: &TestServer, token: &str, form: MultipartForm) -> Value {
    let response = server
        .post("/resources/upload")
        .add_header(axum::http::header::AUTHORIZATION, bearer(token))
        .multipart(form)
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json()
}
