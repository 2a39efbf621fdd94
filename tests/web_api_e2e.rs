//! Web API End-to-End Tests
//!
//! Walks through a full session against the router: accounts, roles and
//! the lifecycle of one resource.

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use common::{bearer, create_test_app, login, register_user, upload_form, upload_resource, url_path};
use serde_json::{json, Value};

#[tokio::test]
async fn test_student_and_admin_session() {
    let app = create_test_app().await;
    let server = &app.server;

    // Student signs up and logs in
    register_user(server, "alice", "wonderland", "student").await;
    let response = server
        .post("/auth/login")
        .json(&json!({"username": "alice", "password": "wonderland"}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["role"], "student");
    let alice = body["token"].as_str().unwrap().to_string();

    // Anonymous lookups of the upload path are rejected
    server
        .get("/resources/upload")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    // Admin uploads an exam paper
    register_user(server, "dean", "s3cret", "admin").await;
    let admin = login(server, "dean", "s3cret").await;
    let created = upload_resource(
        server,
        &admin,
        upload_form("Midterm 2023", "2023", "CS101", "midterm"),
    )
    .await;
    let id = created["resource"]["id"].as_i64().unwrap();
    let file_url = created["fileUrl"].as_str().unwrap().to_string();

    // The student can see and download it
    let response = server
        .get("/resources")
        .add_header(AUTHORIZATION, bearer(&alice))
        .await;
    response.assert_status_ok();
    let resources: Vec<Value> = response.json();
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0]["title"], "Midterm 2023");

    server.get(&url_path(&file_url)).await.assert_status_ok();

    // The student cannot delete it
    server
        .delete(&format!("/resources/{}", id))
        .add_header(AUTHORIZATION, bearer(&alice))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    // The admin can
    server
        .delete(&format!("/resources/{}", id))
        .add_header(AUTHORIZATION, bearer(&admin))
        .await
        .assert_status_ok();

    let response = server
        .get(&format!("/resources/{}", id))
        .add_header(AUTHORIZATION, bearer(&alice))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "Resource not found");

    server
        .get(&url_path(&file_url))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_promoted_user_can_upload() {
    let app = create_test_app().await;
    let server = &app.server;

    register_user(server, "dean", "s3cret", "admin").await;
    let admin = login(server, "dean", "s3cret").await;
    register_user(server, "ta", "helper", "student").await;
    let before = login(server, "ta", "helper").await;

    server
        .post("/resources/upload")
        .add_header(AUTHORIZATION, bearer(&before))
        .multipart(upload_form("Lab", "2024", "EE150", "lab"))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let users: Vec<Value> = server
        .get("/auth/users")
        .add_header(AUTHORIZATION, bearer(&admin))
        .await
        .json();
    let ta_id = users
        .iter()
        .find(|u| u["username"] == "ta")
        .and_then(|u| u["id"].as_i64())
        .unwrap();

    server
        .put(&format!("/auth/update-role/{}", ta_id))
        .add_header(AUTHORIZATION, bearer(&admin))
        .json(&json!({"role": "faculty"}))
        .await
        .assert_status_ok();

    // Roles travel in the token, so a fresh login is needed
    let after = login(server, "ta", "helper").await;
    upload_resource(server, &after, upload_form("Lab", "2024", "EE150", "lab")).await;
}
