//! E2E tests for registration, login, and session handling

mod common;

use common::TestServer;
use serde_json::{Value, json};

#[tokio::test]
async fn test_register_returns_token_and_account() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/api/v1/auth/register"))
        .json(&json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "hunter22",
            "display_name": "Alice",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(body["token"].as_str().unwrap().contains('.'));
    assert_eq!(body["account"]["username"], "alice");
    assert_eq!(body["account"]["average_likes"], 0);
    assert_eq!(body["account"]["followers_count"], 0);
    // The hash must never leak through the API.
    assert!(body["account"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_rejects_duplicate_username() {
    let server = TestServer::new().await;
    server.register("alice").await;

    let response = server
        .client
        .post(server.url("/api/v1/auth/register"))
        .json(&json!({ "username": "alice", "password": "hunter22" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error_type"], "already_exists");
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/api/v1/auth/register"))
        .json(&json!({ "username": "bob", "password": "short" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_login_and_me() {
    let server = TestServer::new().await;
    let (id, _token) = server.register("alice").await;

    let response = server
        .client
        .post(server.url("/api/v1/auth/login"))
        .json(&json!({ "identifier": "alice", "password": "hunter22" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let token = body["token"].as_str().unwrap();

    let me = server
        .client
        .get(server.url("/api/v1/auth/me"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(me.status(), 200);
    let me: Value = me.json().await.unwrap();
    assert_eq!(me["id"], id.as_str());
    assert_eq!(me["username"], "alice");
}

#[tokio::test]
async fn test_login_with_wrong_password_fails() {
    let server = TestServer::new().await;
    server.register("alice").await;

    let response = server
        .client
        .post(server.url("/api/v1/auth/login"))
        .json(&json!({ "identifier": "alice", "password": "wrong-pass" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_me_requires_authentication() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/api/v1/auth/me"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_deleted_account_token_stops_working() {
    let server = TestServer::new().await;
    let (id, token) = server.register("alice").await;

    let response = server
        .client
        .delete(server.url(&format!("/api/v1/users/{}", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let me = server
        .client
        .get(server.url("/api/v1/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(me.status(), 401);
}
