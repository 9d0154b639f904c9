//! E2E tests for the follow graph and reconciliation

mod common;

use common::TestServer;
use serde_json::Value;

#[tokio::test]
async fn test_follow_and_list_followers() {
    let server = TestServer::new().await;
    let (alice_id, alice_token) = server.register("alice").await;
    let (bob_id, _bob_token) = server.register("bob").await;

    let response = server
        .client
        .put(server.url(&format!("/api/v1/users/follow/{}", bob_id)))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let followers: Value = server
        .client
        .get(server.url(&format!("/api/v1/users/followers/{}", bob_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(followers[0]["id"], alice_id.as_str());

    let following: Value = server
        .client
        .get(server.url(&format!("/api/v1/users/following/{}", alice_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(following[0]["username"], "bob");
}

#[tokio::test]
async fn test_follow_twice_conflicts() {
    let server = TestServer::new().await;
    let (_alice_id, alice_token) = server.register("alice").await;
    let (bob_id, _) = server.register("bob").await;

    let url = server.url(&format!("/api/v1/users/follow/{}", bob_id));
    let first = server
        .client
        .put(&url)
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 204);

    let second = server
        .client
        .put(&url)
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 409);
}

#[tokio::test]
async fn test_self_follow_is_invalid() {
    let server = TestServer::new().await;
    let (alice_id, alice_token) = server.register("alice").await;

    let response = server
        .client
        .put(server.url(&format!("/api/v1/users/follow/{}", alice_id)))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_follow_unknown_account_is_404() {
    let server = TestServer::new().await;
    let (_alice_id, alice_token) = server.register("alice").await;

    let response = server
        .client
        .put(server.url("/api/v1/users/follow/no-such-account"))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_unfollow_without_edge_is_rejected() {
    let server = TestServer::new().await;
    let (_alice_id, alice_token) = server.register("alice").await;
    let (bob_id, _) = server.register("bob").await;

    let response = server
        .client
        .put(server.url(&format!("/api/v1/users/unfollow/{}", bob_id)))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error_type"], "not_following");
}

#[tokio::test]
async fn test_unfollow_removes_edge() {
    let server = TestServer::new().await;
    let (_alice_id, alice_token) = server.register("alice").await;
    let (bob_id, _) = server.register("bob").await;

    server
        .client
        .put(server.url(&format!("/api/v1/users/follow/{}", bob_id)))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();

    let response = server
        .client
        .put(server.url(&format!("/api/v1/users/unfollow/{}", bob_id)))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let followers: Value = server
        .client
        .get(server.url(&format!("/api/v1/users/followers/{}", bob_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(followers.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_reconcile_requires_admin() {
    let server = TestServer::new().await;
    let (_alice_id, alice_token) = server.register("alice").await;

    let response = server
        .client
        .post(server.url("/api/v1/users/reconcile"))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_reconcile_repairs_asymmetric_edges() {
    let server = TestServer::new().await;
    let (alice_id, _) = server.register("alice").await;
    let (bob_id, _) = server.register("bob").await;
    let (admin_id, admin_token) = server.register("admin").await;
    server.make_admin(&admin_id).await;

    // Simulate a crash between the two follow writes.
    server
        .state
        .db
        .insert_following_edge(&alice_id, &bob_id, chrono::Utc::now())
        .await
        .unwrap();

    let response = server
        .client
        .post(server.url("/api/v1/users/reconcile"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let report: Value = response.json().await.unwrap();
    assert_eq!(report["follower_rows_added"], 1);
    assert_eq!(report["follower_rows_removed"], 0);

    let followers: Value = server
        .client
        .get(server.url(&format!("/api/v1/users/followers/{}", bob_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(followers[0]["id"], alice_id.as_str());
}
