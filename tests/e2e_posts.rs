//! E2E tests for posts, likes, and comments
//!
//! Posts are seeded directly through the database to keep the tests
//! independent of media storage.

mod common;

use common::TestServer;
use serde_json::{Value, json};

#[tokio::test]
async fn test_get_post_with_likes_and_comments() {
    let server = TestServer::new().await;
    let (alice_id, _) = server.register("alice").await;
    let (_bob_id, bob_token) = server.register("bob").await;
    server.seed_post("p1", &alice_id, "sunset").await;

    server
        .client
        .put(server.url("/api/v1/posts/like/p1"))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    server
        .client
        .post(server.url("/api/v1/posts/comment/p1"))
        .bearer_auth(&bob_token)
        .json(&json!({ "body": "nice shot" }))
        .send()
        .await
        .unwrap();

    let post: Value = server
        .client
        .get(server.url("/api/v1/posts/p1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(post["caption"], "sunset");
    assert_eq!(post["author"]["username"], "alice");
    assert_eq!(post["like_count"], 1);
    assert_eq!(post["comment_count"], 1);
    assert_eq!(post["comments"][0]["body"], "nice shot");
    assert!(
        post["image_url"]
            .as_str()
            .unwrap()
            .starts_with("https://media.test.example.com/")
    );
}

#[tokio::test]
async fn test_like_twice_is_rejected() {
    let server = TestServer::new().await;
    let (alice_id, _) = server.register("alice").await;
    let (_bob_id, bob_token) = server.register("bob").await;
    server.seed_post("p1", &alice_id, "").await;

    let url = server.url("/api/v1/posts/like/p1");
    let first = server
        .client
        .put(&url)
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 204);

    let second = server
        .client
        .put(&url)
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 400);
    let body: Value = second.json().await.unwrap();
    assert_eq!(body["error_type"], "already_liked");
}

#[tokio::test]
async fn test_unlike_without_like_is_rejected() {
    let server = TestServer::new().await;
    let (alice_id, _) = server.register("alice").await;
    let (_bob_id, bob_token) = server.register("bob").await;
    server.seed_post("p1", &alice_id, "").await;

    let response = server
        .client
        .put(server.url("/api/v1/posts/unlike/p1"))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error_type"], "not_liked");
}

#[tokio::test]
async fn test_likes_update_average_likes() {
    let server = TestServer::new().await;
    let (alice_id, _) = server.register("alice").await;
    let (_bob_id, bob_token) = server.register("bob").await;
    server.seed_post("p1", &alice_id, "").await;
    server.seed_post("p2", &alice_id, "").await;

    // One like over two posts: ceil(0.5) = 1.
    server
        .client
        .put(server.url("/api/v1/posts/like/p1"))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();

    let profile: Value = server
        .client
        .get(server.url(&format!("/api/v1/users/{}", alice_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["average_likes"], 1);
}

#[tokio::test]
async fn test_only_owner_or_admin_may_delete_post() {
    let server = TestServer::new().await;
    let (alice_id, alice_token) = server.register("alice").await;
    let (_bob_id, bob_token) = server.register("bob").await;
    server.seed_post("p1", &alice_id, "").await;

    let forbidden = server
        .client
        .delete(server.url("/api/v1/posts/p1"))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status(), 403);

    let deleted = server
        .client
        .delete(server.url("/api/v1/posts/p1"))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), 204);

    let gone = server
        .client
        .get(server.url("/api/v1/posts/p1"))
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status(), 404);
}

#[tokio::test]
async fn test_comment_deletion_rules() {
    let server = TestServer::new().await;
    let (alice_id, alice_token) = server.register("alice").await;
    let (_bob_id, bob_token) = server.register("bob").await;
    let (_carol_id, carol_token) = server.register("carol").await;
    server.seed_post("p1", &alice_id, "").await;

    let comment: Value = server
        .client
        .post(server.url("/api/v1/posts/comment/p1"))
        .bearer_auth(&bob_token)
        .json(&json!({ "body": "hello" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let comment_id = comment["id"].as_str().unwrap();

    // A third party may not delete someone else's comment.
    let url = server.url(&format!("/api/v1/posts/comment/p1/{}", comment_id));
    let forbidden = server
        .client
        .delete(&url)
        .bearer_auth(&carol_token)
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status(), 403);

    // The post owner may.
    let deleted = server
        .client
        .delete(&url)
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), 204);
}

#[tokio::test]
async fn test_empty_comment_is_rejected() {
    let server = TestServer::new().await;
    let (alice_id, alice_token) = server.register("alice").await;
    server.seed_post("p1", &alice_id, "").await;

    let response = server
        .client
        .post(server.url("/api/v1/posts/comment/p1"))
        .bearer_auth(&alice_token)
        .json(&json!({ "body": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_like_unknown_post_is_404() {
    let server = TestServer::new().await;
    let (_alice_id, alice_token) = server.register("alice").await;

    let response = server
        .client
        .put(server.url("/api/v1/posts/like/no-such-post"))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}
