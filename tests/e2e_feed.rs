//! E2E tests for the home feed and the global feed

mod common;

use common::TestServer;
use serde_json::Value;

#[tokio::test]
async fn test_home_feed_includes_followed_and_self() {
    let server = TestServer::new().await;
    let (alice_id, alice_token) = server.register("alice").await;
    let (bob_id, _) = server.register("bob").await;
    let (carol_id, _) = server.register("carol").await;

    server
        .client
        .put(server.url(&format!("/api/v1/users/follow/{}", bob_id)))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();

    server.seed_post("own", &alice_id, "mine").await;
    server.seed_post("bobs", &bob_id, "from bob").await;
    server.seed_post("carols", &carol_id, "not followed").await;

    let feed: Value = server
        .client
        .get(server.url("/api/v1/posts/feed"))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let ids: Vec<&str> = feed
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    // Newest-first; carol's post is excluded.
    assert_eq!(ids, vec!["bobs", "own"]);
    assert_eq!(feed[0]["author"]["username"], "bob");
}

#[tokio::test]
async fn test_home_feed_requires_authentication() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/api/v1/posts/feed"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_unfollow_removes_posts_from_feed() {
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
    server.seed_post("bobs", &bob_id, "").await;

    server
        .client
        .put(server.url(&format!("/api/v1/users/unfollow/{}", bob_id)))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();

    let feed: Value = server
        .client
        .get(server.url("/api/v1/posts/feed"))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(feed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_global_feed_is_public_and_paginated() {
    let server = TestServer::new().await;
    let (alice_id, _) = server.register("alice").await;

    for id in ["p1", "p2", "p3"] {
        server.seed_post(id, &alice_id, "").await;
        // Distinct timestamps so the ordering is unambiguous.
        tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
    }

    let page1: Value = server
        .client
        .get(server.url("/api/v1/posts?limit=2&offset=0"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let page2: Value = server
        .client
        .get(server.url("/api/v1/posts?limit=2&offset=2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let ids1: Vec<&str> = page1
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    let ids2: Vec<&str> = page2
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();

    assert_eq!(ids1, vec!["p3", "p2"]);
    assert_eq!(ids2, vec!["p1"]);
}
