//! End-to-end tests driving the full router over the in-memory backend.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use social_api::{create_app, ApiConfig, Dependencies, StorageBackend};
use tower::ServiceExt;

async fn app() -> Router {
    let config = ApiConfig {
        storage: StorageBackend::Memory,
        ..ApiConfig::default()
    };
    let deps = Dependencies::new(&config).await.unwrap();
    create_app(deps.state, &config).unwrap()
}

async fn api(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    let body = match body {
        Some(v) => Body::from(serde_json::to_string(&v).unwrap()),
        None => Body::empty(),
    };
    let req = builder.body(body).unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Registers `username` and returns `(token, user_id)`.
async fn register(router: &Router, username: &str) -> (String, i64) {
    let (status, body) = api(
        router,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "username": username })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_i64().unwrap(),
    )
}

async fn create_post(router: &Router, token: &str, title: &str, body: &str) -> i64 {
    let (status, post) = api(
        router,
        "POST",
        "/posts",
        Some(token),
        Some(json!({ "title": title, "body": body })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{post}");
    post["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let router = app().await;
    let (status, body) = api(&router, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_register_and_authentication_guard() {
    let router = app().await;
    let (token, user_id) = register(&router, "alice").await;

    let (status, body) = api(
        &router,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "username": "alice" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("alice"));

    let (status, body) = api(&router, "GET", "/feed", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["detail"].is_string());

    let (status, _) = api(&router, "GET", "/feed", Some("bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, me) = api(&router, "GET", "/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], user_id);
    assert_eq!(me["followers_count"], 0);

    let (status, body) = api(&router, "POST", "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["revoked"], 1);
    let (status, _) = api(&router, "GET", "/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_follow_and_unfollow() {
    let router = app().await;
    let (alice, alice_id) = register(&router, "alice").await;
    let (_, bob_id) = register(&router, "bob").await;

    let (status, body) = api(&router, "POST", &format!("/follow/{bob_id}"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "You are now following bob.");
    assert_eq!(body["following_count"], 1);
    assert_eq!(body["followers_count"], 1);

    let (status, body) = api(&router, "POST", &format!("/follow/{bob_id}"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "You are already following bob.");

    let (status, body) =
        api(&router, "POST", &format!("/follow/{alice_id}"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "You cannot follow yourself.");

    let (status, _) = api(&router, "POST", "/follow/9999", Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = api(
        &router,
        "GET",
        &format!("/users/{bob_id}/followers"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["username"], "alice");

    let (status, body) =
        api(&router, "POST", &format!("/unfollow/{bob_id}"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "You have unfollowed bob.");
    assert_eq!(body["following_count"], 0);
    assert_eq!(body["followers_count"], 0);

    let (status, _) =
        api(&router, "POST", &format!("/unfollow/{bob_id}"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_feed_lists_followed_posts_newest_first() {
    let router = app().await;
    let (alice, _) = register(&router, "alice").await;
    let (bob, bob_id) = register(&router, "bob").await;
    let (carol, _) = register(&router, "carol").await;

    let (status, body) = api(&router, "GET", "/feed", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["following_count"], 0);
    assert_eq!(body["total"], 0);
    assert_eq!(body["posts"], json!([]));

    let p = create_post(&router, &bob, "P", "first").await;
    let q = create_post(&router, &bob, "Q", "second").await;
    create_post(&router, &carol, "R", "not followed").await;
    api(&router, "POST", &format!("/follow/{bob_id}"), Some(&alice), None).await;

    let (status, body) = api(&router, "GET", "/feed", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["following_count"], 1);
    assert_eq!(body["total"], 2);
    assert_eq!(body["posts"][0]["id"], q);
    assert_eq!(body["posts"][1]["id"], p);

    let (status, body) = api(&router, "GET", "/feed?page=0", Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_like_unlike_and_toggle() {
    let router = app().await;
    let (alice, _) = register(&router, "alice").await;
    let (bob, _) = register(&router, "bob").await;
    let post = create_post(&router, &bob, "P", "body").await;

    let (status, body) =
        api(&router, "POST", &format!("/posts/{post}/unlike"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "You have not liked this post.");

    let (status, body) =
        api(&router, "POST", &format!("/posts/{post}/like"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "liked", "likes_count": 1 }));

    let (status, _) =
        api(&router, "POST", &format!("/posts/{post}/like"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = api(
        &router,
        "POST",
        &format!("/posts/{post}/toggle-like"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "unliked", "likes_count": 0 }));

    let (_, body) = api(&router, "GET", "/notifications/counts", Some(&bob), None).await;
    assert_eq!(body, json!({ "total": 0, "unread": 0 }));

    let (_, body) = api(
        &router,
        "POST",
        &format!("/posts/{post}/toggle-like"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(body["status"], "liked");

    let (status, body) = api(&router, "GET", &format!("/posts/{post}/likes"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["user"]["username"], "alice");

    let (status, _) = api(&router, "POST", "/posts/9999/like", Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_notification_management() {
    let router = app().await;
    let (alice, _) = register(&router, "alice").await;
    let (bob, bob_id) = register(&router, "bob").await;
    let post = create_post(&router, &bob, "P", "body").await;

    api(&router, "POST", &format!("/follow/{bob_id}"), Some(&alice), None).await;
    api(&router, "POST", &format!("/posts/{post}/like"), Some(&alice), None).await;

    let (status, body) = api(&router, "GET", "/notifications", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["results"][0]["verb"], "like");
    assert_eq!(body["results"][0]["message"], "alice liked your post");
    assert_eq!(body["results"][1]["verb"], "follow");
    assert_eq!(body["results"][1]["is_read"], false);
    let like_id = body["results"][0]["id"].as_i64().unwrap();
    let follow_id = body["results"][1]["id"].as_i64().unwrap();

    let (status, body) = api(
        &router,
        "POST",
        "/notifications/mark-read",
        Some(&bob),
        Some(json!({ "ids": [follow_id] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 1);
    assert_eq!(body["read"], true);

    let (_, body) = api(&router, "GET", "/notifications?unread=true", Some(&bob), None).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["id"], like_id);

    let (_, body) = api(&router, "GET", "/notifications/counts", Some(&bob), None).await;
    assert_eq!(body, json!({ "total": 2, "unread": 1 }));

    // Someone else's notification is invisible to alice.
    let (status, _) = api(
        &router,
        "POST",
        &format!("/notifications/{like_id}/toggle-read"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = api(
        &router,
        "POST",
        &format!("/notifications/{like_id}/toggle-read"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_read"], true);
    assert_eq!(body["message"], "Notification marked as read");

    let (status, body) = api(
        &router,
        "POST",
        "/notifications/mark-read",
        Some(&bob),
        Some(json!({ "notification_ids": [like_id, follow_id], "read": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 2);

    let (status, body) =
        api(&router, "POST", "/notifications/mark-all-read", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 2);
    assert_eq!(body["message"], "All 2 notification(s) marked as read");
}

#[tokio::test]
async fn test_posts_are_owner_only_and_filterable() {
    let router = app().await;
    let (alice, alice_id) = register(&router, "alice").await;
    let (bob, _) = register(&router, "bob").await;
    let post = create_post(&router, &alice, "Rust tips", "borrow wisely").await;
    create_post(&router, &bob, "Cooking", "pasta").await;

    let (status, body) = api(
        &router,
        "PATCH",
        &format!("/posts/{post}"),
        Some(&bob),
        Some(json!({ "title": "hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "You do not have permission to modify this post.");

    let (status, _) = api(&router, "DELETE", &format!("/posts/{post}"), Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = api(
        &router,
        "PATCH",
        &format!("/posts/{post}"),
        Some(&alice),
        Some(json!({ "content": "borrow carefully" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["body"], "borrow carefully");
    assert_eq!(body["title"], "Rust tips");

    let (status, body) = api(&router, "GET", "/posts?search=RUST", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["id"], post);

    let (_, body) = api(&router, "GET", &format!("/posts?author={alice_id}"), None, None).await;
    assert_eq!(body["count"], 1);

    let (_, body) = api(&router, "GET", "/posts?ordering=title", None, None).await;
    assert_eq!(body["results"][0]["title"], "Cooking");

    let (status, body) = api(&router, "GET", "/posts?ordering=likes", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("likes"));

    let (status, _) =
        api(&router, "DELETE", &format!("/posts/{post}"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = api(&router, "GET", &format!("/posts/{post}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comments_and_mentions_notify() {
    let router = app().await;
    let (alice, _) = register(&router, "alice").await;
    let (bob, _) = register(&router, "bob").await;
    let (carol, _) = register(&router, "carol").await;
    let post = create_post(&router, &alice, "Hello", "world").await;

    let (status, comment) = api(
        &router,
        "POST",
        &format!("/posts/{post}/comments"),
        Some(&bob),
        Some(json!({ "content": "nice one @carol" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let comment_id = comment["id"].as_i64().unwrap();

    let (_, body) = api(&router, "GET", "/notifications", Some(&alice), None).await;
    assert_eq!(body["results"][0]["verb"], "comment");
    let (_, body) = api(&router, "GET", "/notifications", Some(&carol), None).await;
    assert_eq!(body["results"][0]["verb"], "mention");

    let (status, body) = api(
        &router,
        "GET",
        &format!("/posts/{post}/comments"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, _) = api(
        &router,
        "PATCH",
        &format!("/comments/{comment_id}"),
        Some(&alice),
        Some(json!({ "body": "edited" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = api(
        &router,
        "PATCH",
        &format!("/comments/{comment_id}"),
        Some(&bob),
        Some(json!({ "body": "edited" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["body"], "edited");

    let (status, _) = api(
        &router,
        "DELETE",
        &format!("/comments/{comment_id}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = api(&router, "GET", "/notifications/counts", Some(&alice), None).await;
    assert_eq!(body["total"], 0);
    let (_, body) = api(&router, "GET", "/notifications/counts", Some(&carol), None).await;
    assert_eq!(body["total"], 0);
}
