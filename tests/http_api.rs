//! Routes exercised end to end against the in-memory store.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use forum_engine::{AppState, config::Config, create_app, store::MemoryStore};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

fn app() -> Router {
    let config = Config {
        database_url: "postgres://unused".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        allowed_origins: vec!["http://localhost:5173".to_string()],
        database_max_connections: 1,
        thread_page_size: 10,
        max_thread_depth: 64,
    };

    create_app(AppState {
        store: Arc::new(MemoryStore::new()),
        config: Arc::new(config),
    })
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<Uuid>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(user_id) = user {
        request = request
            .header("x-user-id", user_id.to_string())
            .header("x-username", "tester");
    }

    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, body)
}

async fn seed_post(app: &Router, user: Uuid) -> String {
    let (status, community) = send(
        app,
        Method::POST,
        "/api/communities",
        Some(user),
        Some(json!({ "name": "axum_users", "description": "Routers and extractors" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, created) = send(
        app,
        Method::POST,
        "/api/posts",
        Some(user),
        Some(json!({
            "title": "Extractor ordering",
            "content": "Json goes last",
            "post_type": "TEXT",
            "community_id": community["id"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    created["post_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn vote_round_trip_over_http() {
    let app = app();
    let user = Uuid::new_v4();
    let post_id = seed_post(&app, user).await;
    let uri = format!("/api/posts/{post_id}/vote");

    let (status, outcome) =
        send(&app, Method::POST, &uri, Some(user), Some(json!({ "vote_type": 1 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["score"], 1);
    assert_eq!(outcome["user_vote"], "UPVOTE");

    let (status, outcome) =
        send(&app, Method::POST, &uri, Some(user), Some(json!({ "vote_type": 1 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["score"], 0);
    assert_eq!(outcome["user_vote"], Value::Null);

    let (status, body) =
        send(&app, Method::POST, &uri, Some(user), Some(json!({ "vote_type": 3 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn comment_thread_over_http() {
    let app = app();
    let user = Uuid::new_v4();
    let post_id = seed_post(&app, user).await;

    let (status, root) = send(
        &app,
        Method::POST,
        "/api/comments",
        Some(user),
        Some(json!({ "content": "root", "post_id": post_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/comments",
        Some(user),
        Some(json!({ "content": "reply", "post_id": post_id, "parent_id": root["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let root_uri = format!("/api/comments/{}", root["id"].as_str().unwrap());
    let (status, _) = send(&app, Method::DELETE, &root_uri, Some(user), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, thread) = send(
        &app,
        Method::GET,
        &format!("/api/posts/{post_id}/comments?sort=top&limit=5"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let comments = thread["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["visibility"], "redacted");
    assert_eq!(comments[0]["children"][0]["content"], "reply");
}

#[tokio::test]
async fn writes_require_an_identity() {
    let app = app();
    let post_id = seed_post(&app, Uuid::new_v4()).await;

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/posts/{post_id}/vote"),
        None,
        Some(json!({ "vote_type": 1 })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_post_is_not_found() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/posts/{}", Uuid::new_v4()),
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn membership_routes() {
    let app = app();
    let owner = Uuid::new_v4();
    let member = Uuid::new_v4();

    let (status, community) = send(
        &app,
        Method::POST,
        "/api/communities",
        Some(owner),
        Some(json!({ "name": "moderated" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let community_id = community["id"].as_str().unwrap().to_string();

    let (status, found) = send(&app, Method::GET, "/api/communities/name/moderated", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["id"], community["id"]);

    let join = format!("/api/communities/{community_id}/join");
    let (status, membership) = send(&app, Method::POST, &join, Some(member), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(membership["role"], "MEMBER");

    let (status, _) = send(&app, Method::POST, &join, Some(member), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let grant = format!("/api/communities/{community_id}/members/{member}");
    let body = json!({ "role": "MODERATOR" });
    let (status, _) = send(&app, Method::PUT, &grant, Some(member), Some(body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, membership) = send(&app, Method::PUT, &grant, Some(owner), Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(membership["role"], "MODERATOR");
}
