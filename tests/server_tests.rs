#![cfg(feature = "server")]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use trip_planner_rs::{server, ItineraryGenerator, SessionStore, TripPlanner};

#[derive(Debug)]
struct FixedGenerator;

#[async_trait]
impl ItineraryGenerator for FixedGenerator {
    async fn generate(&self, _system: &str, _user: &str) -> trip_planner_rs::Result<String> {
        Ok("**Day 1**\n- 09:00 AM - Arrive".to_string())
    }
}

fn app(store: SessionStore) -> Router {
    server::router(Arc::new(TripPlanner::new(FixedGenerator)), store)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn chat(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_chat_assigns_conversation_id() {
    let store = SessionStore::new();
    let (status, body) = send(app(store.clone()), chat(json!({"message": "Boston"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body["conversation_id"].as_str().unwrap().is_empty());
    assert_eq!(body["stage"], "city");
    assert_eq!(body["status"], "accepted");
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_full_conversation_over_http() {
    let store = SessionStore::new();
    let mut last = Value::Null;

    for message in ["Boston", "Lisbon", "4", "mid-range", "food, history"] {
        let (status, body) = send(
            app(store.clone()),
            chat(json!({"conversation_id": "trip-1", "message": message})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        last = body;
    }

    assert_eq!(last["conversation_id"], "trip-1");
    assert_eq!(last["stage"], "complete");
    assert_eq!(last["status"], "completed");
    assert!(last["reply"].as_str().unwrap().contains("itinerary"));

    let request = Request::builder()
        .uri("/api/conversations/trip-1")
        .body(Body::empty())
        .unwrap();
    let (status, session) = send(app(store.clone()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["city"], "Lisbon");
    assert_eq!(session["trip_duration_days"], 4);
    assert_eq!(session["interests"], json!(["food", "history"]));
    assert_eq!(session["transcript"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_unknown_conversation_is_404() {
    let request = Request::builder()
        .uri("/api/conversations/missing")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(SessionStore::new()), request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "CONVERSATION_NOT_FOUND");
    assert_eq!(body["error"]["retryable"], false);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("missing"));
}

#[tokio::test]
async fn test_anonymous_chats_are_bounded() {
    let store = SessionStore::new().with_max_conversations(10);

    for _ in 0..1000 {
        let (status, _) = send(app(store.clone()), chat(json!({"message": "hi"}))).await;
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(store.len(), 10);
}

#[tokio::test]
async fn test_delete_conversation() {
    let store = SessionStore::new();
    send(
        app(store.clone()),
        chat(json!({"conversation_id": "gone", "message": "Boston"})),
    )
    .await;

    let delete = || {
        Request::builder()
            .method("DELETE")
            .uri("/api/conversations/gone")
            .body(Body::empty())
            .unwrap()
    };

    let (status, _) = send(app(store.clone()), delete()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(store.is_empty());

    let (status, _) = send(app(store.clone()), delete()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(SessionStore::new()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["conversations"], 0);
}
