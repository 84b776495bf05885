// Router tests driven through tower's oneshot, no sockets involved

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use bhai_ki_advice_lib::advice::AdviceHandler;
use bhai_ki_advice_lib::feed::{FeedStore, FileFeedStore};
use bhai_ki_advice_lib::generation::TextGenerator;
use bhai_ki_advice_lib::server::{build_router, ServerAppState};
use bhai_ki_advice_lib::shutdown::ShutdownState;
use bhai_ki_advice_lib::{AdviceRecord, NewAdvice};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct FixedGenerator {
    ready: Result<(), String>,
    reply: Result<String, String>,
}

#[async_trait]
impl TextGenerator for FixedGenerator {
    fn model(&self) -> &str {
        "fixed"
    }

    fn check_ready(&self) -> Result<(), String> {
        self.ready.clone()
    }

    async fn generate(&self, _prompt: &str) -> Result<String, String> {
        self.reply.clone()
    }
}

fn app_with(generator: FixedGenerator) -> (Router, Arc<FileFeedStore>) {
    let feed = Arc::new(FileFeedStore::in_memory());
    let state = ServerAppState::new(
        AdviceHandler::new(Arc::new(generator)),
        feed.clone(),
        ShutdownState::new(),
    );
    (build_router(state, &[]), feed)
}

fn app() -> (Router, Arc<FileFeedStore>) {
    app_with(FixedGenerator {
        ready: Ok(()),
        reply: Ok("  bhai seedha bol de  ".to_string()),
    })
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_generate_advice_success() {
    let (app, _) = app();
    let (status, body) = send(
        app,
        post_json("/generate-advice", r#"{"problem": "mera dost paisa nahi de raha"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "advice": "bhai seedha bol de" }));
}

#[tokio::test]
async fn test_generate_advice_is_also_under_api() {
    let (app, _) = app();
    let (status, _) = send(app, post_json("/api/generate-advice", r#"{"problem": "x"}"#)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_or_blank_problem_is_400() {
    for body in [r#"{}"#, r#"{"problem": ""}"#, r#"{"problem": "   "}"#, r#"{"problem": null}"#] {
        let (app, _) = app();
        let (status, response) = send(app, post_json("/generate-advice", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {}", body);
        assert_eq!(response, json!({ "error": "Problem statement is required" }));
    }
}

#[tokio::test]
async fn test_unparseable_body_is_processing_failure() {
    for body in ["not json", r#"{"problem": 42}"#] {
        let (app, _) = app();
        let (status, response) = send(app, post_json("/generate-advice", body)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response["error"], "Failed to process request");
        assert!(response["details"].is_string());
    }
}

#[tokio::test]
async fn test_failure_kinds_map_to_distinct_errors() {
    let cases = [
        (
            FixedGenerator {
                ready: Err("missing key".to_string()),
                reply: Ok("unused".to_string()),
            },
            "AI service initialization failed",
        ),
        (
            FixedGenerator {
                ready: Ok(()),
                reply: Ok("   ".to_string()),
            },
            "Empty response from AI",
        ),
        (
            FixedGenerator {
                ready: Ok(()),
                reply: Err("quota exceeded".to_string()),
            },
            "Failed to generate advice",
        ),
    ];

    for (generator, expected) in cases {
        let (app, _) = app_with(generator);
        let (status, body) = send(app, post_json("/generate-advice", r#"{"problem": "p"}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], expected);
        assert!(body["details"].is_string());
    }
}

#[tokio::test]
async fn test_create_list_and_vote() {
    let (app, feed) = app();

    let (status, created) = send(
        app.clone(),
        post_json("/api/advices", r#"{"problem": "p1", "advice": "a1", "vibeLevel": 2}"#),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let first = created["id"].as_str().unwrap().to_string();

    let second = feed.append(NewAdvice::new("p2", "a2")).await.unwrap();

    let (status, voted) = send(app.clone(), post_json(&format!("/api/advices/{}/vote", first), "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(voted, json!({ "votes": 1 }));

    let (_, latest) = send(app.clone(), get("/api/advices")).await;
    let latest: Vec<AdviceRecord> = serde_json::from_value(latest).unwrap();
    assert_eq!(latest[0].id, second);

    let (_, popular) = send(app.clone(), get("/api/advices?order=popular")).await;
    let popular: Vec<AdviceRecord> = serde_json::from_value(popular).unwrap();
    assert_eq!(popular[0].id, first);
    assert_eq!(popular[0].vibe_level.value(), 2);

    let (status, record) = send(app, get(&format!("/api/advices/{}", first))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["votes"], 1);
    assert_eq!(record["vibeLevel"], 2);
}

#[tokio::test]
async fn test_unknown_advice_is_404() {
    let (app, _) = app();
    let (status, body) = send(app.clone(), post_json("/api/advices/nope/vote", "")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Advice not found");

    let (status, _) = send(app, get("/api/advices/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_records_are_400() {
    for body in [
        r#"{"problem": "p"}"#,
        r#"{"problem": " ", "advice": "a"}"#,
        r#"{"problem": "p", "advice": "a", "vibeLevel": 0}"#,
    ] {
        let (app, feed) = app();
        let (status, response) = send(app, post_json("/api/advices", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {}", body);
        assert_eq!(response["error"], "Invalid advice record");
        assert!(feed.is_empty());
    }
}

#[tokio::test]
async fn test_unknown_order_is_400() {
    let (app, _) = app();
    let (status, body) = send(app, get("/api/advices?order=random")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid feed order");
}

#[tokio::test]
async fn test_health_and_version() {
    let (app, _) = app();
    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");

    let (status, version) = send(app, get("/api/version")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(version["version"], env!("CARGO_PKG_VERSION"));
}
