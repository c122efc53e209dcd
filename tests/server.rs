//! HTTP-level tests for the passage API.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`, backed
//! by the fixture verse document and a scripted completion provider.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use preach_point::completion::{CompletionProvider, CompletionRequest};
use preach_point::config::CompletionConfig;
use preach_point::passage::PassageService;
use preach_point::server::build_router;
use preach_point::store::VerseStore;
use serde_json::{json, Value};
use tower::ServiceExt;

// ── Test provider ──────────────────────────────────────────────

/// Echoes the prompt back, or fails when `fail` is set.
struct EchoProvider {
    calls: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl CompletionProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("upstream unavailable");
        }
        Ok(format!("[{}] {}", request.model, request.prompt))
    }
}

// ── Test app builder ───────────────────────────────────────────

fn build_app(fail: bool) -> (axum::Router, Arc<EchoProvider>) {
    let fixture = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/kjv.json");
    let store = VerseStore::load(&fixture).expect("fixture document loads");
    let provider = Arc::new(EchoProvider {
        calls: AtomicUsize::new(0),
        fail,
    });
    let passages = Arc::new(PassageService::new(
        Arc::new(store),
        provider.clone(),
        &CompletionConfig::default(),
        Duration::from_secs(3600),
    ));
    (build_router(passages, None), provider)
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ── Lookups ────────────────────────────────────────────────────

#[tokio::test]
async fn test_health() {
    let (app, _) = build_app(false);
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["books"], 2);
}

#[tokio::test]
async fn test_books() {
    let (app, _) = build_app(false);
    let (status, body) = send(&app, get("/api/books")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "books": ["Genesis", "John"] }));
}

#[tokio::test]
async fn test_chapters() {
    let (app, _) = build_app(false);

    let (status, body) = send(&app, get("/api/chapters?book=Genesis")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "chapters": [1, 2] }));

    let (status, body) = send(&app, get("/api/chapters")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing book parameter");

    let (status, body) = send(&app, get("/api/chapters?book=Exodus")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Book not found: Exodus");
}

#[tokio::test]
async fn test_verses_count() {
    let (app, _) = build_app(false);

    let (status, body) = send(&app, get("/api/versesCount?book=John&chapter=3")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "verses": [16, 17] }));

    let (status, _) = send(&app, get("/api/versesCount?book=John")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/api/versesCount?book=John&chapter=0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, get("/api/versesCount?book=John&chapter=4")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Chapter \"4\" not found in John");
}

// ── Passages ───────────────────────────────────────────────────

#[tokio::test]
async fn test_verses_single_chapter() {
    let (app, _) = build_app(false);
    let (status, body) = send(
        &app,
        post(
            "/api/verses",
            json!({ "book": "Genesis", "startChapter": "1", "startVerse": "1", "endChapter": "1", "endVerse": "3" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let text = body["text"].as_str().unwrap();
    let lines: Vec<&str> = text.split('\n').collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("1:1 In the beginning"));
    assert!(lines[2].starts_with("1:3 And God said"));
}

#[tokio::test]
async fn test_verses_across_chapters() {
    let (app, _) = build_app(false);
    let (status, body) = send(
        &app,
        post(
            "/api/verses",
            json!({ "book": "Genesis", "startChapter": 1, "startVerse": 31, "endChapter": 2, "endVerse": 2 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let text = body["text"].as_str().unwrap();
    let tags: Vec<&str> = text
        .lines()
        .map(|l| l.split(' ').next().unwrap())
        .collect();
    assert_eq!(tags, vec!["1:31", "2:1", "2:2"]);
}

#[tokio::test]
async fn test_verses_errors_are_bad_requests() {
    let (app, _) = build_app(false);

    let (status, body) = send(&app, post("/api/verses", json!({ "book": "Genesis" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing book, startChapter, or startVerse");

    let (status, body) = send(
        &app,
        post("/api/verses", json!({ "book": "Genesys", "startChapter": 1, "startVerse": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Book \"Genesys\" not found");

    let (status, body) = send(
        &app,
        post(
            "/api/verses",
            json!({ "book": "Genesis", "startChapter": 1, "startVerse": 5, "endVerse": 9 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No verses found in range 1:5–1:9");

    let (status, _) = send(
        &app,
        post("/api/verses", json!({ "book": "Genesis", "startChapter": "x", "startVerse": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_translate_cached_by_range() {
    let (app, provider) = build_app(false);
    let body = json!({ "book": "John", "startChapter": 3, "startVerse": 16 });

    let (status, first) = send(&app, post("/api/translate", body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let translation = first["translation"].as_str().unwrap();
    assert!(translation.starts_with("[gpt-3.5-turbo] Translate these Bible verses into Afrikaans"));
    assert!(translation.ends_with("3:16 For God so loved the world, that he gave his only begotten Son, that whosoever believeth in him should not perish, but have everlasting life."));

    // Same range spelled with explicit end and string numbers hits the cache.
    let same = json!({ "book": "John", "startChapter": "3", "startVerse": "16", "endChapter": "3", "endVerse": "16" });
    let (status, second) = send(&app, post("/api/translate", same)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_translate_provider_failure() {
    let (app, provider) = build_app(true);
    let (status, body) = send(
        &app,
        post("/api/translate", json!({ "book": "John", "startChapter": 3, "startVerse": 16 })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("upstream unavailable"));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_commentary() {
    let (app, provider) = build_app(false);
    let body = json!({
        "book": "John", "startChapter": "3", "startVerse": "16", "endChapter": "3", "endVerse": "17",
        "tone": "Teaching", "level": "Sermon-Style", "lang": "en"
    });

    let (status, response) = send(&app, post("/api/commentary", body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let commentary = response["commentary"].as_str().unwrap();
    assert!(commentary.starts_with("[gpt-4o-mini] Here is the passage (John 3:16-3:17):"));
    assert!(commentary.contains("3:17 For God sent not his Son"));
    assert!(commentary.ends_with(
        "Now write a English commentary at the \"Sermon-Style\" level, using a \"Teaching\" tone."
    ));

    send(&app, post("/api/commentary", body)).await;
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_commentary_extraction_error_skips_provider() {
    let (app, provider) = build_app(false);
    let (status, body) = send(
        &app,
        post(
            "/api/commentary",
            json!({ "book": "John", "startChapter": 5, "startVerse": 1, "lang": "af" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Chapter \"5\" not found in John");
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}
