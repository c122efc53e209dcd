//! JSON HTTP API consumed by the browser UI.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/api/books` | Book names in document order |
//! | `GET`  | `/api/chapters?book=` | Chapter numbers of a book |
//! | `GET`  | `/api/versesCount?book=&chapter=` | Verse numbers of a chapter |
//! | `POST` | `/api/verses` | Extracted passage text |
//! | `POST` | `/api/translate` | Afrikaans translation (cached) |
//! | `POST` | `/api/commentary` | AI commentary |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! Passage endpoints take `{ book, startChapter, startVerse, endChapter?, endVerse? }`;
//! `/api/commentary` additionally reads `tone`, `level`, and `lang`.
//!
//! # Error Contract
//!
//! ```json
//! { "error": "Book \"Genesys\" not found" }
//! ```
//!
//! Lookup endpoints answer `404` for an unknown book or chapter. Passage
//! endpoints answer `400` for malformed input or any extraction failure, and
//! `500` when the completion provider fails.
//!
//! Any non-API path is served from `server.static_dir` when configured.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::completion::create_provider;
use crate::config::Config;
use crate::extract::{ExtractError, PassageRequest};
use crate::passage::{CommentaryOptions, PassageError, PassageService};
use crate::store::VerseStore;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    passages: Arc<PassageService>,
}

/// Starts the HTTP server.
///
/// Loads the verse document and the completion provider first; either
/// failing aborts startup. Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store = Arc::new(VerseStore::load(&config.data.path)?);
    let provider = create_provider(&config.completion)?;
    let passages = Arc::new(PassageService::new(
        store,
        provider,
        &config.completion,
        Duration::from_secs(config.cache.ttl_secs),
    ));

    let app = build_router(passages, config.server.static_dir.as_deref());

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Preach Point server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the application router around an existing [`PassageService`].
pub fn build_router(passages: Arc<PassageService>, static_dir: Option<&Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .route("/api/books", get(handle_books))
        .route("/api/chapters", get(handle_chapters))
        .route("/api/versesCount", get(handle_verses_count))
        .route("/api/verses", post(handle_verses))
        .route("/api/translate", post(handle_translate))
        .route("/api/commentary", post(handle_commentary))
        .route("/health", get(handle_health));

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState { passages })
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: message.into(),
    }
}

/// Passage endpoints report every extraction failure as a client error.
impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        bad_request(err.to_string())
    }
}

impl From<PassageError> for AppError {
    fn from(err: PassageError) -> Self {
        match err {
            PassageError::Extract(e) => e.into(),
            PassageError::Completion(e) => {
                tracing::error!(error = %e, "completion provider failed");
                internal(format!("{:#}", e))
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    books: usize,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        books: state.passages.store().len(),
    })
}

// ============ Lookups ============

#[derive(Serialize)]
struct BooksResponse {
    books: Vec<String>,
}

async fn handle_books(State(state): State<AppState>) -> Json<BooksResponse> {
    let books = state
        .passages
        .store()
        .book_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    Json(BooksResponse { books })
}

#[derive(Deserialize)]
struct ChaptersQuery {
    book: Option<String>,
}

#[derive(Serialize)]
struct ChaptersResponse {
    chapters: Vec<u32>,
}

async fn handle_chapters(
    State(state): State<AppState>,
    Query(query): Query<ChaptersQuery>,
) -> Result<Json<ChaptersResponse>, AppError> {
    let book = query
        .book
        .filter(|b| !b.is_empty())
        .ok_or_else(|| bad_request("Missing book parameter"))?;

    let chapters = state
        .passages
        .store()
        .chapter_numbers(&book)
        .ok_or_else(|| not_found(format!("Book not found: {}", book)))?;

    Ok(Json(ChaptersResponse { chapters }))
}

#[derive(Deserialize)]
struct VersesCountQuery {
    book: Option<String>,
    chapter: Option<String>,
}

#[derive(Serialize)]
struct VersesCountResponse {
    verses: Vec<u32>,
}

async fn handle_verses_count(
    State(state): State<AppState>,
    Query(query): Query<VersesCountQuery>,
) -> Result<Json<VersesCountResponse>, AppError> {
    let missing = || bad_request("Missing book or chapter parameter");

    let book = query.book.filter(|b| !b.is_empty()).ok_or_else(missing)?;
    let chapter = query
        .chapter
        .and_then(|c| c.trim().parse::<u32>().ok())
        .filter(|&c| c > 0)
        .ok_or_else(missing)?;

    let verses = state
        .passages
        .store()
        .verse_numbers(&book, chapter)
        .map_err(|e| not_found(e.to_string()))?;

    Ok(Json(VersesCountResponse { verses }))
}

// ============ Passages ============

#[derive(Serialize)]
struct TextResponse {
    text: String,
}

async fn handle_verses(
    State(state): State<AppState>,
    payload: Result<Json<PassageRequest>, JsonRejection>,
) -> Result<Json<TextResponse>, AppError> {
    let Json(request) = payload?;
    let (book, range) = request.range()?;

    let text = state.passages.text(&book, &range).map_err(|e| {
        tracing::debug!(error = %e, "passage extraction failed");
        AppError::from(e)
    })?;

    Ok(Json(TextResponse { text }))
}

#[derive(Serialize)]
struct TranslationResponse {
    translation: String,
}

async fn handle_translate(
    State(state): State<AppState>,
    payload: Result<Json<PassageRequest>, JsonRejection>,
) -> Result<Json<TranslationResponse>, AppError> {
    let Json(request) = payload?;
    let (book, range) = request.range()?;

    let translation = state.passages.translate(&book, &range).await?;

    Ok(Json(TranslationResponse { translation }))
}

#[derive(Deserialize)]
struct CommentaryRequest {
    #[serde(flatten)]
    passage: PassageRequest,
    #[serde(default)]
    tone: Option<String>,
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    lang: Option<String>,
}

#[derive(Serialize)]
struct CommentaryResponse {
    commentary: String,
}

async fn handle_commentary(
    State(state): State<AppState>,
    payload: Result<Json<CommentaryRequest>, JsonRejection>,
) -> Result<Json<CommentaryResponse>, AppError> {
    let Json(request) = payload?;
    let (book, range) = request.passage.range()?;

    let options = CommentaryOptions {
        tone: request.tone.unwrap_or_default(),
        level: request.level.unwrap_or_default(),
        lang: request.lang.unwrap_or_default(),
    };

    let commentary = state.passages.commentary(&book, &range, &options).await?;

    Ok(Json(CommentaryResponse { commentary }))
}
