//! Search HTTP server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/api/search?q=<text>` | Ordered JSON list of search results |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! Every response carries `Cache-Control: no-store, no-cache,
//! must-revalidate, max-age=0`, `Pragma: no-cache` and `Expires: 0`, so
//! browsers and proxies never serve a result list from before the last sync.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "internal", "message": "search is temporarily unavailable" } }
//! ```
//!
//! Backend detail goes to the log, never to the client.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so a separately hosted
//! frontend can call the API.

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use feed_mirror_core::models::SearchResult;
use feed_mirror_core::search::{search, SearchParams};
use feed_mirror_core::store::ArticleStore;

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::sqlite_store::SqliteStore;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn ArticleStore>,
    params: SearchParams,
}

impl AppState {
    pub fn new(store: Arc<dyn ArticleStore>, params: SearchParams) -> Self {
        Self { store, params }
    }
}

/// Starts the search server on `[server].bind`.
///
/// Runs until the process is terminated. The pool is shared by all
/// requests; each handler checks out a connection only for its query.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    migrate::migrate_pool(&pool).await?;

    let state = AppState::new(
        Arc::new(SqliteStore::new(pool)),
        config.search.params(),
    );
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    println!("Search server listening on http://{}", config.server.bind);
    tracing::info!(bind = %config.server.bind, "search server started");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/search", get(handle_search))
        .route("/health", get(handle_health))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate, max-age=0"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("0"),
        ))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn internal_error() -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: "search is temporarily unavailable".to_string(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /api/search ============

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

/// Handler for `GET /api/search`.
///
/// A missing or blank `q` returns the most recent articles.
async fn handle_search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<SearchResult>>, AppError> {
    match search(state.store.as_ref(), &query.q, &state.params).await {
        Ok(results) => Ok(Json(results)),
        Err(e) => {
            tracing::error!(query = %query.q, error = %e, "search failed");
            Err(internal_error())
        }
    }
}
