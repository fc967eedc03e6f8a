//! HTTP API for the cached page feed
//!
//! # Routes
//!
//! - `GET /health` - Liveness
//! - `GET /api/facebook/page` - Page profile
//! - `GET /api/facebook/posts?limit=&after=` - One page of posts
//! - `GET /api/facebook/posts/{id}/engagement` - Engagement counts of a post
//! - `GET /api/facebook/initial-data` - Page profile plus the first page
//! - `GET /api/facebook/revalidate` - Usage
//! - `POST /api/facebook/revalidate` - Invalidate caches (body: `{"secret": "...", "tags": [...]}`)
//! - `GET /api/facebook/cache-info` - Cache configuration and counters
//! - `GET /metrics` - Prometheus metrics
//!
//! Successful reads carry `Cache-Control: public, s-maxage=<ttl>,
//! stale-while-revalidate=<2 * ttl>`; errors are never cacheable.
//!
//! # Example
//!
//! ```no_run
//! use pagefeed::config::PageFeedConfig;
//! use pagefeed::server::PageFeedServer;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = PageFeedConfig::resolve(None).expect("Failed to load config");
//!     let server = PageFeedServer::from_config(&config).expect("Failed to create server");
//!
//!     server.run(&config.server.bind).await.expect("Server failed");
//! }
//! ```

use crate::config::PageFeedConfig;
use crate::feed::{
    clamp_page_size, secret_matches, FeedService, RevalidationTarget, DEFAULT_PAGE_SIZE,
    LOGICAL_TAGS, MAX_PAGE_SIZE,
};
use crate::{metrics, PageFeedError};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;

const NO_STORE: &str = "no-cache, no-store, must-revalidate";

/// Server error types
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Feed error: {0}")]
    Feed(#[from] PageFeedError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bind error: {0}")]
    Bind(String),
}

/// Shared server state
struct AppState {
    service: FeedService,
    revalidation_secret: Option<String>,
    expose_cache_info: bool,
}

/// HTTP server over a [`FeedService`]
pub struct PageFeedServer {
    state: Arc<AppState>,
}

impl PageFeedServer {
    pub fn new(
        service: FeedService,
        revalidation_secret: Option<String>,
        expose_cache_info: bool,
    ) -> Self {
        Self {
            state: Arc::new(AppState {
                service,
                revalidation_secret,
                expose_cache_info,
            }),
        }
    }

    /// Build the service and server from configuration
    pub fn from_config(config: &PageFeedConfig) -> Result<Self, ServerError> {
        let service = FeedService::from_config(config)?;
        Ok(Self::new(
            service,
            config.revalidation.secret.clone(),
            config.server.expose_cache_info,
        ))
    }

    /// Router with all routes bound to this server's state
    pub fn router(&self) -> Router {
        Self::build_router(self.state.clone())
    }

    fn build_router(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/api/facebook/page", get(get_page))
            .route("/api/facebook/posts", get(get_posts))
            .route("/api/facebook/posts/{id}/engagement", get(get_engagement))
            .route("/api/facebook/initial-data", get(get_initial_data))
            .route(
                "/api/facebook/revalidate",
                get(revalidate_usage).post(revalidate),
            )
            .route("/api/facebook/cache-info", get(cache_info))
            .route("/metrics", get(get_metrics))
            .with_state(state)
    }

    /// Run the server on the given address
    pub async fn run(self, addr: &str) -> Result<(), ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(e.to_string()))?;

        tracing::info!(
            addr = addr,
            page_id = self.state.service.page_id(),
            revalidation_enabled = self.state.revalidation_secret.is_some(),
            "Page feed server listening"
        );

        axum::serve(listener, Self::build_router(self.state))
            .await
            .map_err(ServerError::Io)
    }
}

// ============================================================================
// Request/Response types
// ============================================================================

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Query string of the posts route
#[derive(Debug, Deserialize)]
pub struct PostsQuery {
    pub limit: Option<String>,
    pub after: Option<String>,
}

/// Body of a revalidation request
///
/// `tags` stays untyped so a missing or non-array value gets a 400 of our own.
#[derive(Debug, Default, Deserialize)]
pub struct RevalidateRequest {
    pub secret: Option<String>,
    pub tags: Option<serde_json::Value>,
}

/// Response to a successful revalidation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevalidateResponse {
    pub message: String,
    pub revalidated_tags: Vec<String>,
    pub timestamp: String,
}

/// A failed request: status, summary and optional details
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    error: String,
    details: Option<String>,
}

impl ApiError {
    fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
        }
    }

    /// Map a feed failure onto a status, keeping its message as details
    fn feed(summary: &str, err: PageFeedError) -> Self {
        let status = match &err {
            PageFeedError::UpstreamAuth(_) | PageFeedError::WrongTokenType => {
                StatusCode::UNAUTHORIZED
            }
            PageFeedError::UpstreamApi { .. }
            | PageFeedError::UpstreamStatus(_)
            | PageFeedError::Network(_)
            | PageFeedError::Schema(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::warn!(status = status.as_u16(), kind = err.kind(), error = %err, "{}", summary);
        Self {
            status,
            error: summary.to_string(),
            details: Some(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CACHE_CONTROL, NO_STORE)],
            Json(ErrorResponse {
                error: self.error,
                details: self.details,
            }),
        )
            .into_response()
    }
}

fn cache_control(ttl: Duration) -> String {
    let secs = ttl.as_secs();
    format!(
        "public, s-maxage={}, stale-while-revalidate={}",
        secs,
        secs * 2
    )
}

fn cached_json<T: Serialize>(ttl: Duration, body: T) -> Response {
    ([(header::CACHE_CONTROL, cache_control(ttl))], Json(body)).into_response()
}

/// Parse `limit`, defaulting when absent and clamping into range
fn parse_limit(raw: Option<&str>) -> Result<u32, ApiError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(DEFAULT_PAGE_SIZE),
        Some(raw) => raw,
    };
    let limit: i64 = raw.parse().map_err(|_| ApiError {
        status: StatusCode::BAD_REQUEST,
        error: "Invalid query".to_string(),
        details: Some(format!("limit must be an integer, got '{}'", raw)),
    })?;
    Ok(clamp_page_size(limit.clamp(1, MAX_PAGE_SIZE as i64) as u32))
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn get_page(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let page_info = state
        .service
        .page_info()
        .await
        .map_err(|e| ApiError::feed("Failed to fetch page info from Facebook Graph API", e))?;
    Ok(cached_json(state.service.page_info_ttl(), page_info))
}

async fn get_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PostsQuery>,
) -> Result<Response, ApiError> {
    let limit = parse_limit(query.limit.as_deref())?;
    let after = query.after.as_deref().filter(|a| !a.is_empty());

    let page = state
        .service
        .posts(limit, after)
        .await
        .map_err(|e| ApiError::feed("Failed to fetch posts from Facebook Graph API", e))?;
    Ok(cached_json(state.service.posts_ttl(), page))
}

async fn get_engagement(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
) -> Result<Response, ApiError> {
    let engagement = state
        .service
        .post_engagement(&post_id)
        .await
        .map_err(|e| ApiError::feed("Failed to fetch post engagement from Facebook Graph API", e))?;
    Ok(cached_json(state.service.engagement_ttl(), engagement))
}

async fn get_initial_data(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let data = state
        .service
        .initial_data()
        .await
        .map_err(|e| ApiError::feed("Failed to fetch initial data from Facebook", e))?;
    Ok(cached_json(state.service.posts_ttl(), data))
}

async fn revalidate_usage() -> impl IntoResponse {
    let available: serde_json::Map<String, serde_json::Value> = LOGICAL_TAGS
        .iter()
        .filter_map(|name| name.parse::<RevalidationTarget>().ok())
        .map(|target| (target.to_string(), target.description().into()))
        .collect();

    Json(serde_json::json!({
        "message": "Facebook Cache Revalidation API",
        "usage": {
            "method": "POST",
            "body": {
                "secret": "your-revalidation-secret",
                "tags": LOGICAL_TAGS,
            }
        },
        "availableTags": available,
    }))
}

async fn revalidate(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<RevalidateResponse>, ApiError> {
    let request: RevalidateRequest = serde_json::from_slice(&body).map_err(|e| ApiError {
        status: StatusCode::BAD_REQUEST,
        error: "Invalid request body".to_string(),
        details: Some(e.to_string()),
    })?;

    let presented = request.secret.as_deref().unwrap_or_default();
    if !secret_matches(state.revalidation_secret.as_deref(), presented) {
        tracing::warn!("Revalidation rejected: invalid secret");
        return Err(ApiError::new(StatusCode::UNAUTHORIZED, "Invalid secret"));
    }

    let names: Vec<String> = match request.tags {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => {
            return Err(ApiError::new(
                StatusCode::BAD_REQUEST,
                "Tags array is required",
            ))
        }
    };

    let outcome = state.service.revalidate(&names).await;
    Ok(Json(RevalidateResponse {
        message: "Cache revalidated successfully".to_string(),
        revalidated_tags: outcome
            .revalidated_tags
            .iter()
            .map(|tag| tag.to_string())
            .collect(),
        timestamp: outcome.timestamp.to_rfc3339(),
    }))
}

async fn cache_info(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    if !state.expose_cache_info {
        return Err(ApiError::new(
            StatusCode::FORBIDDEN,
            "Cache info is disabled on this server",
        ));
    }
    Ok(Json(state.service.cache_info().await).into_response())
}

async fn get_metrics() -> Result<Response, ApiError> {
    let body = metrics::encode_metrics()
        .map_err(|e| ApiError::feed("Failed to encode metrics", e))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}
