//! # HTTP API
//!
//! axum router over a shared [`Comparison`].
//!
//! | Method | Path           | Body                  | Response                      |
//! |--------|----------------|-----------------------|-------------------------------|
//! | GET    | `/health`      | -                     | `{"status":"ok","version"}`   |
//! | POST   | `/api/compare` | `{"models": [...]}`   | `application/jsonl` stream    |
//!
//! `/api/*` routes sit behind an optional bearer key and rate limiter.

use crate::config::ServerConfig;
use crate::error::{AppError, Result};
use crate::runner::{Comparison, ModelResult};
use crate::source::ClusterSource;
use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio_stream::{StreamExt, wrappers::ReceiverStream};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

/// Content type of streamed comparison results.
pub const JSONL: &str = "application/jsonl";

// =============================================================================
// STATE
// =============================================================================

/// Shared router state.
pub struct AppState<S> {
    comparison: Arc<Comparison<S>>,
    api_key: Option<Arc<str>>,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

// Manual impl: `S` itself need not be `Clone`.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            comparison: Arc::clone(&self.comparison),
            api_key: self.api_key.clone(),
            limiter: self.limiter.clone(),
        }
    }
}

impl<S: ClusterSource> AppState<S> {
    /// State with no authentication and no rate limit.
    pub fn new(comparison: Comparison<S>) -> Self {
        Self {
            comparison: Arc::new(comparison),
            api_key: None,
            limiter: None,
        }
    }

    /// State configured from server settings.
    pub fn from_config(comparison: Comparison<S>, config: &ServerConfig) -> Self {
        Self {
            comparison: Arc::new(comparison),
            api_key: config.api_key.as_deref().map(Arc::from),
            limiter: config
                .rate_limit_per_minute
                .map(|n| Arc::new(RateLimiter::direct(Quota::per_minute(n)))),
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Body of `POST /api/compare`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareRequest {
    pub models: Vec<String>,
}

/// Error body for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

// =============================================================================
// ROUTER
// =============================================================================

/// Build the application router.
pub fn router<S: ClusterSource>(state: AppState<S>) -> Router {
    let api = Router::new()
        .route("/api/compare", post(compare::<S>))
        .route_layer(middleware::from_fn_with_state(state.clone(), guard::<S>));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until ctrl-c.
pub async fn serve<S: ClusterSource>(config: &ServerConfig, state: AppState<S>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .map_err(AppError::Server)?;
    let addr = listener.local_addr().map_err(AppError::Server)?;
    info!(%addr, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

// =============================================================================
// MIDDLEWARE
// =============================================================================

/// Bearer-key check (constant time), then rate limit.
async fn guard<S: ClusterSource>(
    State(state): State<AppState<S>>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(expected) = &state.api_key {
        let presented = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .unwrap_or("");
        if !bool::from(presented.as_bytes().ct_eq(expected.as_bytes())) {
            return error_response(StatusCode::UNAUTHORIZED, "missing or invalid API key");
        }
    }

    if let Some(limiter) = &state.limiter {
        if limiter.check().is_err() {
            return error_response(StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded");
        }
    }

    next.run(request).await
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn compare<S: ClusterSource>(
    State(state): State<AppState<S>>,
    Json(request): Json<CompareRequest>,
) -> Response {
    if request.models.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "no models selected");
    }

    info!(models = ?request.models, "comparison requested");
    let rx = state.comparison.run(request.models);
    let lines = ReceiverStream::new(rx)
        .map(|result: ModelResult| result.to_json_line().map(Bytes::from));

    let mut response = Body::from_stream(lines).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(JSONL));
    response
}
