//! # StudyWise HTTP API
//!
//! Document analysis (summary + quiz) and the per-user study session log.
//!
//! ## Endpoints
//!
//! - `POST /upload-and-analyze` - multipart `document` to `{summary, quiz}`
//! - `POST /analyze` - pasted notes to `{summary, quiz}`
//! - `POST /extract` - multipart `document` to `{text}`
//! - `POST /quiz/grade` - score answers against a quiz
//! - `POST /users/:user_id/sessions` - record a completed work session
//! - `GET /users/:user_id/sessions` - newest first, optional `?limit=`
//! - `GET /users/:user_id/stats` - study totals
//! - `GET /health` - liveness and AI availability

pub mod error;
pub mod routes;
pub mod upload;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use studywise_core::storage::ServerConfig;
use studywise_core::{GeminiClient, SessionLog};
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ErrorBody};

/// Shared state for all handlers.
pub struct AppState {
    pub sessions: Arc<dyn SessionLog>,
    /// `None` when no API key is configured; analysis requests then fail
    /// with a configuration error while everything else keeps working.
    pub gemini: Option<GeminiClient>,
    pub upload_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid listen address: {0}")]
    Address(String),

    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Directory uploads are spooled to, created if missing.
pub fn upload_dir(config: &ServerConfig) -> Result<PathBuf, ServerError> {
    let dir = config
        .upload_dir
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("studywise-uploads"));
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn build_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    let body_limit = usize::try_from(config.max_upload_bytes).unwrap_or(usize::MAX);

    let router = Router::new()
        .route("/health", get(routes::health))
        .route("/upload-and-analyze", post(routes::upload_and_analyze))
        .route("/analyze", post(routes::analyze_notes))
        .route("/extract", post(routes::extract_text))
        .route("/quiz/grade", post(routes::grade_quiz))
        .route(
            "/users/:user_id/sessions",
            post(routes::append_session).get(routes::list_sessions),
        )
        .route("/users/:user_id/stats", get(routes::session_stats))
        .layer(DefaultBodyLimit::max(body_limit));

    let router = if config.cors_allow_any {
        router.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
    } else {
        router
    };

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(state: Arc<AppState>, config: &ServerConfig) -> Result<(), ServerError> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| ServerError::Address(format!("{}:{}: {e}", config.host, config.port)))?;

    let app = build_router(state, config);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "StudyWise server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
