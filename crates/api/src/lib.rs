//! `api` crate — HTTP layer binding the repository operations to the book
//! entity.
//!
//! Exposes:
//!   POST   {path}          — query object: list / insert / update / delete
//!   GET    {path}/schema   — entity shape
//!   GET    /health

pub mod error;
pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use db::{BookStore, EntitySchema, BOOK_SCHEMA};

pub use error::ApiError;

pub const DEFAULT_BIND: &str = "0.0.0.0:9000";
pub const DEFAULT_PATH: &str = "/api";

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BookStore>,
    pub schema: &'static EntitySchema,
}

impl AppState {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self {
            store,
            schema: &BOOK_SCHEMA,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid bind address '{0}'")]
    InvalidBind(String),

    #[error("invalid endpoint path '{0}': must start with '/' and not be '/health'")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where the server listens and which path serves the query endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 9000)),
            path: DEFAULT_PATH.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn new(bind: &str, path: &str) -> Result<Self, ServerError> {
        let bind = bind
            .parse()
            .map_err(|_| ServerError::InvalidBind(bind.to_string()))?;

        let trimmed = path.trim_end_matches('/');
        if !path.starts_with('/') || trimmed.is_empty() || trimmed == "/health" {
            return Err(ServerError::InvalidPath(path.to_string()));
        }

        Ok(Self {
            bind,
            path: trimmed.to_string(),
        })
    }

    pub fn schema_path(&self) -> String {
        format!("{}/schema", self.path)
    }
}

// ---------------------------------------------------------------------------
// Router and server
// ---------------------------------------------------------------------------

/// Build the application router.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route(&config.path, post(handlers::books::execute))
        .route(&config.schema_path(), get(handlers::schema::describe))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the API until Ctrl+C or SIGTERM.
pub async fn serve(config: ServerConfig, store: Arc<dyn BookStore>) -> Result<(), ServerError> {
    let app = build_router(AppState::new(store), &config);

    let listener = TcpListener::bind(config.bind).await?;
    info!(path = %config.path, "Server listening on {}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown"),
        _ = terminate => info!("Received SIGTERM, starting shutdown"),
    }
}
