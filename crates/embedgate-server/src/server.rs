//! Axum server assembly: shared state, router, listener.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::routing::{get, post};
use embedgate_model::ResourceManager;
use embedgate_secrets::EncryptionGateway;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind; 0 picks an ephemeral port.
    pub port: u16,
    /// Per-request encode timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 300,
        }
    }
}

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Owns the published model handle and serializes reloads.
    pub manager: Arc<ResourceManager>,
    /// Decrypts request payloads (pass-through when disabled).
    pub gateway: Arc<EncryptionGateway>,
    /// Data key name used for request payloads.
    pub key_name: String,
    /// Per-request encode timeout.
    pub request_timeout: Duration,
    /// Renders the `/metrics` endpoint.
    pub metrics: PrometheusHandle,
    /// When the server started.
    pub started_at: Instant,
    /// Version reported by `/health`.
    pub version: &'static str,
}

impl AppState {
    /// Assemble the shared state for a fresh server.
    pub fn new(
        manager: Arc<ResourceManager>,
        gateway: Arc<EncryptionGateway>,
        key_name: impl Into<String>,
        request_timeout: Duration,
        metrics: PrometheusHandle,
    ) -> Self {
        Self {
            manager,
            gateway,
            key_name: key_name.into(),
            request_timeout,
            metrics,
            started_at: Instant::now(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics_text))
        .route("/get_doc_embeddings", post(handlers::get_doc_embeddings))
        .route("/get_query_embeddings", post(handlers::get_query_embeddings))
        .route("/reload_embeddings_model", post(handlers::reload_model))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Create and start the server. Returns a handle to await or shut it down.
///
/// The listener drains in-flight requests and exits once `shutdown` is
/// cancelled.
pub async fn start(
    config: ServerConfig,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<ServerHandle, std::io::Error> {
    let router = build_router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(host = %config.host, port = local_addr.port(), "embedding server started");

    let task = tokio::spawn(async move {
        let serve =
            axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned());
        if let Err(e) = serve.await {
            tracing::error!(error = %e, "embedding server error");
        }
    });

    Ok(ServerHandle {
        port: local_addr.port(),
        task,
    })
}

/// Handle returned by [`start`].
pub struct ServerHandle {
    /// Port actually bound (differs from the config when it asked for 0).
    pub port: u16,
    /// Task driving the listener; completes after graceful shutdown.
    pub task: tokio::task::JoinHandle<()>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
