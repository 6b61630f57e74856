//! # embedgate-server
//!
//! Axum HTTP surface for the embedding service.
//!
//! - `POST /get_doc_embeddings` / `POST /get_query_embeddings`: validate,
//!   decrypt, encode under a request timeout
//! - `POST /reload_embeddings_model`: swap the model, clear the key cache
//! - `GET /`, `GET /health`, `GET /metrics`
//! - Failures render as `{"detail": ...}` JSON (400 for bad bodies, 500 after)
//! - Graceful shutdown via `CancellationToken`

pub mod api;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod metrics;
pub mod server;
pub mod shutdown;
pub mod validation;

pub use errors::ApiError;
pub use server::{AppState, ServerConfig, ServerHandle, build_router, start};
pub use shutdown::ShutdownCoordinator;
