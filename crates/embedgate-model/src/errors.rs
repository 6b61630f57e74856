//! Model error types.

use thiserror::Error;

/// Errors from model loading and inference.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The backend failed to produce a model instance.
    ///
    /// Fatal at startup; during a reload the previous model stays published.
    #[error("Model load failed for '{model_name}': {message}")]
    Load {
        /// Model identifier that was being loaded.
        model_name: String,
        /// Backend failure detail.
        message: String,
    },
    /// Inference over a batch failed.
    #[error("Encoding failed: {0}")]
    Encode(String),
    /// A reload was requested while another one is still running.
    #[error("Model reload already in progress")]
    ReloadInFlight,
    /// A blocking task was cancelled or panicked.
    #[error("Blocking task failed: {0}")]
    Task(String),
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
