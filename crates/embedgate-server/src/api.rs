//! Request and response bodies for the embedding endpoints.

use serde::{Deserialize, Serialize};

/// Body accepted by `POST /get_doc_embeddings` and `POST /get_query_embeddings`.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingRequest {
    /// Texts to encode, in request order.
    pub texts: Vec<String>,
}

/// One embedding row per input text, in request order.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingResponse {
    /// Embedding matrix, row `i` for input text `i`.
    pub embeddings: Vec<Vec<f32>>,
}

/// Body returned by `POST /reload_embeddings_model` on success.
#[derive(Debug, Clone, Serialize)]
pub struct ReloadResponse {
    /// Human-readable outcome.
    pub message: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
