//! Route handlers.
//!
//! The two embedding endpoints share one pipeline: validate the body, decrypt
//! the batch, encode under the request timeout, count what happened. Reload
//! swaps the model and clears the key cache so rotated keys get picked up.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use embedgate_model::RequestKind;
use metrics::{counter, histogram};
use tracing::{info, warn};

use crate::api::{EmbeddingRequest, EmbeddingResponse, ReloadResponse};
use crate::errors::{ApiError, Result};
use crate::health::HealthResponse;
use crate::server::AppState;
use crate::validation;

/// Greeting returned by `GET /`.
pub const ROOT_MESSAGE: &str = "Hey, I am an API that holds an embeddingsmodel. \
     You can send me text and I will send you embeddings.";

/// A body extraction that reports its failure instead of short-circuiting.
type JsonBody = std::result::Result<Json<EmbeddingRequest>, JsonRejection>;

/// `GET /`
pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": ROOT_MESSAGE }))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let handle = state.manager.current().await;
    Json(HealthResponse::snapshot(
        handle.model_name(),
        handle.loaded_at(),
        state.started_at,
        state.version,
    ))
}

/// `GET /metrics`
pub async fn metrics_text(State(state): State<AppState>) -> String {
    crate::metrics::render(&state.metrics)
}

/// `POST /get_doc_embeddings`
pub async fn get_doc_embeddings(
    State(state): State<AppState>,
    body: JsonBody,
) -> Result<Json<EmbeddingResponse>> {
    embed(&state, RequestKind::Document, "get_doc_embeddings", body).await
}

/// `POST /get_query_embeddings`
pub async fn get_query_embeddings(
    State(state): State<AppState>,
    body: JsonBody,
) -> Result<Json<EmbeddingResponse>> {
    embed(&state, RequestKind::Query, "get_query_embeddings", body).await
}

/// `POST /reload_embeddings_model`
pub async fn reload_model(State(state): State<AppState>) -> Result<Json<ReloadResponse>> {
    counter!("embedgate_requests_total", "endpoint" => "reload_embeddings_model").increment(1);

    let outcome = match state.manager.reload().await {
        Ok(outcome) => outcome,
        Err(e) => {
            counter!("embedgate_request_errors_total", "endpoint" => "reload_embeddings_model")
                .increment(1);
            return Err(e.into());
        }
    };

    // Keys may have rotated while the old model was serving; clearing the
    // cache makes the next encrypted batch re-resolve them.
    state.gateway.clear_key_cache();

    info!(handle_id = %outcome.handle_id, "model reload served");
    Ok(Json(ReloadResponse {
        message: "Successfully reloaded model".into(),
    }))
}

/// Count the request, run the pipeline, count any error.
async fn embed(
    state: &AppState,
    kind: RequestKind,
    endpoint: &'static str,
    body: JsonBody,
) -> Result<Json<EmbeddingResponse>> {
    counter!("embedgate_requests_total", "endpoint" => endpoint).increment(1);

    match encode_batch(state, kind, endpoint, body).await {
        Ok(embeddings) => {
            counter!("embedgate_texts_encoded_total").increment(embeddings.len() as u64);
            Ok(Json(EmbeddingResponse { embeddings }))
        }
        Err(e) => {
            counter!("embedgate_request_errors_total", "endpoint" => endpoint).increment(1);
            Err(e)
        }
    }
}

async fn encode_batch(
    state: &AppState,
    kind: RequestKind,
    endpoint: &'static str,
    body: JsonBody,
) -> Result<Vec<Vec<f32>>> {
    let Json(request) = body.map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
    validation::validate_batch(&request.texts)?;

    let texts = state.gateway.decrypt_batch(&state.key_name, &request.texts)?;

    let start = Instant::now();
    let embeddings = tokio::time::timeout(state.request_timeout, state.manager.encode(kind, texts))
        .await
        .map_err(|_elapsed| ApiError::Timeout(state.request_timeout.as_secs()))??;

    let duration = start.elapsed();
    histogram!("embedgate_encode_duration_seconds", "endpoint" => endpoint)
        .record(duration.as_secs_f64());

    if duration.as_secs() >= 5 {
        warn!(
            endpoint,
            batch = embeddings.len(),
            duration_secs = duration.as_secs_f64(),
            "slow encode request"
        );
    }

    Ok(embeddings)
}
