//! ONNX Runtime backend (feature-gated behind `ort`).
//!
//! Downloads the model repository via `hf-hub`, tokenizes with `tokenizers`,
//! runs the encoder via `ort`, then applies attention-masked mean pooling and
//! L2 normalization. The instruction is prepended to each text before
//! tokenization.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::backend::{DEFAULT_DIMS, ModelBackend, ModelInstance};
use crate::errors::{ModelError, Result};
use crate::instruction::InstructionPair;
use crate::normalize::l2_normalize;

/// ONNX backend configuration.
#[derive(Clone, Debug)]
pub struct OnnxConfig {
    /// Hugging Face cache directory; `None` uses the hf-hub default.
    pub cache_dir: Option<PathBuf>,
    /// ONNX graph file inside the model repository.
    pub model_file: String,
    /// Declared output embedding width.
    pub dimensions: usize,
    /// Intra-op thread count for the ONNX session.
    pub intra_threads: usize,
}

impl Default for OnnxConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            model_file: "onnx/model.onnx".to_string(),
            dimensions: DEFAULT_DIMS,
            intra_threads: 2,
        }
    }
}

/// Backend loading instructor-style encoders through ONNX Runtime.
pub struct OnnxBackend {
    config: OnnxConfig,
}

impl OnnxBackend {
    /// Backend with the given configuration.
    pub fn new(config: OnnxConfig) -> Self {
        Self { config }
    }
}

impl ModelBackend for OnnxBackend {
    fn load(&self, model_name: &str) -> Result<Box<dyn ModelInstance>> {
        let (model_path, tokenizer_path) = download_model(model_name, &self.config)?;

        info!(graph = %model_path.display(), "building ONNX session");

        let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| load_error(model_name, format!("tokenizer load: {e}")))?;

        let session = ort::session::Session::builder()
            .map_err(|e| load_error(model_name, format!("session builder: {e}")))?
            .with_intra_threads(self.config.intra_threads)
            .map_err(|e| load_error(model_name, format!("thread config: {e}")))?
            .with_log_level(ort::logging::LogLevel::Warning)
            .map_err(|e| load_error(model_name, format!("log level: {e}")))?
            .commit_from_file(&model_path)
            .map_err(|e| load_error(model_name, format!("model load: {e}")))?;

        Ok(Box::new(OnnxModel {
            session: parking_lot::Mutex::new(session),
            tokenizer,
            dimensions: self.config.dimensions,
        }))
    }
}

/// A loaded ONNX encoder.
struct OnnxModel {
    session: parking_lot::Mutex<ort::session::Session>,
    tokenizer: tokenizers::Tokenizer,
    dimensions: usize,
}

impl ModelInstance for OnnxModel {
    fn encode(&self, pairs: &[InstructionPair]) -> Result<Vec<Vec<f32>>> {
        if pairs.is_empty() {
            return Ok(Vec::new());
        }
        let texts: Vec<String> = pairs
            .iter()
            .map(|p| format!("{}{}", p.instruction, p.text))
            .collect();
        let mut session = self.session.lock();
        run_inference(&mut session, &self.tokenizer, &texts)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

fn load_error(model_name: &str, message: impl Into<String>) -> ModelError {
    ModelError::Load {
        model_name: model_name.to_string(),
        message: message.into(),
    }
}

/// Fetch the ONNX graph and tokenizer from the Hugging Face hub.
fn download_model(model_name: &str, config: &OnnxConfig) -> Result<(PathBuf, PathBuf)> {
    debug!(model = model_name, file = %config.model_file, "downloading model via hf-hub");

    let mut builder = hf_hub::api::sync::ApiBuilder::new();
    if let Some(cache_dir) = &config.cache_dir {
        builder = builder.with_cache_dir(cache_dir.clone());
    }
    let api = builder
        .build()
        .map_err(|e| load_error(model_name, format!("hf-hub api: {e}")))?;

    let repo = api.model(model_name.to_string());

    let model_path = repo.get(&config.model_file).map_err(|e| {
        load_error(model_name, format!("model download ({}): {e}", config.model_file))
    })?;

    let tokenizer_path = repo
        .get("tokenizer.json")
        .map_err(|e| load_error(model_name, format!("tokenizer download: {e}")))?;

    info!(graph = %model_path.display(), tokenizer = %tokenizer_path.display(), "model artifacts fetched");
    Ok((model_path, tokenizer_path))
}

/// Run inference on a batch of instruction-prefixed texts.
fn run_inference(
    session: &mut ort::session::Session,
    tokenizer: &tokenizers::Tokenizer,
    texts: &[String],
) -> Result<Vec<Vec<f32>>> {
    let encodings = tokenizer
        .encode_batch(texts.to_vec(), true)
        .map_err(|e| ModelError::Encode(format!("tokenize: {e}")))?;

    // Pad every row to the longest sequence in the batch
    let max_len = encodings
        .iter()
        .map(|e| e.get_ids().len())
        .max()
        .unwrap_or(0);
    if max_len == 0 {
        return Err(ModelError::Encode("empty tokenization".to_string()));
    }

    let batch_size = texts.len();

    // Row-major [batch, max_len] buffers, zero-padded
    let mut input_ids = vec![0i64; batch_size * max_len];
    let mut attention_mask = vec![0i64; batch_size * max_len];

    for (i, enc) in encodings.iter().enumerate() {
        let offset = i * max_len;
        for (j, &id) in enc.get_ids().iter().enumerate() {
            input_ids[offset + j] = i64::from(id);
        }
        for (j, &m) in enc.get_attention_mask().iter().enumerate() {
            attention_mask[offset + j] = i64::from(m);
        }
    }

    // ort takes (shape, flat data) pairs
    let shape = vec![batch_size as i64, max_len as i64];

    let input_ids_tensor = ort::value::Tensor::from_array((shape.clone(), input_ids))
        .map_err(|e| ModelError::Encode(format!("input_ids tensor: {e}")))?;
    let attention_mask_tensor =
        ort::value::Tensor::from_array((shape, attention_mask.clone()))
            .map_err(|e| ModelError::Encode(format!("attention_mask tensor: {e}")))?;

    let outputs = session
        .run(ort::inputs![input_ids_tensor, attention_mask_tensor])
        .map_err(|e| ModelError::Encode(format!("inference: {e}")))?;

    // Hidden states come back as [batch, seq, hidden]
    let output_value = &outputs[0];
    let (output_shape, output_data) = output_value
        .try_extract_tensor::<f32>()
        .map_err(|e| ModelError::Encode(format!("extract tensor: {e}")))?;

    let dims: Vec<usize> = output_shape.iter().map(|&d| d as usize).collect();
    if dims.len() != 3 || dims[0] != batch_size || dims[1] != max_len {
        return Err(ModelError::Encode(format!(
            "output shape {output_shape:?} is not [batch, seq, hidden]"
        )));
    }
    let hidden_dim = dims[2];

    Ok(mean_pool(
        output_data,
        &attention_mask,
        batch_size,
        max_len,
        hidden_dim,
    ))
}

/// Mean-pool token states over the attention mask, then L2-normalize.
///
/// Padding positions contribute nothing; a fully masked row pools to the
/// zero vector.
fn mean_pool(
    output: &[f32],
    attention_mask: &[i64],
    batch_size: usize,
    seq_len: usize,
    hidden_dim: usize,
) -> Vec<Vec<f32>> {
    (0..batch_size)
        .map(|i| {
            let mut pooled = vec![0.0_f32; hidden_dim];
            let mut tokens = 0.0_f32;
            for j in 0..seq_len {
                if attention_mask[i * seq_len + j] != 0 {
                    let base = (i * seq_len + j) * hidden_dim;
                    for (d, slot) in pooled.iter_mut().enumerate() {
                        *slot += output[base + d];
                    }
                    tokens += 1.0;
                }
            }
            if tokens > 0.0 {
                for slot in &mut pooled {
                    *slot /= tokens;
                }
            }
            l2_normalize(&mut pooled);
            pooled
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close_to(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn onnx_backend_implements_trait() {
        fn assert_model_backend<T: ModelBackend>() {}
        assert_model_backend::<OnnxBackend>();
    }

    #[test]
    fn mean_pool_ignores_padding() {
        // batch 1, seq 3, hidden 2; third position is padding
        let output = vec![1.0, 2.0, 3.0, 4.0, 100.0, 100.0];
        let mask = vec![1i64, 1, 0];
        let pooled = mean_pool(&output, &mask, 1, 3, 2);

        // mean of [1,2] and [3,4] is [2,3], then normalized by sqrt(13)
        let norm = 13.0_f32.sqrt();
        assert!(close_to(pooled[0][0], 2.0 / norm));
        assert!(close_to(pooled[0][1], 3.0 / norm));
    }

    #[test]
    fn mean_pool_batch_offsets() {
        // batch 2, seq 2, hidden 1
        let output = vec![2.0, 4.0, 8.0, 100.0];
        let mask = vec![1i64, 1, 1, 0];
        let pooled = mean_pool(&output, &mask, 2, 2, 1);

        // Row means are 3 and 8; both normalize to 1.0 in a single dimension.
        assert!(close_to(pooled[0][0], 1.0));
        assert!(close_to(pooled[1][0], 1.0));
    }

    #[test]
    fn mean_pool_fully_masked_row_is_zero() {
        let output = vec![5.0, 5.0];
        let mask = vec![0i64, 0];
        let pooled = mean_pool(&output, &mask, 1, 2, 1);
        assert!(pooled[0].iter().all(|x| *x == 0.0));
        assert!(!pooled[0].iter().any(|x| x.is_nan()));
    }

    #[test]
    fn config_defaults() {
        let config = OnnxConfig::default();
        assert_eq!(config.dimensions, DEFAULT_DIMS);
        assert_eq!(config.model_file, "onnx/model.onnx");
        assert!(config.cache_dir.is_none());
    }
}
