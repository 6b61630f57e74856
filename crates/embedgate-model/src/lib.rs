//! # embedgate-model
//!
//! Embedding model lifecycle for the embedgate service.
//!
//! A [`ModelBackend`] loads [`ModelInstance`]s; the [`ResourceManager`]
//! publishes one instance at a time behind a [`ModelHandle`] and swaps it
//! atomically on reload, so readers never observe a half-loaded model.
//! Documents and queries are conditioned on different instructions via
//! [`RequestKind`].
//!
//! The default [`mock::MockBackend`] produces deterministic hash-based
//! embeddings; the `ort` cargo feature adds an ONNX Runtime backend.

pub mod backend;
pub mod errors;
pub mod instruction;
pub mod manager;
pub mod mock;
pub mod normalize;
#[cfg(feature = "ort")]
pub mod onnx;

pub use backend::{DEFAULT_DIMS, ModelBackend, ModelInstance};
pub use errors::{ModelError, Result};
pub use instruction::{
    DOC_INSTRUCTION, InstructionPair, QUERY_INSTRUCTION, RequestKind, pair_with_instruction,
};
pub use manager::{ModelHandle, ReloadOutcome, ResourceManager};
pub use mock::{MockBackend, MockModel, StubBackend};
#[cfg(feature = "ort")]
pub use onnx::{OnnxBackend, OnnxConfig};

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
