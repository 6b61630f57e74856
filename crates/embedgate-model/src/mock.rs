//! Mock and stub backends.
//!
//! [`MockBackend`] is the default runtime backend: it produces deterministic
//! hash-based embeddings with no native dependencies, which keeps local runs
//! and CI off the network. [`StubBackend`] returns canned embeddings and
//! records every encode call for assertions in server-level tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::Duration;

use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::backend::{DEFAULT_DIMS, ModelBackend, ModelInstance};
use crate::errors::{ModelError, Result};
use crate::instruction::InstructionPair;
use crate::normalize::l2_normalize;

/// Deterministic hash-based backend.
pub struct MockBackend {
    dims: usize,
    fail_loads: AtomicBool,
    loads: AtomicUsize,
}

impl MockBackend {
    /// Backend producing `dims`-wide embeddings.
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            fail_loads: AtomicBool::new(false),
            loads: AtomicUsize::new(0),
        }
    }

    /// Make subsequent `load` calls fail (or succeed again).
    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    /// Number of `load` calls so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new(DEFAULT_DIMS)
    }
}

impl ModelBackend for MockBackend {
    fn load(&self, model_name: &str) -> Result<Box<dyn ModelInstance>> {
        let _ = self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(ModelError::Load {
                model_name: model_name.to_string(),
                message: "mock backend configured to fail".to_string(),
            });
        }
        Ok(Box::new(MockModel::new(self.dims)))
    }
}

/// Deterministic embedding model.
///
/// Hashes instruction + text with SHA-256 and uses the digest bytes as seeds
/// for the vector components, so the same input always embeds identically and
/// document/query encodings of the same text differ.
pub struct MockModel {
    dims: usize,
}

impl MockModel {
    /// Model producing `dims`-wide embeddings.
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }

    fn hash_to_vector(&self, pair: &InstructionPair) -> Vec<f32> {
        let mut hasher = Sha256::new();
        hasher.update(pair.instruction.as_bytes());
        hasher.update(pair.text.as_bytes());
        let hash = hasher.finalize();

        let mut v: Vec<f32> = (0..self.dims)
            .map(|i| {
                let byte_idx = i % hash.len();
                // Map byte to [-1, 1] range
                (f32::from(hash[byte_idx]) / 127.5) - 1.0
            })
            .collect();

        l2_normalize(&mut v);
        v
    }
}

impl ModelInstance for MockModel {
    fn encode(&self, pairs: &[InstructionPair]) -> Result<Vec<Vec<f32>>> {
        Ok(pairs.iter().map(|p| self.hash_to_vector(p)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

/// Backend returning canned embeddings and recording every encode call.
pub struct StubBackend {
    matrix: Vec<Vec<f32>>,
    fail_loads: AtomicBool,
    load_delay: Option<Duration>,
    encode_gate: Option<Arc<Mutex<mpsc::Receiver<()>>>>,
    captures: Arc<Mutex<Vec<Vec<InstructionPair>>>>,
}

impl StubBackend {
    /// Backend whose instances answer every batch from `matrix`, row `i % rows`
    /// for input `i`.
    pub fn returning(matrix: Vec<Vec<f32>>) -> Self {
        Self {
            matrix,
            fail_loads: AtomicBool::new(false),
            load_delay: None,
            encode_gate: None,
            captures: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Sleep this long inside every `load` call.
    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = Some(delay);
        self
    }

    /// Park every `encode` call until the returned sender sends or is dropped.
    ///
    /// Each send releases one call; dropping the sender releases everything
    /// still parked. Lets a paused-clock test hold an encode open while it
    /// drives the timers around it.
    pub fn with_encode_gate(mut self) -> (Self, mpsc::Sender<()>) {
        let (release, gate) = mpsc::channel();
        self.encode_gate = Some(Arc::new(Mutex::new(gate)));
        (self, release)
    }

    /// Make subsequent `load` calls fail (or succeed again).
    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    /// Every batch passed to `encode`, in call order.
    pub fn captures(&self) -> Arc<Mutex<Vec<Vec<InstructionPair>>>> {
        Arc::clone(&self.captures)
    }
}

impl ModelBackend for StubBackend {
    fn load(&self, model_name: &str) -> Result<Box<dyn ModelInstance>> {
        if let Some(delay) = self.load_delay {
            // Runs on the blocking pool, so a thread sleep is fine here.
            std::thread::sleep(delay);
        }
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(ModelError::Load {
                model_name: model_name.to_string(),
                message: "stub backend configured to fail".to_string(),
            });
        }
        Ok(Box::new(StubModel {
            matrix: self.matrix.clone(),
            encode_gate: self.encode_gate.clone(),
            captures: Arc::clone(&self.captures),
        }))
    }
}

struct StubModel {
    matrix: Vec<Vec<f32>>,
    encode_gate: Option<Arc<Mutex<mpsc::Receiver<()>>>>,
    captures: Arc<Mutex<Vec<Vec<InstructionPair>>>>,
}

impl ModelInstance for StubModel {
    fn encode(&self, pairs: &[InstructionPair]) -> Result<Vec<Vec<f32>>> {
        self.captures.lock().push(pairs.to_vec());
        if let Some(gate) = &self.encode_gate {
            // Runs on the blocking pool, so parking the thread is fine here.
            let _ = gate.lock().recv();
        }
        if self.matrix.is_empty() {
            return Err(ModelError::Encode("stub matrix is empty".to_string()));
        }
        Ok((0..pairs.len())
            .map(|i| self.matrix[i % self.matrix.len()].clone())
            .collect())
    }

    fn dimensions(&self) -> usize {
        self.matrix.first().map_or(0, Vec::len)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
