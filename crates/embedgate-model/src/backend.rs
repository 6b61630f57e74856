//! Backend traits separating model construction from inference.

use crate::errors::Result;
use crate::instruction::InstructionPair;

/// Default embedding width, matching the instructor-xl output.
pub const DEFAULT_DIMS: usize = 768;

/// A loaded model able to encode instruction-paired texts.
///
/// Implementations are called from blocking tasks, so they may do CPU-heavy
/// work inline.
pub trait ModelInstance: Send + Sync {
    /// Encode a batch, producing one embedding row per pair in input order.
    fn encode(&self, pairs: &[InstructionPair]) -> Result<Vec<Vec<f32>>>;

    /// Output embedding width.
    fn dimensions(&self) -> usize;
}

/// Source of fresh model instances.
///
/// `load` may block on downloads and file I/O; the resource manager always
/// invokes it from a blocking task. Every call returns an independent
/// instance so a reload never mutates the model readers are using.
#[cfg_attr(test, mockall::automock)]
pub trait ModelBackend: Send + Sync {
    /// Load a fresh instance of the named model.
    fn load(&self, model_name: &str) -> Result<Box<dyn ModelInstance>>;
}
