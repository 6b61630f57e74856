//! # embedgate-secrets
//!
//! Secret store access and request payload encryption for the embedgate
//! service.
//!
//! The [`EncryptionGateway`] decrypts incoming batches under named keys
//! resolved from a [`SecretStore`]. Payloads use ChaCha20-Poly1305 with a
//! base64(nonce ‖ ciphertext) envelope. When encryption is disabled the
//! gateway passes batches through untouched, so callers never branch on the
//! deployment mode.

pub mod cipher;
pub mod errors;
pub mod gateway;
pub mod store;

pub use errors::{Result, SecretError};
pub use gateway::{EncryptionGateway, GatewayConfig, KeyMaterial, resolve_encryption_status};
pub use store::{EnvSecretStore, MemorySecretStore, SecretStore};

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
