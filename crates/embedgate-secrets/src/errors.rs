//! Secret and encryption error types.

use thiserror::Error;

/// Errors from secret resolution and payload encryption.
#[derive(Debug, Error)]
pub enum SecretError {
    /// A named key could not be fetched from the secret store.
    #[error("Key resolution failed for '{key_name}': {message}")]
    KeyResolution {
        /// Logical key name that was requested.
        key_name: String,
        /// Underlying store failure.
        message: String,
    },
    /// The store returned key material that is not a 256-bit key.
    #[error("Key material for '{key_name}' is not a valid 256-bit key")]
    InvalidKeyMaterial {
        /// Logical key name whose payload was rejected.
        key_name: String,
    },
    /// AEAD encryption failed.
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),
    /// A ciphertext could not be decrypted.
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),
    /// The requested secret does not exist in the store.
    #[error("Secret not found: {0}")]
    NotFound(String),
    /// The store backend failed.
    #[error("Secret store error: {0}")]
    Store(String),
}

/// Result type for secret operations.
pub type Result<T> = std::result::Result<T, SecretError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_resolution_display_names_key() {
        let err = SecretError::KeyResolution {
            key_name: "embeddings_encryption_key".to_string(),
            message: "Secret not found: embeddings_encryption_key".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Key resolution failed for 'embeddings_encryption_key'"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn invalid_key_material_display() {
        let err = SecretError::InvalidKeyMaterial {
            key_name: "tenant_key".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Key material for 'tenant_key' is not a valid 256-bit key"
        );
    }

    #[test]
    fn decryption_failed_display() {
        let err = SecretError::DecryptionFailed("authentication failed".to_string());
        assert_eq!(err.to_string(), "Decryption failed: authentication failed");
    }

    #[test]
    fn not_found_display() {
        let err = SecretError::NotFound("missing_secret".to_string());
        assert_eq!(err.to_string(), "Secret not found: missing_secret");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SecretError>();
    }
}
