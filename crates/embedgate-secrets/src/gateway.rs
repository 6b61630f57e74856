//! Named-key payload encryption gateway.

use std::sync::Arc;

use dashmap::DashMap;
use embedgate_settings::loader::parse_bool;
use secrecy::{ExposeSecret, SecretBox};
use tracing::{debug, warn};

use crate::cipher;
use crate::errors::{Result, SecretError};
use crate::store::SecretStore;

/// A resolved 256-bit data key (zeroized on drop, redacted in Debug).
pub struct KeyMaterial(SecretBox<[u8; 32]>);

impl KeyMaterial {
    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(SecretBox::new(Box::new(bytes)))
    }

    /// Expose the raw key for cipher calls.
    pub fn bytes(&self) -> &[u8; 32] {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyMaterial([REDACTED])")
    }
}

/// Construction parameters for [`EncryptionGateway`].
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Whether payloads are encrypted; when false every batch passes through.
    pub enabled: bool,
    /// Secret version requested when resolving keys.
    pub secret_version: String,
    /// Optional region hint forwarded to the store.
    pub region: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            secret_version: "latest".to_string(),
            region: None,
        }
    }
}

/// Decrypts and encrypts request payloads under named keys.
///
/// Keys are resolved from the [`SecretStore`] on first use and cached for the
/// process lifetime; [`EncryptionGateway::clear_key_cache`] drops the cache so
/// rotated keys get re-resolved. In pass-through mode (`enabled: false`) the
/// batch operations return their inputs unchanged and never touch the store.
///
/// Batches are all-or-nothing: the first element that fails aborts the whole
/// call and the error names the failing index.
pub struct EncryptionGateway {
    enabled: bool,
    secret_version: String,
    region: Option<String>,
    store: Arc<dyn SecretStore>,
    keys: DashMap<String, Arc<KeyMaterial>>,
}

impl EncryptionGateway {
    /// Gateway over `store` with the given configuration.
    pub fn new(config: GatewayConfig, store: Arc<dyn SecretStore>) -> Self {
        Self {
            enabled: config.enabled,
            secret_version: config.secret_version,
            region: config.region,
            store,
            keys: DashMap::new(),
        }
    }

    /// Whether payload encryption is active.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Decrypt a batch of envelopes under the named key, preserving order.
    pub fn decrypt_batch(&self, key_name: &str, items: &[String]) -> Result<Vec<String>> {
        if !self.enabled {
            return Ok(items.to_vec());
        }
        let key = self.resolve_key(key_name)?;
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let plaintext = cipher::decrypt(item, key.bytes()).map_err(|e| at_index(i, e))?;
            out.push(plaintext);
        }
        Ok(out)
    }

    /// Encrypt a batch of plaintexts under the named key, preserving order.
    pub fn encrypt_batch(&self, key_name: &str, items: &[String]) -> Result<Vec<String>> {
        if !self.enabled {
            return Ok(items.to_vec());
        }
        let key = self.resolve_key(key_name)?;
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let envelope = cipher::encrypt(item, key.bytes()).map_err(|e| at_index(i, e))?;
            out.push(envelope);
        }
        Ok(out)
    }

    /// Drop every cached key so the next use re-resolves from the store.
    pub fn clear_key_cache(&self) {
        self.keys.clear();
        debug!("encryption key cache cleared");
    }

    /// Number of keys currently cached.
    pub fn cached_key_count(&self) -> usize {
        self.keys.len()
    }

    fn resolve_key(&self, key_name: &str) -> Result<Arc<KeyMaterial>> {
        if let Some(cached) = self.keys.get(key_name) {
            return Ok(Arc::clone(&cached));
        }
        let payload = self
            .store
            .get_secret(key_name, &self.secret_version, self.region.as_deref())
            .map_err(|e| SecretError::KeyResolution {
                key_name: key_name.to_string(),
                message: e.to_string(),
            })?;
        let material = Arc::new(parse_key_material(key_name, &payload)?);
        // Racing resolvers may both hit the store; the payloads are identical
        // so last insert wins.
        let _ = self.keys.insert(key_name.to_string(), Arc::clone(&material));
        debug!(key_name, "encryption key resolved and cached");
        Ok(material)
    }
}

/// Parse a secret payload into key material.
///
/// Accepts a raw 32-byte payload or the base64 encoding of 32 bytes.
fn parse_key_material(key_name: &str, payload: &str) -> Result<KeyMaterial> {
    let raw = payload.as_bytes();
    if raw.len() == 32 {
        let mut key = [0u8; 32];
        key.copy_from_slice(raw);
        return Ok(KeyMaterial::new(key));
    }
    let decoded = base64::Engine::decode(
        &base64::engine::general_purpose::STANDARD,
        payload.trim(),
    )
    .map_err(|_| SecretError::InvalidKeyMaterial {
        key_name: key_name.to_string(),
    })?;
    if decoded.len() != 32 {
        return Err(SecretError::InvalidKeyMaterial {
            key_name: key_name.to_string(),
        });
    }
    let mut key = [0u8; 32];
    key.copy_from_slice(&decoded);
    Ok(KeyMaterial::new(key))
}

fn at_index(index: usize, err: SecretError) -> SecretError {
    match err {
        SecretError::DecryptionFailed(reason) => {
            SecretError::DecryptionFailed(format!("item {index}: {reason}"))
        }
        SecretError::EncryptionFailed(reason) => {
            SecretError::EncryptionFailed(format!("item {index}: {reason}"))
        }
        other => other,
    }
}

/// Resolve the encryption toggle from a status secret.
///
/// The payload is parsed with the strict boolean grammar shared with the
/// settings loader (`true`/`1`/`yes`/`on`, `false`/`0`/`no`/`off`). A missing
/// secret or a non-boolean payload disables encryption instead of failing
/// startup.
pub fn resolve_encryption_status(
    store: &dyn SecretStore,
    secret_id: &str,
    version: &str,
    region: Option<&str>,
) -> bool {
    match store.get_secret(secret_id, version, region) {
        Ok(payload) => match parse_bool(payload.trim()) {
            Some(enabled) => enabled,
            None => {
                warn!(secret_id, "encryption status secret is not a boolean, disabling");
                false
            }
        },
        Err(e) => {
            warn!(secret_id, error = %e, "encryption status secret unavailable, disabling");
            false
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
