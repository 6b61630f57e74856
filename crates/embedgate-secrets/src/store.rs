//! Secret store backends.
//!
//! Production deployments point the trait at whatever holds their secrets;
//! the in-tree backends read process environment variables (container
//! injection) or an in-memory map (tests, local development).

use dashmap::DashMap;
use tracing::debug;

use crate::errors::{Result, SecretError};

/// Read access to named secrets.
///
/// `version` selects a secret revision where the backing store supports it;
/// `region` is an opaque routing hint for multi-region deployments. Backends
/// without those concepts ignore both.
pub trait SecretStore: Send + Sync {
    /// Fetch the string payload of a secret.
    fn get_secret(&self, secret_id: &str, version: &str, region: Option<&str>) -> Result<String>;
}

/// Secret store backed by process environment variables.
///
/// A secret id maps to `{prefix}{ID}` with the id uppercased and every
/// non-alphanumeric character replaced by an underscore, so
/// `embeddings_encryption_key` reads `EMBEDGATE_SECRET_EMBEDDINGS_ENCRYPTION_KEY`.
/// Environment variables have no revisions, so `version` and `region` are
/// ignored.
pub struct EnvSecretStore {
    prefix: String,
}

impl EnvSecretStore {
    /// Store reading `EMBEDGATE_SECRET_*` variables.
    pub fn new() -> Self {
        Self::with_prefix("EMBEDGATE_SECRET_")
    }

    /// Store reading variables under a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn var_name(&self, secret_id: &str) -> String {
        let mapped: String = secret_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}{mapped}", self.prefix)
    }
}

impl Default for EnvSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretStore for EnvSecretStore {
    fn get_secret(
        &self,
        secret_id: &str,
        version: &str,
        region: Option<&str>,
    ) -> Result<String> {
        if version != "latest" || region.is_some() {
            debug!(secret_id, version, ?region, "env store ignores version and region");
        }
        let name = self.var_name(secret_id);
        match std::env::var(&name) {
            Ok(value) if !value.is_empty() => Ok(value),
            Ok(_) | Err(std::env::VarError::NotPresent) => {
                Err(SecretError::NotFound(secret_id.to_string()))
            }
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::Store(format!(
                "environment variable {name} is not valid UTF-8"
            ))),
        }
    }
}

/// In-memory secret store for tests and local development.
#[derive(Default)]
pub struct MemorySecretStore {
    secrets: DashMap<String, String>,
}

impl MemorySecretStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a secret payload.
    pub fn insert(&self, secret_id: impl Into<String>, payload: impl Into<String>) {
        let _ = self.secrets.insert(secret_id.into(), payload.into());
    }
}

impl SecretStore for MemorySecretStore {
    fn get_secret(
        &self,
        secret_id: &str,
        _version: &str,
        _region: Option<&str>,
    ) -> Result<String> {
        self.secrets
            .get(secret_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SecretError::NotFound(secret_id.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn env_var_name_mapping() {
        let store = EnvSecretStore::new();
        assert_eq!(
            store.var_name("embeddings_encryption_key"),
            "EMBEDGATE_SECRET_EMBEDDINGS_ENCRYPTION_KEY"
        );
        assert_eq!(
            store.var_name("tenant-key.v2"),
            "EMBEDGATE_SECRET_TENANT_KEY_V2"
        );
    }

    #[test]
    fn env_store_missing_secret() {
        let store = EnvSecretStore::with_prefix("EMBEDGATE_TEST_NO_SUCH_PREFIX_");
        let err = store.get_secret("anything", "latest", None).unwrap_err();
        assert_matches!(err, SecretError::NotFound(id) => {
            assert_eq!(id, "anything");
        });
    }

    /// SAFETY: env var mutation is inherently racy in multi-threaded tests.
    /// The variable name is unique to this test and removed before it ends.
    #[cfg(unix)]
    #[test]
    fn env_store_rejects_non_unicode_value() {
        use std::os::unix::ffi::OsStrExt;

        let name = "EMBEDGATE_TEST_BADUTF8_SECRET";
        unsafe { std::env::set_var(name, std::ffi::OsStr::from_bytes(&[0xff, 0xfe])) };
        let store = EnvSecretStore::with_prefix("EMBEDGATE_TEST_BADUTF8_");
        let err = store.get_secret("secret", "latest", None).unwrap_err();
        unsafe { std::env::remove_var(name) };
        assert_matches!(err, SecretError::Store(_));
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemorySecretStore::new();
        store.insert("api_token", "s3cret");
        let payload = store.get_secret("api_token", "latest", None).unwrap();
        assert_eq!(payload, "s3cret");
    }

    #[test]
    fn memory_store_ignores_version_and_region() {
        let store = MemorySecretStore::new();
        store.insert("api_token", "s3cret");
        let payload = store.get_secret("api_token", "7", Some("de")).unwrap();
        assert_eq!(payload, "s3cret");
    }

    #[test]
    fn memory_store_missing_secret() {
        let store = MemorySecretStore::new();
        assert!(store.get_secret("absent", "latest", None).is_err());
    }

    #[test]
    fn memory_store_insert_replaces() {
        let store = MemorySecretStore::new();
        store.insert("k", "old");
        store.insert("k", "new");
        assert_eq!(store.get_secret("k", "latest", None).unwrap(), "new");
    }
}
