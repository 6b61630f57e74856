//! Settings schema.
//!
//! All structs use camelCase serde naming and `#[serde(default)]` so a
//! profile file only needs to carry the keys it overrides.

use serde::{Deserialize, Serialize};

/// Top-level settings for the embedgate service.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Embedding model and reload policy.
    pub model: ModelSettings,
    /// Field-level encryption settings.
    pub encryption: EncryptionSettings,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// HTTP listener settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Overall per-request deadline for embedding calls, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 300,
        }
    }
}

/// Which embedding backend to construct at startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Deterministic hash-based backend (no native dependencies).
    #[default]
    Mock,
    /// ONNX Runtime backend (requires the `ort` cargo feature).
    Onnx,
}

/// Which model to serve and how to refresh it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelSettings {
    /// Model identifier passed to the backend's load call.
    pub name: String,
    /// Backend implementation to use.
    pub backend: BackendKind,
    /// Background reload policy.
    pub reload: ReloadSettings,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            name: "hkunlp/instructor-xl".to_string(),
            backend: BackendKind::default(),
            reload: ReloadSettings::default(),
        }
    }
}

/// Scheduled model reload settings.
///
/// Disabled in the shipped configuration; the reload task is only spawned
/// when `enabled` is true.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReloadSettings {
    /// Whether the background reload timer runs.
    pub enabled: bool,
    /// Seconds between scheduled reloads.
    pub interval_secs: u64,
}

impl Default for ReloadSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 3600,
        }
    }
}

/// Field-level encryption settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EncryptionSettings {
    /// Whether request payloads are encrypted.
    pub enabled: bool,
    /// Named key used to decrypt request payloads.
    pub key_name: String,
    /// Optional secret id that overrides `enabled` at startup when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_secret: Option<String>,
    /// Secret version requested from the store.
    pub secret_version: String,
    /// Optional region hint forwarded to the secret store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl Default for EncryptionSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            key_name: "embeddings_encryption_key".to_string(),
            status_secret: None,
            secret_version: "latest".to_string(),
            region: None,
        }
    }
}

/// Logging settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default log level when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON-formatted log lines instead of human-readable ones.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
