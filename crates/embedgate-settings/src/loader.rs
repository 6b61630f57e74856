//! Layered settings loading.
//!
//! A [`Settings`] value is assembled from three layers. Compiled defaults
//! come first, a `config/{environment}.json` profile is merged over them,
//! and `PORT`/`EMBEDGATE_*` environment variables win over both. The
//! merged tree is validated before it is handed out, so a process never
//! starts on settings it cannot run.
//!
//! Profile merging is per-key and recursive. Objects combine field by
//! field, scalars and arrays replace the default wholesale, and explicit
//! `null`s leave the default in place.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{Result, SettingsError};
use crate::types::{BackendKind, Settings};

/// Default deployment environment when `ENVIRONMENT` is unset.
pub const DEFAULT_ENVIRONMENT: &str = "prd";

/// Resolve the deployment environment name from `ENVIRONMENT`.
pub fn environment() -> String {
    std::env::var("ENVIRONMENT")
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
}

/// Resolve the path of the profile file for `env` under `base_dir`.
pub fn config_path(base_dir: &Path, env: &str) -> PathBuf {
    base_dir.join("config").join(format!("{env}.json"))
}

/// Resolve the profile directory from `EMBEDGATE_CONFIG_DIR`.
///
/// Defaults to the working directory when unset.
pub fn config_dir() -> PathBuf {
    std::env::var("EMBEDGATE_CONFIG_DIR")
        .ok()
        .filter(|v| !v.is_empty())
        .map_or_else(|| PathBuf::from("."), PathBuf::from)
}

/// Load settings for the current environment with env var overrides.
pub fn load_settings() -> Result<Settings> {
    load_settings_from_path(&config_path(&config_dir(), &environment()))
}

/// Load settings from a specific profile file with env var overrides.
///
/// A missing profile is not an error; the defaults simply stand. A
/// profile that exists but does not parse is.
pub fn load_settings_from_path(path: &Path) -> Result<Settings> {
    let mut tree = serde_json::to_value(Settings::default())?;

    if path.exists() {
        debug!(?path, "merging settings profile");
        let profile: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        merge_profile(&mut tree, profile);
    } else {
        debug!(?path, "no settings profile, starting from defaults");
    }

    let mut settings: Settings = serde_json::from_value(tree)?;
    apply_env_overrides(&mut settings);
    validate(&settings)?;
    Ok(settings)
}

/// Merge a profile tree into `target`, per key and recursively.
///
/// Objects combine field by field. Anything else in the profile replaces
/// the target value wholesale, except `null`, which leaves the target
/// untouched so a profile can spell out keys without forcing them.
pub fn merge_profile(target: &mut Value, profile: Value) {
    match (target, profile) {
        (Value::Object(target_map), Value::Object(profile_map)) => {
            for (key, value) in profile_map {
                if value.is_null() {
                    continue;
                }
                if let Some(slot) = target_map.get_mut(&key) {
                    merge_profile(slot, value);
                } else {
                    let _ = target_map.insert(key, value);
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Reject settings combinations that would fail at runtime.
fn validate(settings: &Settings) -> Result<()> {
    if settings.model.name.trim().is_empty() {
        return Err(SettingsError::InvalidValue(
            "model.name must not be empty".to_string(),
        ));
    }
    // interval of zero would panic the reload timer
    if settings.model.reload.enabled && settings.model.reload.interval_secs == 0 {
        return Err(SettingsError::InvalidValue(
            "model.reload.intervalSecs must be at least 1 when reload is enabled".to_string(),
        ));
    }
    if settings.encryption.enabled && settings.encryption.key_name.trim().is_empty() {
        return Err(SettingsError::InvalidValue(
            "encryption.keyName must not be empty when encryption is enabled".to_string(),
        ));
    }
    Ok(())
}

/// Fold environment variable overrides into `settings`.
///
/// Overrides are best-effort: a value that fails to parse or falls
/// outside its range is logged and skipped rather than aborting startup.
pub fn apply_env_overrides(settings: &mut Settings) {
    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = env_number("PORT", 1..=65535) {
        settings.server.port = v;
    }
    if let Some(v) = env_var("EMBEDGATE_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = env_number("EMBEDGATE_REQUEST_TIMEOUT_SECS", 1..=3600) {
        settings.server.request_timeout_secs = v;
    }

    // ── Model ───────────────────────────────────────────────────────
    if let Some(v) = env_var("EMBEDGATE_MODEL_NAME") {
        settings.model.name = v;
    }
    if let Some(v) = env_var("EMBEDGATE_MODEL_BACKEND") {
        if let Ok(backend) = serde_json::from_value::<BackendKind>(Value::String(v)) {
            settings.model.backend = backend;
        }
    }
    if let Some(v) = env_bool("EMBEDGATE_RELOAD_ENABLED") {
        settings.model.reload.enabled = v;
    }
    if let Some(v) = env_number("EMBEDGATE_RELOAD_INTERVAL_SECS", 60..=86_400) {
        settings.model.reload.interval_secs = v;
    }

    // ── Encryption ──────────────────────────────────────────────────
    if let Some(v) = env_bool("EMBEDGATE_ENCRYPTION_ENABLED") {
        settings.encryption.enabled = v;
    }
    if let Some(v) = env_var("EMBEDGATE_KEY_NAME") {
        settings.encryption.key_name = v;
    }
    if let Some(v) = env_var("EMBEDGATE_STATUS_SECRET") {
        settings.encryption.status_secret = Some(v);
    }
    if let Some(v) = env_var("EMBEDGATE_SECRET_VERSION") {
        settings.encryption.secret_version = v;
    }
    if let Some(v) = env_var("EMBEDGATE_REGION") {
        settings.encryption.region = Some(v);
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = env_var("EMBEDGATE_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = env_bool("EMBEDGATE_LOG_JSON") {
        settings.logging.json = v;
    }
}

// ── Pure parsers (testable without touching the process env) ─────────────────

/// Interpret a human-entered boolean.
///
/// `true`/`1`/`yes`/`on` and `false`/`0`/`no`/`off` are accepted in any
/// case; anything else is `None`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse an integer and keep it only when it falls inside `range`.
pub fn parse_in_range<T>(val: &str, range: RangeInclusive<T>) -> Option<T>
where
    T: FromStr + PartialOrd,
{
    let n = val.parse::<T>().ok()?;
    range.contains(&n).then_some(n)
}

// ── Process env readers ──────────────────────────────────────────────────────

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
    let raw = env_var(name)?;
    let parsed = parse_bool(&raw);
    if parsed.is_none() {
        warn!(var = name, raw = %raw, "ignoring unparseable boolean override");
    }
    parsed
}

fn env_number<T>(name: &str, range: RangeInclusive<T>) -> Option<T>
where
    T: FromStr + PartialOrd,
{
    let raw = env_var(name)?;
    let parsed = parse_in_range(&raw, range);
    if parsed.is_none() {
        warn!(var = name, raw = %raw, "ignoring out-of-range override");
    }
    parsed
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
