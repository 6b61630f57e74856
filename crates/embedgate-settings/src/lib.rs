//! # embedgate-settings
//!
//! Layered configuration for the embedgate service.
//!
//! A [`Settings`] value starts from compiled defaults, merges the
//! `config/{environment}.json` profile over them, and lets `PORT` and
//! `EMBEDGATE_*` environment variables trump both. Loading happens once,
//! in the binary, and the value is passed to whoever needs it; there is
//! no process-global settings singleton to reach for.
//!
//! ```no_run
//! fn main() -> Result<(), embedgate_settings::SettingsError> {
//!     let settings = embedgate_settings::load_settings()?;
//!     println!("listening on port {}", settings.server.port);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    DEFAULT_ENVIRONMENT, config_dir, config_path, environment, load_settings,
    load_settings_from_path, merge_profile,
};
pub use types::*;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_root_reexports() {
        let _settings = Settings::default();
        let _path = config_path(std::path::Path::new("."), DEFAULT_ENVIRONMENT);
    }

    #[test]
    fn merge_profile_reachable_from_root() {
        let mut tree = serde_json::json!({"keep": 1});
        merge_profile(&mut tree, serde_json::json!({"add": 2}));
        assert_eq!(tree["keep"], 1);
        assert_eq!(tree["add"], 2);
    }

    #[test]
    fn defaults_match_deployment_contract() {
        let settings = Settings::default();
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.request_timeout_secs, 300);
        assert_eq!(settings.model.name, "hkunlp/instructor-xl");
        assert_eq!(settings.model.backend, BackendKind::Mock);
        assert!(!settings.model.reload.enabled);
        assert_eq!(settings.model.reload.interval_secs, 3600);
        assert!(!settings.encryption.enabled);
        assert_eq!(settings.encryption.key_name, "embeddings_encryption_key");
        assert_eq!(settings.logging.level, "info");
    }
}
