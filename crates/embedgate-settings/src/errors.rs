//! Failure modes of settings loading.

use thiserror::Error;

/// Errors raised while loading a settings profile.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The profile file exists but could not be read.
    #[error("could not read settings profile: {0}")]
    Io(#[from] std::io::Error),
    /// The profile file is not valid JSON.
    #[error("settings profile is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A loaded value fails validation.
    #[error("rejected settings value: {0}")]
    InvalidValue(String),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_keeps_source_message() {
        let err: SettingsError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked down").into();
        assert!(matches!(err, SettingsError::Io(_)));
        assert!(err.to_string().contains("locked down"));
    }

    #[test]
    fn json_error_converts_from_serde() {
        let parse_err = serde_json::from_str::<serde_json::Value>("]").unwrap_err();
        let err: SettingsError = parse_err.into();
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn invalid_value_names_the_field() {
        let err = SettingsError::InvalidValue("model.name must not be empty".to_string());
        assert_eq!(
            err.to_string(),
            "rejected settings value: model.name must not be empty"
        );
    }
}
