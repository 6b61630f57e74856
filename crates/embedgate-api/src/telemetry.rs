//! Tracing subscriber setup.
//!
//! Output format follows [`LoggingSettings`]: compact human-readable lines by
//! default, one JSON object per line when `logging.json` is set. `RUST_LOG`
//! overrides the configured level when present.

use embedgate_settings::LoggingSettings;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global tracing subscriber.
///
/// Safe to call more than once; only the first call wins.
pub fn init(settings: &LoggingSettings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));

    let json_layer = settings
        .json
        .then(|| tracing_subscriber::fmt::layer().json().with_target(true));
    let plain_layer = (!settings.json)
        .then(|| tracing_subscriber::fmt::layer().with_target(true).compact());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(plain_layer)
        .try_init();
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_does_not_panic() {
        // Repeated calls are safe: try_init is a no-op after the first
        init(&LoggingSettings::default());
        init(&LoggingSettings {
            level: "debug".to_string(),
            json: true,
        });
    }
}
