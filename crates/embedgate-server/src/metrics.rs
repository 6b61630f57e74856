//! Prometheus recorder install and text rendering for `/metrics`.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the process-global Prometheus recorder.
///
/// Call once during startup, before the first metric is emitted. The
/// returned handle renders the scrape payload for `/metrics`.
pub fn install_recorder() -> PrometheusHandle {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install metrics recorder");
    info!("prometheus recorder installed");
    handle
}

/// Render the current scrape payload in Prometheus text format.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

// Metric names, defined in one place so dashboards and alerts can rely
// on them.

/// Requests received (counter, labels: endpoint).
pub const REQUESTS_TOTAL: &str = "embedgate_requests_total";
/// Requests that returned an error (counter, labels: endpoint).
pub const REQUEST_ERRORS_TOTAL: &str = "embedgate_request_errors_total";
/// Texts embedded across all batches (counter).
pub const TEXTS_ENCODED_TOTAL: &str = "embedgate_texts_encoded_total";
/// End-to-end encode latency (histogram, labels: endpoint).
pub const ENCODE_DURATION_SECONDS: &str = "embedgate_encode_duration_seconds";
/// Model reload attempts (counter, labels: outcome).
pub const RELOADS_TOTAL: &str = "embedgate_reloads_total";
/// Model reload latency (histogram).
pub const RELOAD_DURATION_SECONDS: &str = "embedgate_reload_duration_seconds";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_recorder_renders() {
        // Local recorder, not the global install, so tests stay independent.
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let payload = handle.render();
        // Nothing recorded yet, so the payload has no samples.
        assert!(!payload.contains("embedgate_"));
    }

    #[test]
    fn metric_names_share_service_prefix() {
        let names = [
            REQUESTS_TOTAL,
            REQUEST_ERRORS_TOTAL,
            TEXTS_ENCODED_TOTAL,
            ENCODE_DURATION_SECONDS,
            RELOADS_TOTAL,
            RELOAD_DURATION_SECONDS,
        ];
        for name in names {
            assert!(name.starts_with("embedgate_"), "unprefixed metric '{name}'");
            assert!(name.chars().all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }
}
