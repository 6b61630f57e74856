//! Liveness report for `GET /health`.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Payload returned by the health probe.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// `"ok"` whenever the process can answer at all.
    pub status: String,
    /// Model currently serving traffic.
    pub model: String,
    /// Publish time of the serving model handle.
    pub loaded_at: DateTime<Utc>,
    /// Whole seconds since process start.
    pub uptime_secs: u64,
    /// Crate version baked in at compile time.
    pub version: String,
}

impl HealthResponse {
    /// Snapshot liveness from the published model handle.
    pub fn snapshot(
        model: impl Into<String>,
        loaded_at: DateTime<Utc>,
        started_at: Instant,
        version: impl Into<String>,
    ) -> Self {
        Self {
            status: "ok".to_string(),
            model: model.into(),
            loaded_at,
            uptime_secs: started_at.elapsed().as_secs(),
            version: version.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sample(started_at: Instant) -> HealthResponse {
        HealthResponse::snapshot("hkunlp/instructor-xl", Utc::now(), started_at, "0.1.0")
    }

    #[test]
    fn reports_ok() {
        assert_eq!(sample(Instant::now()).status, "ok");
    }

    #[test]
    fn fresh_process_reports_no_uptime() {
        assert!(sample(Instant::now()).uptime_secs <= 1);
    }

    #[test]
    fn uptime_counts_whole_seconds() {
        let five_minutes_ago = Instant::now().checked_sub(Duration::from_secs(300)).unwrap();
        let resp = sample(five_minutes_ago);
        assert!((299..=301).contains(&resp.uptime_secs));
    }

    #[test]
    fn payload_has_expected_keys() {
        let json = serde_json::to_value(sample(Instant::now())).unwrap();
        for key in ["status", "model", "loaded_at", "uptime_secs", "version"] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(json["model"], "hkunlp/instructor-xl");
        assert_eq!(json["version"], "0.1.0");
    }

    #[test]
    fn loaded_at_serializes_as_timestamp() {
        let json = serde_json::to_value(sample(Instant::now())).unwrap();
        let ts = json["loaded_at"].as_str().unwrap();
        assert!(ts.contains('T'), "not a timestamp: {ts}");
    }
}
