//! Cross-service metrics helpers.
//!
//! Conventions:
//! - Durations are recorded in seconds (histograms).
//! - Counters are monotonic event counts.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics_exporter_prometheus::PrometheusBuilder;

/// Callee labels for initiated requests.
pub const CALLEE_BFE: &str = "bfe";
pub const CALLEE_BIDDING: &str = "bs";
pub const CALLEE_AUCTION: &str = "as";
pub const CALLEE_KV: &str = "kv";

/// Installs the Prometheus exporter with an HTTP listener on `addr`.
pub fn init_prometheus_exporter(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus exporter: {e}"))
}

/// Stopwatch for one outgoing request; records duration, payload size and
/// outcome tagged by callee when finished.
#[must_use = "call finish() to record the request"]
pub struct InitiatedRequest {
    callee: &'static str,
    request_bytes: usize,
    start: Instant,
}

impl InitiatedRequest {
    pub fn start(callee: &'static str, request_bytes: usize) -> Self {
        Self { callee, request_bytes, start: Instant::now() }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn finish(self, success: bool) {
        metrics::histogram!("ba_initiated_request_duration_seconds", "callee" => self.callee)
            .record(self.start.elapsed().as_secs_f64());
        metrics::histogram!("ba_initiated_request_bytes", "callee" => self.callee)
            .record(self.request_bytes as f64);
        metrics::counter!(
            "ba_initiated_request_total",
            "callee" => self.callee,
            "success" => if success { "true" } else { "false" },
        )
        .increment(1);
    }
}
