use metrics::{Counter, Histogram};
use metrics_derive::Metrics;

/// Metrics for the bidding service.
/// Conventions:
/// - Durations are recorded in seconds (histograms).
/// - Counters are monotonic event counts.
#[derive(Metrics, Clone)]
#[metrics(scope = "ba_bidding")]
pub struct Metrics {
    #[metric(describe = "Duration of one GenerateBids request")]
    pub generate_bids_duration: Histogram,

    #[metric(describe = "Duration of generateBid batch execution")]
    pub js_execution_duration: Histogram,

    #[metric(describe = "Total GenerateBids requests that failed")]
    pub generate_bids_failures_total: Counter,

    #[metric(describe = "Bids returned per request")]
    pub bids_returned: Histogram,
}
