use metrics::{Counter, Histogram};
use metrics_derive::Metrics;

/// Metrics for the buyer front end.
/// Conventions:
/// - Durations are recorded in seconds (histograms).
/// - Counters are monotonic event counts.
#[derive(Metrics, Clone)]
#[metrics(scope = "ba_buyer_frontend")]
pub struct Metrics {
    #[metric(describe = "Duration of one GetBids request")]
    pub get_bids_duration: Histogram,

    #[metric(describe = "Total bidding-signal fetches that failed")]
    pub signal_fetch_failures_total: Counter,

    #[metric(describe = "Bids returned per request")]
    pub bids_returned: Histogram,
}
