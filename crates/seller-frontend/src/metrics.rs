use metrics::{Counter, Histogram};
use metrics_derive::Metrics;

/// Metrics for the seller front end.
/// Conventions:
/// - Durations are recorded in seconds (histograms).
/// - Counters are monotonic event counts.
#[derive(Metrics, Clone)]
#[metrics(scope = "ba_seller_frontend")]
pub struct Metrics {
    #[metric(describe = "Duration of one SelectAd request")]
    pub select_ad_duration: Histogram,

    #[metric(describe = "Total SelectAd requests that failed")]
    pub select_ad_failures_total: Counter,
}
