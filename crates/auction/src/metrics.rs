use metrics::{Counter, Histogram};
use metrics_derive::Metrics;

/// Metrics for the auction service.
/// Conventions:
/// - Durations are recorded in seconds (histograms).
/// - Counters are monotonic event counts.
#[derive(Metrics, Clone)]
#[metrics(scope = "ba_auction")]
pub struct Metrics {
    #[metric(describe = "Duration of one ScoreAds request")]
    pub score_ads_duration: Histogram,

    #[metric(describe = "Duration of scoreAd batch execution")]
    pub js_execution_duration: Histogram,

    #[metric(describe = "Total ScoreAds requests that failed")]
    pub score_ads_failures_total: Counter,

    #[metric(describe = "Total auctions that produced no winner")]
    pub chaff_responses_total: Counter,
}
