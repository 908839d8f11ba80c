//! Auction service: scores candidate bids with seller `scoreAd` code,
//! selects the winner and generates reporting URLs.

/// Core request handling.
pub mod reactor;

/// Reporting dispatch for the winning ad.
pub mod reporting;

/// gRPC service implementation.
pub mod service;

/// Prometheus metrics for the auction service.
pub mod metrics;

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use ba_common::logger::{LogFormat, LogLevel};
use clap::Parser;

/// Configuration for the auction service.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Address to bind the gRPC server to
    #[arg(long, env = "AUCTION_ADDRESS", default_value = "0.0.0.0")]
    pub address: IpAddr,

    /// Port to bind the gRPC server to
    #[arg(long, env = "AUCTION_PORT", default_value = "50061")]
    pub port: u16,

    /// Path to the seller-provided scoreAd/reportResult JavaScript
    #[arg(long, env = "SELLER_JS_PATH")]
    pub seller_js_path: PathBuf,

    /// Capture console output from ad tech code
    #[arg(long, env = "ENABLE_ADTECH_CODE_LOGGING", default_value = "false")]
    pub enable_adtech_code_logging: bool,

    /// Allow scoreAd to register debug win/loss URLs
    #[arg(long, env = "ENABLE_SELLER_DEBUG_URL_GENERATION", default_value = "false")]
    pub enable_seller_debug_url_generation: bool,

    /// Dispatch reportResult for the winning ad
    #[arg(long, env = "ENABLE_REPORT_RESULT_URL_GENERATION", default_value = "false")]
    pub enable_report_result_url_generation: bool,

    /// Dispatch the per-buyer reportWin wrapper for the winning ad
    #[arg(long, env = "ENABLE_REPORT_WIN_URL_GENERATION", default_value = "false")]
    pub enable_report_win_url_generation: bool,

    /// Number of sandboxed engine workers
    #[arg(long, env = "JS_NUM_WORKERS", default_value = "4")]
    pub js_num_workers: usize,

    /// Dispatch queue length shared by the workers
    #[arg(long, env = "JS_WORKER_QUEUE_LEN", default_value = "64")]
    pub js_worker_queue_len: usize,

    /// Per-dispatch timeout in milliseconds
    #[arg(long, env = "ROMA_TIMEOUT_MS", default_value = "500")]
    pub roma_timeout_ms: u64,

    /// Deadline for one scoreAd batch in milliseconds
    #[arg(long, env = "SCORE_ADS_TIMEOUT_MS", default_value = "1000")]
    pub score_ads_timeout_ms: u64,

    /// Timeout for debug-reporting pings in milliseconds
    #[arg(long, env = "DEBUG_REPORTING_TIMEOUT_MS", default_value = "1000")]
    pub debug_reporting_timeout_ms: u64,

    /// Envelope handling for requests/responses; this build requires it on
    #[arg(long, env = "ENABLE_ENCRYPTION", default_value = "true")]
    pub enable_encryption: bool,

    /// Emit consented-debug logs through the logging pipeline
    #[arg(long, env = "ENABLE_OTEL_BASED_LOGGING", default_value = "false")]
    pub enable_otel_based_logging: bool,

    /// Secret token un-gating verbose logs for consented requests
    #[arg(long, env = "CONSENTED_DEBUG_TOKEN", default_value = "")]
    pub consented_debug_token: String,

    /// Envelope key id served by this process
    #[arg(long, env = "AUCTION_KEY_ID", default_value = "1")]
    pub key_id: u8,

    /// Hex-encoded X25519 private key for the envelope
    #[arg(long, env = "AUCTION_PRIVATE_KEY_HEX")]
    pub private_key_hex: String,

    /// Port to bind the Prometheus metrics server to
    #[arg(long, env = "AUCTION_METRICS_ADDR", default_value = "0.0.0.0:9005")]
    pub metrics_addr: SocketAddr,

    /// Log verbosity level
    #[arg(long, env = "AUCTION_LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Log output format (pretty or json)
    #[arg(long, env = "AUCTION_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,
}
