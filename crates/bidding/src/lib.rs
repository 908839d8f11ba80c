//! Bidding service: executes buyer `generateBid` code inside the sandboxed
//! dispatcher for every interest group of a request.

/// Core request handling.
pub mod reactor;

/// gRPC service implementation.
pub mod service;

/// Prometheus metrics for the bidding service.
pub mod metrics;

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use ba_common::logger::{LogFormat, LogLevel};
use clap::Parser;

/// Configuration for the bidding service.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Address to bind the gRPC server to
    #[arg(long, env = "BIDDING_ADDRESS", default_value = "0.0.0.0")]
    pub address: IpAddr,

    /// Port to bind the gRPC server to
    #[arg(long, env = "BIDDING_PORT", default_value = "50057")]
    pub port: u16,

    /// Path to the buyer-provided generateBid JavaScript
    #[arg(long, env = "BUYER_JS_PATH")]
    pub buyer_js_path: PathBuf,

    /// Optional path to a buyer WASM helper module
    #[arg(long, env = "BUYER_WASM_PATH")]
    pub buyer_wasm_path: Option<PathBuf>,

    /// Wrap the buyer code with the dispatch entry function
    #[arg(long, env = "ENABLE_BUYER_CODE_WRAPPER", default_value = "true")]
    pub enable_buyer_code_wrapper: bool,

    /// Capture console output from ad tech code
    #[arg(long, env = "ENABLE_ADTECH_CODE_LOGGING", default_value = "false")]
    pub enable_adtech_code_logging: bool,

    /// Allow generateBid to register debug win/loss URLs
    #[arg(long, env = "ENABLE_BUYER_DEBUG_URL_GENERATION", default_value = "false")]
    pub enable_buyer_debug_url_generation: bool,

    /// Number of sandboxed engine workers
    #[arg(long, env = "JS_NUM_WORKERS", default_value = "4")]
    pub js_num_workers: usize,

    /// Dispatch queue length shared by the workers
    #[arg(long, env = "JS_WORKER_QUEUE_LEN", default_value = "64")]
    pub js_worker_queue_len: usize,

    /// Per-dispatch timeout in milliseconds
    #[arg(long, env = "ROMA_TIMEOUT_MS", default_value = "500")]
    pub roma_timeout_ms: u64,

    /// Deadline for one generateBid batch in milliseconds
    #[arg(long, env = "GENERATE_BID_TIMEOUT_MS", default_value = "1000")]
    pub generate_bid_timeout_ms: u64,

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
    #[arg(long, env = "BIDDING_KEY_ID", default_value = "1")]
    pub key_id: u8,

    /// Hex-encoded X25519 private key for the envelope
    #[arg(long, env = "BIDDING_PRIVATE_KEY_HEX")]
    pub private_key_hex: String,

    /// Port to bind the Prometheus metrics server to
    #[arg(long, env = "BIDDING_METRICS_ADDR", default_value = "0.0.0.0:9004")]
    pub metrics_addr: SocketAddr,

    /// Log verbosity level
    #[arg(long, env = "BIDDING_LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Log output format (pretty or json)
    #[arg(long, env = "BIDDING_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,
}
