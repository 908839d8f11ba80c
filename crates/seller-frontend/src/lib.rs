//! Seller front end: terminates the client's encrypted SelectAd request,
//! fans out to the buyer front ends, scores the surviving bids and returns
//! a single padded, encrypted auction result.

/// Per-buyer and auction clients.
pub mod clients;

/// Fan-out accounting.
pub mod bid_stats;

/// The SelectAd orchestrator.
pub mod reactor;

/// gRPC service implementation.
pub mod service;

/// Prometheus metrics for the seller front end.
pub mod metrics;

use std::net::{IpAddr, SocketAddr};

use ba_common::logger::{LogFormat, LogLevel};
use clap::Parser;
use url::Url;

/// Configuration for the seller front end.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Address to bind the gRPC server to
    #[arg(long, env = "SFE_ADDRESS", default_value = "0.0.0.0")]
    pub address: IpAddr,

    /// Port to bind the gRPC server to
    #[arg(long, env = "SFE_PORT", default_value = "50053")]
    pub port: u16,

    /// Seller origin this front end serves
    #[arg(long, env = "SELLER_ORIGIN_DOMAIN")]
    pub seller_origin_domain: String,

    /// URL of the auction service
    #[arg(long, env = "AUCTION_SERVER_ADDR")]
    pub auction_server_addr: Url,

    /// Hex-encoded public key of the auction service envelope
    #[arg(long, env = "AUCTION_PUBLIC_KEY_HEX")]
    pub auction_public_key_hex: String,

    /// Envelope key id of the auction service key
    #[arg(long, env = "AUCTION_PUBLIC_KEY_ID", default_value = "1")]
    pub auction_public_key_id: u8,

    /// Buyer front ends as comma-separated `origin=url#pubkeyhex:id` entries
    #[arg(long, env = "BUYER_SERVER_ADDRS", value_delimiter = ',')]
    pub buyer_server_addrs: Vec<String>,

    /// Base URL of the seller key-value service
    #[arg(long, env = "SELLER_KV_SERVER_ADDR")]
    pub seller_kv_server_addr: Url,

    /// Default deadline for one buyer GetBids call in milliseconds
    #[arg(long, env = "GET_BID_RPC_TIMEOUT_MS", default_value = "1000")]
    pub get_bid_rpc_timeout_ms: u64,

    /// Deadline for the ScoreAds call in milliseconds
    #[arg(long, env = "SCORE_ADS_RPC_TIMEOUT_MS", default_value = "1000")]
    pub score_ads_rpc_timeout_ms: u64,

    /// Deadline for the scoring signals fetch in milliseconds
    #[arg(long, env = "KEY_VALUE_SIGNALS_FETCH_RPC_TIMEOUT_MS", default_value = "1000")]
    pub key_value_signals_fetch_rpc_timeout_ms: u64,

    /// Timeout for debug-reporting pings in milliseconds
    #[arg(long, env = "DEBUG_REPORTING_TIMEOUT_MS", default_value = "1000")]
    pub debug_reporting_timeout_ms: u64,

    /// Stop decoding at the first client-visible defect
    #[arg(long, env = "SFE_FAIL_FAST", default_value = "false")]
    pub fail_fast: bool,

    /// Envelope handling for requests/responses; this build requires it on
    #[arg(long, env = "ENABLE_ENCRYPTION", default_value = "true")]
    pub enable_encryption: bool,

    /// Emit consented-debug logs through the logging pipeline
    #[arg(long, env = "ENABLE_OTEL_BASED_LOGGING", default_value = "false")]
    pub enable_otel_based_logging: bool,

    /// Accept protected app signals bids (not supported by this build)
    #[arg(long, env = "ENABLE_PROTECTED_APP_SIGNALS", default_value = "false")]
    pub enable_protected_app_signals: bool,

    /// Secret token un-gating verbose logs for consented requests
    #[arg(long, env = "CONSENTED_DEBUG_TOKEN", default_value = "")]
    pub consented_debug_token: String,

    /// Envelope key id served by this process
    #[arg(long, env = "SFE_KEY_ID", default_value = "1")]
    pub key_id: u8,

    /// Hex-encoded X25519 private key for the envelope
    #[arg(long, env = "SFE_PRIVATE_KEY_HEX")]
    pub private_key_hex: String,

    /// Port to bind the Prometheus metrics server to
    #[arg(long, env = "SFE_METRICS_ADDR", default_value = "0.0.0.0:9002")]
    pub metrics_addr: SocketAddr,

    /// Log verbosity level
    #[arg(long, env = "SFE_LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Log output format (pretty or json)
    #[arg(long, env = "SFE_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,
}
