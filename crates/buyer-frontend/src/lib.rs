//! Buyer front end: terminates the encrypted GetBids hop, fetches bidding
//! signals from the buyer key-value service, and dispatches bid generation.

/// Encrypted bidding service client.
pub mod bidding_client;

/// Request translation for the bidding service.
pub mod proto_factory;

/// The GetBids orchestrator.
pub mod service;

/// Prometheus metrics for the buyer front end.
pub mod metrics;

use std::net::{IpAddr, SocketAddr};

use ba_common::logger::{LogFormat, LogLevel};
use clap::Parser;
use url::Url;

/// Configuration for the buyer front end.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Address to bind the gRPC server to
    #[arg(long, env = "BFE_ADDRESS", default_value = "0.0.0.0")]
    pub address: IpAddr,

    /// Port to bind the gRPC server to
    #[arg(long, env = "BFE_PORT", default_value = "50051")]
    pub port: u16,

    /// URL of the bidding service
    #[arg(long, env = "BIDDING_SERVER_ADDR")]
    pub bidding_server_addr: Url,

    /// Hex-encoded public key of the bidding service envelope
    #[arg(long, env = "BIDDING_PUBLIC_KEY_HEX")]
    pub bidding_public_key_hex: String,

    /// Envelope key id of the bidding service key
    #[arg(long, env = "BIDDING_PUBLIC_KEY_ID", default_value = "1")]
    pub bidding_public_key_id: u8,

    /// Base URL of the buyer key-value service
    #[arg(long, env = "BUYER_KV_SERVER_ADDR")]
    pub buyer_kv_server_addr: Url,

    /// Timeout for the bidding signals fetch in milliseconds
    #[arg(long, env = "BIDDING_SIGNALS_LOAD_TIMEOUT_MS", default_value = "1000")]
    pub bidding_signals_load_timeout_ms: u64,

    /// Deadline for the GenerateBids call in milliseconds
    #[arg(long, env = "GENERATE_BID_TIMEOUT_MS", default_value = "1000")]
    pub generate_bid_timeout_ms: u64,

    /// Fail GetBids when the bidding signals fetch fails
    #[arg(long, env = "REQUIRE_BIDDING_SIGNALS", default_value = "true")]
    pub require_bidding_signals: bool,

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
    #[arg(long, env = "BFE_KEY_ID", default_value = "1")]
    pub key_id: u8,

    /// Hex-encoded X25519 private key for the envelope
    #[arg(long, env = "BFE_PRIVATE_KEY_HEX")]
    pub private_key_hex: String,

    /// Port to bind the Prometheus metrics server to
    #[arg(long, env = "BFE_METRICS_ADDR", default_value = "0.0.0.0:9003")]
    pub metrics_addr: SocketAddr,

    /// Log verbosity level
    #[arg(long, env = "BFE_LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Log output format (pretty or json)
    #[arg(long, env = "BFE_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,
}
