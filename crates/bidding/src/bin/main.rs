use std::sync::Arc;
use std::time::Duration;

use ba_bidding::reactor::BiddingRuntimeConfig;
use ba_bidding::service::BiddingService;
use ba_bidding::Config;
use ba_common::keys::PrivateKeyCache;
use ba_common::logger::init_logger;
use ba_common::metrics::init_prometheus_exporter;
use ba_dispatch::wrapper::get_buyer_wrapped_code;
use ba_dispatch::{DispatcherConfig, DispatcherPool, NullEngine};
use ba_envelope::PrivateKey;
use clap::Parser;
use tonic::transport::Server;
use tracing::info;

const CODE_VERSION: u64 = 1;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::parse();
    init_logger(config.log_level, config.log_format);
    init_prometheus_exporter(config.metrics_addr)?;
    anyhow::ensure!(config.enable_encryption, "this build requires ENABLE_ENCRYPTION");

    info!(
        message = "Starting bidding service",
        address = %config.address,
        port = config.port,
        metrics_address = %config.metrics_addr,
        js_num_workers = config.js_num_workers,
    );

    let buyer_js = std::fs::read_to_string(&config.buyer_js_path)?;
    let buyer_wasm = match &config.buyer_wasm_path {
        Some(path) => std::fs::read(path)?,
        None => Vec::new(),
    };
    let blob = if config.enable_buyer_code_wrapper {
        get_buyer_wrapped_code(&buyer_js, &buyer_wasm)
    } else {
        buyer_js
    };

    let pool = DispatcherPool::new(
        DispatcherConfig {
            num_workers: config.js_num_workers,
            queue_len: config.js_worker_queue_len,
            default_timeout: Duration::from_millis(config.roma_timeout_ms),
        },
        || NullEngine,
    );
    pool.load_sync(CODE_VERSION, blob);

    let private_key = PrivateKey::new(config.key_id, hex::decode(&config.private_key_hex)?);
    let key_cache = PrivateKeyCache::with_static_keys([private_key]);

    let runtime_config = BiddingRuntimeConfig {
        enable_adtech_code_logging: config.enable_adtech_code_logging,
        enable_buyer_debug_url_generation: config.enable_buyer_debug_url_generation,
        generate_bid_timeout: Duration::from_millis(config.generate_bid_timeout_ms),
        code_version: CODE_VERSION,
    };
    let consented_debug_token = if config.enable_otel_based_logging {
        config.consented_debug_token.clone()
    } else {
        String::new()
    };
    let service = BiddingService::new(
        Arc::new(pool),
        Arc::new(key_cache),
        runtime_config,
        consented_debug_token,
    );

    let bind_addr = std::net::SocketAddr::new(config.address, config.port);
    info!(message = "Bidding gRPC server started", address = %bind_addr);
    Server::builder()
        .add_service(ba_api::grpc::bidding::BiddingServer::new(service))
        .serve(bind_addr)
        .await?;
    Ok(())
}
