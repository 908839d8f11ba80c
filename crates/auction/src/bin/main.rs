use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use ba_auction::reactor::AuctionRuntimeConfig;
use ba_auction::service::AuctionService;
use ba_auction::Config;
use ba_common::keys::PrivateKeyCache;
use ba_common::logger::init_logger;
use ba_common::metrics::init_prometheus_exporter;
use ba_common::reporting::HttpReporter;
use ba_dispatch::wrapper::get_seller_wrapped_code;
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
        message = "Starting auction service",
        address = %config.address,
        port = config.port,
        metrics_address = %config.metrics_addr,
        js_num_workers = config.js_num_workers,
    );

    let seller_js = std::fs::read_to_string(&config.seller_js_path)?;
    // Buyer reportWin code arrives through the same code-fetch channel as
    // the seller script in a full deployment; no buyers are provisioned via
    // static config.
    let blob = get_seller_wrapped_code(
        &seller_js,
        config.enable_report_result_url_generation,
        config.enable_report_win_url_generation,
        &HashMap::new(),
    );

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
    let reporter = HttpReporter::new(Duration::from_millis(config.debug_reporting_timeout_ms))?;

    let runtime_config = AuctionRuntimeConfig {
        enable_adtech_code_logging: config.enable_adtech_code_logging,
        enable_seller_debug_url_generation: config.enable_seller_debug_url_generation,
        enable_report_result_url_generation: config.enable_report_result_url_generation,
        enable_report_win_url_generation: config.enable_report_win_url_generation,
        score_ads_timeout: Duration::from_millis(config.score_ads_timeout_ms),
        code_version: CODE_VERSION,
    };
    let consented_debug_token = if config.enable_otel_based_logging {
        config.consented_debug_token.clone()
    } else {
        String::new()
    };
    let service = AuctionService::new(
        Arc::new(pool),
        Arc::new(key_cache),
        Arc::new(reporter),
        runtime_config,
        consented_debug_token,
    );

    let bind_addr = std::net::SocketAddr::new(config.address, config.port);
    info!(message = "Auction gRPC server started", address = %bind_addr);
    Server::builder()
        .add_service(ba_api::grpc::auction::AuctionServer::new(service))
        .serve(bind_addr)
        .await?;
    Ok(())
}
