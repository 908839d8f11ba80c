use std::sync::Arc;
use std::time::Duration;

use ba_buyer_frontend::bidding_client::EncryptedBiddingClient;
use ba_buyer_frontend::service::{BuyerFrontEndService, GetBidsConfig};
use ba_buyer_frontend::Config;
use ba_common::keys::PrivateKeyCache;
use ba_common::kv::HttpKvClient;
use ba_common::logger::init_logger;
use ba_common::metrics::init_prometheus_exporter;
use ba_envelope::{PrivateKey, PublicKey};
use clap::Parser;
use tonic::transport::{Endpoint, Server};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::parse();
    init_logger(config.log_level, config.log_format);
    init_prometheus_exporter(config.metrics_addr)?;
    anyhow::ensure!(config.enable_encryption, "this build requires ENABLE_ENCRYPTION");

    info!(
        message = "Starting buyer front end",
        address = %config.address,
        port = config.port,
        bidding_server = %config.bidding_server_addr,
        buyer_kv_server = %config.buyer_kv_server_addr,
        metrics_address = %config.metrics_addr,
    );

    let private_key = PrivateKey::new(config.key_id, hex::decode(&config.private_key_hex)?);
    let key_cache = PrivateKeyCache::with_static_keys([private_key]);

    let bidding_channel = Endpoint::new(config.bidding_server_addr.to_string())?.connect_lazy();
    let bidding_public_key = PublicKey::new(
        config.bidding_public_key_id,
        hex::decode(&config.bidding_public_key_hex)?,
    );
    let bidding_client = EncryptedBiddingClient::new(bidding_channel, bidding_public_key);
    let kv_client = HttpKvClient::new(config.buyer_kv_server_addr.clone())?;

    let service = BuyerFrontEndService::new(
        Arc::new(key_cache),
        Arc::new(kv_client),
        Arc::new(bidding_client),
        GetBidsConfig {
            bidding_signals_load_timeout: Duration::from_millis(
                config.bidding_signals_load_timeout_ms,
            ),
            generate_bid_timeout: Duration::from_millis(config.generate_bid_timeout_ms),
            require_bidding_signals: config.require_bidding_signals,
        },
        if config.enable_otel_based_logging {
            config.consented_debug_token.clone()
        } else {
            String::new()
        },
    );

    let bind_addr = std::net::SocketAddr::new(config.address, config.port);
    info!(message = "Buyer front end gRPC server started", address = %bind_addr);
    Server::builder()
        .add_service(ba_api::grpc::buyer_front_end::BuyerFrontEndServer::new(service))
        .serve(bind_addr)
        .await?;
    Ok(())
}
