use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use ba_common::keys::PrivateKeyCache;
use ba_common::kv::HttpKvClient;
use ba_common::logger::init_logger;
use ba_common::metrics::init_prometheus_exporter;
use ba_common::reporting::HttpReporter;
use ba_envelope::{PrivateKey, PublicKey};
use ba_seller_frontend::clients::{
    BuyerFrontEndClient, ClientRegistry, EncryptedAuctionClient, EncryptedBfeClient,
};
use ba_seller_frontend::reactor::SfeRuntimeConfig;
use ba_seller_frontend::service::SellerFrontEndService;
use ba_seller_frontend::Config;
use clap::Parser;
use tonic::transport::{Endpoint, Server};
use tracing::info;

/// Parses one `origin=url#pubkeyhex:id` buyer entry.
fn parse_buyer_entry(entry: &str) -> anyhow::Result<(String, String, PublicKey)> {
    let (origin, rest) = entry
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("buyer entry missing '=': {entry}"))?;
    let (url, key) = rest
        .split_once('#')
        .ok_or_else(|| anyhow::anyhow!("buyer entry missing '#': {entry}"))?;
    let (key_hex, key_id) = key
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("buyer entry missing key id: {entry}"))?;
    let public_key = PublicKey::new(key_id.parse()?, hex::decode(key_hex)?);
    Ok((origin.to_string(), url.to_string(), public_key))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::parse();
    init_logger(config.log_level, config.log_format);
    init_prometheus_exporter(config.metrics_addr)?;
    anyhow::ensure!(config.enable_encryption, "this build requires ENABLE_ENCRYPTION");
    if config.enable_protected_app_signals {
        tracing::warn!(
            message = "protected app signals bids are not supported; flag ignored"
        );
    }

    info!(
        message = "Starting seller front end",
        address = %config.address,
        port = config.port,
        seller = %config.seller_origin_domain,
        auction_server = %config.auction_server_addr,
        buyers = config.buyer_server_addrs.len(),
        metrics_address = %config.metrics_addr,
    );

    let mut buyer_clients: HashMap<String, Arc<dyn BuyerFrontEndClient>> = HashMap::new();
    for entry in &config.buyer_server_addrs {
        let (origin, url, public_key) = parse_buyer_entry(entry)?;
        let channel = Endpoint::new(url)?.connect_lazy();
        buyer_clients.insert(origin, Arc::new(EncryptedBfeClient::new(channel, public_key)));
    }

    let auction_channel = Endpoint::new(config.auction_server_addr.to_string())?.connect_lazy();
    let auction_public_key = PublicKey::new(
        config.auction_public_key_id,
        hex::decode(&config.auction_public_key_hex)?,
    );
    let auction_client = EncryptedAuctionClient::new(auction_channel, auction_public_key);

    let private_key = PrivateKey::new(config.key_id, hex::decode(&config.private_key_hex)?);
    let registry = Arc::new(ClientRegistry {
        buyer_clients,
        auction_client: Arc::new(auction_client),
        scoring_signals_fetcher: Arc::new(HttpKvClient::new(
            config.seller_kv_server_addr.clone(),
        )?),
        key_fetcher: Arc::new(PrivateKeyCache::with_static_keys([private_key])),
        reporter: Arc::new(HttpReporter::new(Duration::from_millis(
            config.debug_reporting_timeout_ms,
        ))?),
    });

    let runtime_config = SfeRuntimeConfig {
        seller_origin_domain: config.seller_origin_domain.clone(),
        get_bid_timeout: Duration::from_millis(config.get_bid_rpc_timeout_ms),
        score_ads_timeout: Duration::from_millis(config.score_ads_rpc_timeout_ms),
        scoring_signals_fetch_timeout: Duration::from_millis(
            config.key_value_signals_fetch_rpc_timeout_ms,
        ),
        consented_debug_token: if config.enable_otel_based_logging {
            config.consented_debug_token.clone()
        } else {
            String::new()
        },
        fail_fast: config.fail_fast,
    };
    let service = SellerFrontEndService::new(registry, runtime_config);

    let bind_addr = std::net::SocketAddr::new(config.address, config.port);
    info!(message = "Seller front end gRPC server started", address = %bind_addr);
    Server::builder()
        .add_service(ba_api::grpc::seller_front_end::SellerFrontEndServer::new(service))
        .serve(bind_addr)
        .await?;
    Ok(())
}
