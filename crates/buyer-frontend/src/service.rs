//! The GetBids orchestrator: decrypt, fetch bidding signals, generate bids,
//! encrypt.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ba_api::grpc::buyer_front_end::BuyerFrontEnd;
use ba_api::{GetBidsRawRequest, GetBidsRawResponse, GetBidsRequest, GetBidsResponse};
use ba_common::context::RequestContext;
use ba_common::gateway::{open_encrypted_request, seal_encrypted_response};
use ba_common::keys::KeyFetcherManager;
use ba_common::kv::{BiddingSignalsFetcher, BuyerKvInput, RequestMetadata, BUYER_KV_METADATA_MAP};
use ba_common::metrics::{InitiatedRequest, CALLEE_BIDDING, CALLEE_KV};
use tonic::{Request, Response, Status};
use tracing::{debug, warn, Instrument};

use crate::bidding_client::BiddingClient;
use crate::metrics::Metrics;
use crate::proto_factory::create_generate_bids_raw_request;

/// Bidding-signal JSON handed to the bidding service when the fetch failed
/// and signals are not required.
const EMPTY_BIDDING_SIGNALS: &str = "{\"keys\":{}}";

/// Per-process settings of the GetBids orchestrator.
#[derive(Debug, Clone)]
pub struct GetBidsConfig {
    pub bidding_signals_load_timeout: Duration,
    pub generate_bid_timeout: Duration,
    /// When set, a failed signal fetch fails the RPC instead of degrading
    /// to empty signals.
    pub require_bidding_signals: bool,
}

pub struct BuyerFrontEndService {
    key_fetcher: Arc<dyn KeyFetcherManager>,
    signals_fetcher: Arc<dyn BiddingSignalsFetcher>,
    bidding_client: Arc<dyn BiddingClient>,
    config: GetBidsConfig,
    consented_debug_token: String,
    metrics: Metrics,
}

impl BuyerFrontEndService {
    pub fn new(
        key_fetcher: Arc<dyn KeyFetcherManager>,
        signals_fetcher: Arc<dyn BiddingSignalsFetcher>,
        bidding_client: Arc<dyn BiddingClient>,
        config: GetBidsConfig,
        consented_debug_token: String,
    ) -> Self {
        Self {
            key_fetcher,
            signals_fetcher,
            bidding_client,
            config,
            consented_debug_token,
            metrics: Metrics::default(),
        }
    }

    /// The buyer KV lookup covers the union of every group's signal keys
    /// plus the group names themselves.
    fn kv_input(raw_request: &GetBidsRawRequest) -> BuyerKvInput {
        let mut keys = BTreeSet::new();
        let mut names = BTreeSet::new();
        if let Some(buyer_input) = &raw_request.buyer_input {
            for ig in &buyer_input.interest_groups {
                if !ig.name.is_empty() {
                    names.insert(ig.name.clone());
                }
                keys.extend(ig.bidding_signals_keys.iter().cloned());
            }
        }
        BuyerKvInput {
            hostname: raw_request.publisher_name.clone(),
            keys: keys.into_iter().collect(),
            interest_group_names: names.into_iter().collect(),
        }
    }
}

/// Maps inbound gRPC metadata to the HTTP headers the buyer KV expects.
fn kv_metadata(metadata: &tonic::metadata::MetadataMap) -> RequestMetadata {
    BUYER_KV_METADATA_MAP
        .iter()
        .filter_map(|(grpc_key, http_header)| {
            metadata
                .get(*grpc_key)
                .and_then(|value| value.to_str().ok())
                .map(|value| (http_header.to_string(), value.to_string()))
        })
        .collect()
}

#[tonic::async_trait]
impl BuyerFrontEnd for BuyerFrontEndService {
    async fn get_bids(
        &self,
        request: Request<GetBidsRequest>,
    ) -> Result<Response<GetBidsResponse>, Status> {
        let start = Instant::now();
        let metadata = kv_metadata(request.metadata());
        let request = request.into_inner();

        let (raw_request, response_context) = open_encrypted_request::<GetBidsRawRequest>(
            &request.key_id,
            &request.request_ciphertext,
            self.key_fetcher.as_ref(),
        )?;

        let log_context = raw_request.log_context.clone().unwrap_or_default();
        let context = RequestContext::new(log_context.generation_id, log_context.adtech_debug_id)
            .with_consent(
                raw_request.consented_debug_config.as_ref(),
                &self.consented_debug_token,
            );
        let span = context.span("buyer_frontend");
        span.in_scope(|| context.debug_log(format!("GetBidsRawRequest: {raw_request:?}")));

        // Chaff requests exist to mask traffic; answer without doing work.
        if raw_request.is_chaff {
            let response_ciphertext =
                seal_encrypted_response(&GetBidsRawResponse::default(), &response_context)?;
            return Ok(Response::new(GetBidsResponse { response_ciphertext }));
        }

        // Bidding cannot start before signals land: they are a dispatch
        // input.
        let kv_input = Self::kv_input(&raw_request);
        let kv_timer = InitiatedRequest::start(CALLEE_KV, kv_input.keys.len());
        let signals_result = self
            .signals_fetcher
            .fetch_bidding_signals(&kv_input, &metadata, self.config.bidding_signals_load_timeout)
            .instrument(span.clone())
            .await;
        kv_timer.finish(signals_result.is_ok());

        let (bidding_signals, signals_missing) = match signals_result {
            Ok(signals) => (signals, false),
            Err(e) => {
                warn!(message = "bidding signals fetch failed", error = %e);
                self.metrics.signal_fetch_failures_total.increment(1);
                if self.config.require_bidding_signals {
                    return Err(Status::unavailable(format!(
                        "Failed to fetch bidding signals: {e}"
                    )));
                }
                (EMPTY_BIDDING_SIGNALS.to_string(), true)
            }
        };

        let raw_bidding_request =
            create_generate_bids_raw_request(&raw_request, bidding_signals);
        let bidding_timer = InitiatedRequest::start(CALLEE_BIDDING, 0);
        let bids = match self
            .bidding_client
            .generate_bids(raw_bidding_request, self.config.generate_bid_timeout)
            .instrument(span)
            .await
        {
            Ok(raw_response) => {
                bidding_timer.finish(true);
                raw_response.bids
            }
            Err(status) if signals_missing && status.code() == tonic::Code::InvalidArgument => {
                // Degraded path: empty signals legitimately produce no bids.
                bidding_timer.finish(false);
                Vec::new()
            }
            Err(status) => {
                bidding_timer.finish(false);
                warn!(message = "GenerateBids failed", status = %status);
                return Err(status);
            }
        };
        debug!(message = "received bids from bidding service", count = bids.len());
        self.metrics.bids_returned.record(bids.len() as f64);

        let raw_response = GetBidsRawResponse { bids };
        let response_ciphertext = seal_encrypted_response(&raw_response, &response_context)?;
        self.metrics
            .get_bids_duration
            .record(start.elapsed().as_secs_f64());
        Ok(Response::new(GetBidsResponse { response_ciphertext }))
    }
}
