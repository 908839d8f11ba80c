//! gRPC surface of the bidding service: envelope handling around the
//! reactor.

use std::sync::Arc;
use std::time::Instant;

use ba_api::grpc::bidding::Bidding;
use ba_api::{GenerateBidsRawRequest, GenerateBidsRequest, GenerateBidsResponse};
use ba_common::context::RequestContext;
use ba_common::gateway::{open_encrypted_request, seal_encrypted_response};
use ba_common::keys::KeyFetcherManager;
use ba_dispatch::CodeDispatcher;
use tonic::{Request, Response, Status};
use tracing::{debug, Instrument};

use crate::metrics::Metrics;
use crate::reactor::{generate_bids, BiddingRuntimeConfig};

pub struct BiddingService {
    dispatcher: Arc<dyn CodeDispatcher>,
    key_fetcher: Arc<dyn KeyFetcherManager>,
    runtime_config: BiddingRuntimeConfig,
    consented_debug_token: String,
    metrics: Metrics,
}

impl BiddingService {
    pub fn new(
        dispatcher: Arc<dyn CodeDispatcher>,
        key_fetcher: Arc<dyn KeyFetcherManager>,
        runtime_config: BiddingRuntimeConfig,
        consented_debug_token: String,
    ) -> Self {
        Self {
            dispatcher,
            key_fetcher,
            runtime_config,
            consented_debug_token,
            metrics: Metrics::default(),
        }
    }
}

#[tonic::async_trait]
impl Bidding for BiddingService {
    async fn generate_bids(
        &self,
        request: Request<GenerateBidsRequest>,
    ) -> Result<Response<GenerateBidsResponse>, Status> {
        let start = Instant::now();
        let request = request.into_inner();

        let (raw_request, response_context) = open_encrypted_request::<GenerateBidsRawRequest>(
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
        let span = context.span("bidding");
        span.in_scope(|| context.debug_log(format!("GenerateBidsRawRequest: {raw_request:?}")));

        let js_start = Instant::now();
        let result = generate_bids(
            self.dispatcher.as_ref(),
            &self.runtime_config,
            &context,
            &raw_request,
        )
        .instrument(span)
        .await;
        self.metrics
            .js_execution_duration
            .record(js_start.elapsed().as_secs_f64());

        let raw_response = match result {
            Ok(raw_response) => raw_response,
            Err(status) => {
                self.metrics.generate_bids_failures_total.increment(1);
                return Err(status);
            }
        };
        debug!(message = "generated bids", count = raw_response.bids.len());
        self.metrics.bids_returned.record(raw_response.bids.len() as f64);

        let response_ciphertext = seal_encrypted_response(&raw_response, &response_context)?;
        self.metrics
            .generate_bids_duration
            .record(start.elapsed().as_secs_f64());
        Ok(Response::new(GenerateBidsResponse { response_ciphertext }))
    }
}
