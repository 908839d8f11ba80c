//! gRPC surface of the auction service.

use std::sync::Arc;
use std::time::Instant;

use ba_api::grpc::auction::Auction;
use ba_api::{ScoreAdsRawRequest, ScoreAdsRequest, ScoreAdsResponse};
use ba_common::context::RequestContext;
use ba_common::gateway::{open_encrypted_request, seal_encrypted_response};
use ba_common::keys::KeyFetcherManager;
use ba_common::reporting::Reporter;
use ba_dispatch::CodeDispatcher;
use tonic::{Request, Response, Status};
use tracing::{debug, Instrument};

use crate::metrics::Metrics;
use crate::reactor::{score_ads, AuctionRuntimeConfig};

pub struct AuctionService {
    dispatcher: Arc<dyn CodeDispatcher>,
    key_fetcher: Arc<dyn KeyFetcherManager>,
    reporter: Arc<dyn Reporter>,
    runtime_config: AuctionRuntimeConfig,
    consented_debug_token: String,
    metrics: Metrics,
}

impl AuctionService {
    pub fn new(
        dispatcher: Arc<dyn CodeDispatcher>,
        key_fetcher: Arc<dyn KeyFetcherManager>,
        reporter: Arc<dyn Reporter>,
        runtime_config: AuctionRuntimeConfig,
        consented_debug_token: String,
    ) -> Self {
        Self {
            dispatcher,
            key_fetcher,
            reporter,
            runtime_config,
            consented_debug_token,
            metrics: Metrics::default(),
        }
    }
}

#[tonic::async_trait]
impl Auction for AuctionService {
    async fn score_ads(
        &self,
        request: Request<ScoreAdsRequest>,
    ) -> Result<Response<ScoreAdsResponse>, Status> {
        let start = Instant::now();
        let request = request.into_inner();

        let (raw_request, response_context) = open_encrypted_request::<ScoreAdsRawRequest>(
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
        let span = context.span("auction");
        span.in_scope(|| context.debug_log(format!("ScoreAdsRawRequest: {raw_request:?}")));

        let js_start = Instant::now();
        let result = score_ads(
            self.dispatcher.as_ref(),
            &self.runtime_config,
            &context,
            self.reporter.as_ref(),
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
                self.metrics.score_ads_failures_total.increment(1);
                return Err(status);
            }
        };
        if raw_response.ad_score.is_none() {
            self.metrics.chaff_responses_total.increment(1);
        }
        debug!(
            message = "scored ads",
            has_winner = raw_response.ad_score.is_some()
        );

        let response_ciphertext = seal_encrypted_response(&raw_response, &response_context)?;
        self.metrics
            .score_ads_duration
            .record(start.elapsed().as_secs_f64());
        Ok(Response::new(ScoreAdsResponse { response_ciphertext }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ba_api::{AdWithBidMetadata, ScoreAdsRawResponse};
    use ba_common::keys::PrivateKeyCache;
    use ba_dispatch::{DispatchError, DispatchRequest, DispatchResponse};
    use prost::Message;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    struct FixedScoreDispatcher;

    #[async_trait]
    impl CodeDispatcher for FixedScoreDispatcher {
        async fn batch_execute(
            &self,
            requests: Vec<DispatchRequest>,
            _timeout: Duration,
        ) -> Result<Vec<Result<DispatchResponse, DispatchError>>, DispatchError> {
            Ok(requests
                .into_iter()
                .map(|request| {
                    Ok(DispatchResponse {
                        id: request.id,
                        resp: "{\"response\": {\"desirability\": 2.0}}".into(),
                    })
                })
                .collect())
        }
    }

    struct NullReporter;
    impl Reporter for NullReporter {
        fn report(&self, _url: String) {}
    }

    #[tokio::test]
    async fn decrypts_scores_and_encrypts() {
        let mut rng = StdRng::seed_from_u64(31);
        let (sk, pk) = ba_envelope::generate_key_pair(1, &mut rng);
        let service = AuctionService::new(
            Arc::new(FixedScoreDispatcher),
            Arc::new(PrivateKeyCache::with_static_keys([sk])),
            Arc::new(NullReporter),
            AuctionRuntimeConfig {
                enable_adtech_code_logging: false,
                enable_seller_debug_url_generation: false,
                enable_report_result_url_generation: false,
                enable_report_win_url_generation: false,
                score_ads_timeout: Duration::from_millis(100),
                code_version: 1,
            },
            String::new(),
        );

        let raw_request = ScoreAdsRawRequest {
            ad_bids: vec![AdWithBidMetadata {
                bid: 5.0,
                render: "r1".into(),
                interest_group_name: "cars".into(),
                interest_group_owner: "https://buyer.example.com".into(),
                ..Default::default()
            }],
            scoring_signals: "{\"renderUrls\": {\"r1\": [1]}}".into(),
            seller_signals: "{}".into(),
            auction_signals: "{}".into(),
            publisher_hostname: "pub.example.com".into(),
            ..Default::default()
        };
        let (ciphertext, request_ctx) =
            ba_envelope::package_request(&pk, &raw_request.encode_to_vec(), &mut rng).unwrap();

        let response = service
            .score_ads(Request::new(ScoreAdsRequest {
                key_id: "1".into(),
                request_ciphertext: ciphertext,
            }))
            .await
            .unwrap()
            .into_inner();

        let payload =
            ba_envelope::unpackage_response(&request_ctx, &response.response_ciphertext).unwrap();
        let raw_response = ScoreAdsRawResponse::decode(payload.as_slice()).unwrap();
        let ad_score = raw_response.ad_score.unwrap();
        assert_eq!(ad_score.desirability, 2.0);
        assert_eq!(ad_score.buyer_bid, 5.0);
        assert_eq!(ad_score.render, "r1");
    }
}
