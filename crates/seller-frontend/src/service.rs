//! gRPC surface of the seller front end.

use std::sync::Arc;
use std::time::Instant;

use ba_api::grpc::seller_front_end::SellerFrontEnd;
use ba_api::{SelectAdRequest, SelectAdResponse};
use ba_common::kv::{RequestMetadata, FORWARDED_METADATA_KEYS};
use tonic::{Request, Response, Status};

use crate::clients::ClientRegistry;
use crate::metrics::Metrics;
use crate::reactor::{SelectAdReactor, SfeRuntimeConfig};

pub struct SellerFrontEndService {
    reactor: SelectAdReactor,
    metrics: Metrics,
}

impl SellerFrontEndService {
    pub fn new(registry: Arc<ClientRegistry>, config: SfeRuntimeConfig) -> Self {
        Self {
            reactor: SelectAdReactor::new(registry, config),
            metrics: Metrics::default(),
        }
    }
}

/// Captures the metadata forwarded unchanged to buyer front ends.
fn forwarded_metadata(metadata: &tonic::metadata::MetadataMap) -> RequestMetadata {
    FORWARDED_METADATA_KEYS
        .iter()
        .filter_map(|key| {
            metadata
                .get(*key)
                .and_then(|value| value.to_str().ok())
                .map(|value| (key.to_string(), value.to_string()))
        })
        .collect()
}

#[tonic::async_trait]
impl SellerFrontEnd for SellerFrontEndService {
    async fn select_ad(
        &self,
        request: Request<SelectAdRequest>,
    ) -> Result<Response<SelectAdResponse>, Status> {
        let start = Instant::now();
        let metadata = forwarded_metadata(request.metadata());

        let result = self.reactor.execute(metadata, request.into_inner()).await;
        match result {
            Ok(response) => {
                self.metrics
                    .select_ad_duration
                    .record(start.elapsed().as_secs_f64());
                Ok(Response::new(response))
            }
            Err(status) => {
                self.metrics.select_ad_failures_total.increment(1);
                Err(status)
            }
        }
    }
}
