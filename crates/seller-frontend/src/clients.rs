//! Encrypted downstream clients: one per buyer front end, one for the
//! auction service. The registry is read-only after process init.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ba_api::grpc::auction::AuctionClient as GrpcAuctionClient;
use ba_api::grpc::buyer_front_end::BuyerFrontEndClient as GrpcBfeClient;
use ba_api::{
    GetBidsRawRequest, GetBidsRawResponse, GetBidsRequest, ScoreAdsRawRequest,
    ScoreAdsRawResponse, ScoreAdsRequest,
};
use ba_common::keys::KeyFetcherManager;
use ba_common::kv::{RequestMetadata, ScoringSignalsFetcher};
use ba_common::reporting::Reporter;
use ba_envelope::PublicKey;
use prost::Message;
use tonic::transport::Channel;
use tonic::Status;

/// Bid fetch seam for one buyer front end.
#[async_trait]
pub trait BuyerFrontEndClient: Send + Sync {
    async fn get_bids(
        &self,
        raw_request: GetBidsRawRequest,
        metadata: &RequestMetadata,
        timeout: Duration,
    ) -> Result<GetBidsRawResponse, Status>;
}

/// Scoring seam for the auction service.
#[async_trait]
pub trait AuctionClient: Send + Sync {
    async fn score_ads(
        &self,
        raw_request: ScoreAdsRawRequest,
        timeout: Duration,
    ) -> Result<ScoreAdsRawResponse, Status>;
}

/// Everything the SelectAd orchestrator reaches out to. Shared by all
/// requests; per-buyer stubs are keyed by buyer origin.
pub struct ClientRegistry {
    pub buyer_clients: HashMap<String, Arc<dyn BuyerFrontEndClient>>,
    pub auction_client: Arc<dyn AuctionClient>,
    pub scoring_signals_fetcher: Arc<dyn ScoringSignalsFetcher>,
    pub key_fetcher: Arc<dyn KeyFetcherManager>,
    pub reporter: Arc<dyn Reporter>,
}

impl ClientRegistry {
    pub fn buyer_client(&self, buyer_origin: &str) -> Option<Arc<dyn BuyerFrontEndClient>> {
        self.buyer_clients.get(buyer_origin).cloned()
    }
}

/// gRPC buyer front end client sealing requests to that BFE's envelope key.
pub struct EncryptedBfeClient {
    channel: Channel,
    public_key: PublicKey,
}

impl EncryptedBfeClient {
    pub fn new(channel: Channel, public_key: PublicKey) -> Self {
        Self { channel, public_key }
    }
}

#[async_trait]
impl BuyerFrontEndClient for EncryptedBfeClient {
    async fn get_bids(
        &self,
        raw_request: GetBidsRawRequest,
        metadata: &RequestMetadata,
        timeout: Duration,
    ) -> Result<GetBidsRawResponse, Status> {
        let (ciphertext, request_context) = ba_envelope::package_request(
            &self.public_key,
            &raw_request.encode_to_vec(),
            &mut rand::thread_rng(),
        )
        .map_err(|e| Status::internal(e.to_string()))?;

        let mut request = tonic::Request::new(GetBidsRequest {
            key_id: self.public_key.id.to_string(),
            request_ciphertext: ciphertext,
        });
        request.set_timeout(timeout);
        for (key, value) in metadata {
            let key = key
                .parse::<tonic::metadata::AsciiMetadataKey>()
                .map_err(|_| Status::internal("invalid metadata key"))?;
            let value = value
                .parse::<tonic::metadata::AsciiMetadataValue>()
                .map_err(|_| Status::internal("invalid metadata value"))?;
            request.metadata_mut().insert(key, value);
        }

        let mut client = GrpcBfeClient::new(self.channel.clone());
        let response = tokio::time::timeout(timeout, client.get_bids(request))
            .await
            .map_err(|_| Status::deadline_exceeded("GetBids timed out"))??
            .into_inner();

        let payload =
            ba_envelope::unpackage_response(&request_context, &response.response_ciphertext)
                .map_err(|e| Status::internal(e.to_string()))?;
        GetBidsRawResponse::decode(payload.as_slice()).map_err(|e| Status::internal(e.to_string()))
    }
}

/// gRPC auction client sealing requests to the auction service's key.
pub struct EncryptedAuctionClient {
    channel: Channel,
    public_key: PublicKey,
}

impl EncryptedAuctionClient {
    pub fn new(channel: Channel, public_key: PublicKey) -> Self {
        Self { channel, public_key }
    }
}

#[async_trait]
impl AuctionClient for EncryptedAuctionClient {
    async fn score_ads(
        &self,
        raw_request: ScoreAdsRawRequest,
        timeout: Duration,
    ) -> Result<ScoreAdsRawResponse, Status> {
        let (ciphertext, request_context) = ba_envelope::package_request(
            &self.public_key,
            &raw_request.encode_to_vec(),
            &mut rand::thread_rng(),
        )
        .map_err(|e| Status::internal(e.to_string()))?;

        let mut request = tonic::Request::new(ScoreAdsRequest {
            key_id: self.public_key.id.to_string(),
            request_ciphertext: ciphertext,
        });
        request.set_timeout(timeout);

        let mut client = GrpcAuctionClient::new(self.channel.clone());
        let response = tokio::time::timeout(timeout, client.score_ads(request))
            .await
            .map_err(|_| Status::deadline_exceeded("ScoreAds timed out"))??
            .into_inner();

        let payload =
            ba_envelope::unpackage_response(&request_context, &response.response_ciphertext)
                .map_err(|e| Status::internal(e.to_string()))?;
        ScoreAdsRawResponse::decode(payload.as_slice())
            .map_err(|e| Status::internal(e.to_string()))
    }
}
