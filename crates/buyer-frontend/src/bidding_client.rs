//! Encrypted client for the bidding service.

use std::time::Duration;

use async_trait::async_trait;
use ba_api::grpc::bidding::BiddingClient as GrpcBiddingClient;
use ba_api::{GenerateBidsRawRequest, GenerateBidsRawResponse, GenerateBidsRequest};
use ba_envelope::PublicKey;
use prost::Message;
use tonic::transport::Channel;
use tonic::Status;

/// Seam for the bidding call so the orchestrator can be tested without a
/// server.
#[async_trait]
pub trait BiddingClient: Send + Sync {
    async fn generate_bids(
        &self,
        raw_request: GenerateBidsRawRequest,
        timeout: Duration,
    ) -> Result<GenerateBidsRawResponse, Status>;
}

/// gRPC client sealing requests to the bidding service's envelope key.
pub struct EncryptedBiddingClient {
    channel: Channel,
    public_key: PublicKey,
}

impl EncryptedBiddingClient {
    pub fn new(channel: Channel, public_key: PublicKey) -> Self {
        Self { channel, public_key }
    }
}

#[async_trait]
impl BiddingClient for EncryptedBiddingClient {
    async fn generate_bids(
        &self,
        raw_request: GenerateBidsRawRequest,
        timeout: Duration,
    ) -> Result<GenerateBidsRawResponse, Status> {
        let (ciphertext, request_context) = ba_envelope::package_request(
            &self.public_key,
            &raw_request.encode_to_vec(),
            &mut rand::thread_rng(),
        )
        .map_err(|e| Status::internal(e.to_string()))?;

        let mut client = GrpcBiddingClient::new(self.channel.clone());
        let mut request = tonic::Request::new(GenerateBidsRequest {
            key_id: self.public_key.id.to_string(),
            request_ciphertext: ciphertext,
        });
        request.set_timeout(timeout);

        let response = tokio::time::timeout(timeout, client.generate_bids(request))
            .await
            .map_err(|_| Status::deadline_exceeded("GenerateBids timed out"))??
            .into_inner();

        let payload =
            ba_envelope::unpackage_response(&request_context, &response.response_ciphertext)
                .map_err(|e| Status::internal(e.to_string()))?;
        GenerateBidsRawResponse::decode(payload.as_slice())
            .map_err(|e| Status::internal(e.to_string()))
    }
}
