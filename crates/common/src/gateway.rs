//! Decrypt/encrypt scaffolding shared by the encrypted unary services.
//!
//! The bidding, auction and buyer front end RPCs all carry
//! `{key_id, ciphertext}` requests; this module maps envelope failures to
//! the fixed client-facing gRPC statuses so nothing about the key material
//! leaks.

use ba_envelope::{EnvelopeError, ResponseContext};
use prost::Message;
use tonic::Status;

use crate::error::INTERNAL_SERVER_ERROR;
use crate::keys::KeyFetcherManager;

pub const EMPTY_KEY_ID_ERROR: &str = "key_id must be non-null.";
pub const EMPTY_CIPHERTEXT_ERROR: &str = "request_ciphertext must be non-null.";
pub const INVALID_KEY_ID_ERROR: &str = "Invalid key ID provided in the request.";
pub const MALFORMED_CIPHERTEXT_ERROR: &str = "Malformed request ciphertext.";

/// Opens an encrypted request and decodes the inner protobuf.
///
/// The retained [`ResponseContext`] must be used to seal the response.
pub fn open_encrypted_request<M: Message + Default>(
    key_id: &str,
    ciphertext: &[u8],
    key_fetcher: &dyn KeyFetcherManager,
) -> Result<(M, ResponseContext), Status> {
    if key_id.is_empty() {
        return Err(Status::invalid_argument(EMPTY_KEY_ID_ERROR));
    }
    if ciphertext.is_empty() {
        return Err(Status::invalid_argument(EMPTY_CIPHERTEXT_ERROR));
    }

    let key_id: u8 = key_id
        .parse()
        .map_err(|_| Status::invalid_argument(INVALID_KEY_ID_ERROR))?;
    let private_key = key_fetcher
        .private_key(key_id)
        .ok_or_else(|| Status::invalid_argument(INVALID_KEY_ID_ERROR))?;

    let (payload, context) =
        ba_envelope::unpackage_request(&private_key, ciphertext).map_err(envelope_status)?;
    let message =
        M::decode(payload.as_slice()).map_err(|_| Status::invalid_argument(MALFORMED_CIPHERTEXT_ERROR))?;
    Ok((message, context))
}

/// Serializes and seals the response with the request's key schedule.
pub fn seal_encrypted_response<M: Message>(
    message: &M,
    context: &ResponseContext,
) -> Result<Vec<u8>, Status> {
    ba_envelope::package_response(context, &message.encode_to_vec(), &mut rand::thread_rng())
        .map_err(|_| Status::internal(INTERNAL_SERVER_ERROR))
}

/// Envelope failures surface with their fixed strings as INVALID_ARGUMENT.
pub fn envelope_status(error: EnvelopeError) -> Status {
    match error {
        EnvelopeError::InvalidKey => Status::internal(INTERNAL_SERVER_ERROR),
        other => Status::invalid_argument(other.to_string()),
    }
}
