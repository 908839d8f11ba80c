//! Frame-then-seal composition used by every hop.
//!
//! Requests and responses both travel as gzip-framed, padded plaintext
//! inside the hybrid envelope, so no hop's ciphertext length reveals its
//! payload size.

use rand::{CryptoRng, RngCore};

use crate::framing::{decode_framed, encode_framed, CompressionType};
use crate::hybrid::{
    open_request, open_response, seal_request, seal_response, PrivateKey, PublicKey,
    RequestContext, ResponseContext,
};
use crate::EnvelopeError;

/// Client side: frames `payload`, pads, and seals it to `public_key`.
pub fn package_request<R: CryptoRng + RngCore>(
    public_key: &PublicKey,
    payload: &[u8],
    rng: &mut R,
) -> Result<(Vec<u8>, RequestContext), EnvelopeError> {
    let framed = encode_framed(CompressionType::Gzip, payload)?;
    seal_request(public_key, &framed, rng)
}

/// Server side: opens an encapsulated request and strips the framing.
pub fn unpackage_request(
    private_key: &PrivateKey,
    encapsulated: &[u8],
) -> Result<(Vec<u8>, ResponseContext), EnvelopeError> {
    let (framed, context) = open_request(private_key, encapsulated)?;
    Ok((decode_framed(&framed)?, context))
}

/// Server side: frames, pads and seals the response payload.
pub fn package_response<R: CryptoRng + RngCore>(
    context: &ResponseContext,
    payload: &[u8],
    rng: &mut R,
) -> Result<Vec<u8>, EnvelopeError> {
    let framed = encode_framed(CompressionType::Gzip, payload)?;
    seal_response(context, &framed, rng)
}

/// Client side: opens a sealed response and strips the framing.
pub fn unpackage_response(
    context: &RequestContext,
    sealed: &[u8],
) -> Result<Vec<u8>, EnvelopeError> {
    let framed = open_response(context, sealed)?;
    decode_framed(&framed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate_key_pair;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn package_round_trips_both_directions() {
        let mut rng = StdRng::seed_from_u64(9);
        let (sk, pk) = generate_key_pair(2, &mut rng);

        let (sealed, request_ctx) = package_request(&pk, b"raw request proto", &mut rng).unwrap();
        let (payload, response_ctx) = unpackage_request(&sk, &sealed).unwrap();
        assert_eq!(payload, b"raw request proto");

        let sealed_response =
            package_response(&response_ctx, b"raw response proto", &mut rng).unwrap();
        assert_eq!(
            unpackage_response(&request_ctx, &sealed_response).unwrap(),
            b"raw response proto"
        );
    }
}
