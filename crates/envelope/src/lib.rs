//! Hybrid-encryption envelope shared by every hop of the auction pipeline.
//!
//! Requests are encapsulated in the oblivious-HTTP style: a fixed header
//! naming the key id and HPKE suite, the encapsulated KEM share, and the
//! AEAD ciphertext, all in one byte string. Responses are sealed with a key
//! schedule exported from the request context, so only the original sender
//! can open them. The cleartext on both sides is framed ([`framing`]) and
//! padded to a power of two so ciphertext length reveals nothing about the
//! payload.

mod framing;
mod hybrid;
mod package;

pub use framing::{
    encode_framed, decode_framed, padded_size, CompressionType, FRAMING_VERSION,
    MIN_ENCODED_BYTES,
};
pub use hybrid::{
    generate_key_pair, open_request, open_response, parse_key_id, seal_request, seal_response,
    PrivateKey, PublicKey, RequestContext, ResponseContext, AEAD_ID, KDF_ID, KEM_ID,
};
pub use package::{package_request, package_response, unpackage_request, unpackage_response};

use thiserror::Error;

/// Envelope failure modes.
///
/// Every variant surfaces to clients as `INVALID_ARGUMENT` with the fixed
/// message below; nothing about the key material leaks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// No private key is registered under the id in the request header.
    #[error("unknown key id")]
    UnknownKeyId,

    /// HPKE or AEAD processing failed (wrong key, truncated or tampered
    /// ciphertext).
    #[error("decryption failed")]
    AeadFailure,

    /// The framed cleartext is malformed (short header, bad version, length
    /// prefix past the end of the payload).
    #[error("malformed framing")]
    MalformedFraming,

    /// The framing header names a compression algorithm we do not support.
    #[error("unsupported compression")]
    UnsupportedCompression,

    /// Key bytes failed to parse. Configuration-side error, never produced
    /// from client input.
    #[error("invalid key material")]
    InvalidKey,
}
