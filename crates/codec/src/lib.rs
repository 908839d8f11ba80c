//! Canonical CBOR codec for the browser path.
//!
//! Encode side emits shortlex-ordered map keys, narrowest-width integers and
//! floats (ciborium's preferred serialization). Decode side walks the value
//! tree against the expected schema and reports every mismatch to the shared
//! error accumulator instead of bailing on the first defect.

pub mod constants;
mod input;
mod result;
mod value;

pub use input::{
    decode_buyer_input, decode_buyer_inputs, decode_protected_auction_input,
    encode_and_compress_buyer_input, encode_protected_auction_input,
};
pub use result::{decode_auction_result, encode_auction_result};

use thiserror::Error;

/// Codec-internal failures. Client-visible decode defects go through the
/// error accumulator instead.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid CBOR: {0}")]
    InvalidCbor(String),
    #[error("failed to serialize CBOR: {0}")]
    Serialize(String),
}
