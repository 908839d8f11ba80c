//! Cleartext framing and padding.
//!
//! Layout: one header byte (2-bit version, 3-bit compression algorithm,
//! 3 reserved bits), a big-endian u32 payload length, the payload, then zero
//! padding up to the next power of two, never less than 256 bytes.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::EnvelopeError;

/// Current framing version; the only one we accept.
pub const FRAMING_VERSION: u8 = 0;

/// Floor on the encoded size so that tiny payloads are indistinguishable.
pub const MIN_ENCODED_BYTES: usize = 256;

const HEADER_BYTES: usize = 1 + 4;

/// Compression algorithm carried in the framing header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    Uncompressed,
    Gzip,
}

impl CompressionType {
    fn algo_bits(self) -> u8 {
        match self {
            Self::Uncompressed => 0,
            Self::Gzip => 2,
        }
    }

    fn from_algo_bits(bits: u8) -> Result<Self, EnvelopeError> {
        match bits {
            0 => Ok(Self::Uncompressed),
            2 => Ok(Self::Gzip),
            _ => Err(EnvelopeError::UnsupportedCompression),
        }
    }
}

/// Smallest power of two that fits `n` framed bytes, floored at
/// [`MIN_ENCODED_BYTES`].
pub fn padded_size(n: usize) -> usize {
    n.next_power_of_two().max(MIN_ENCODED_BYTES)
}

fn gzip_compress(data: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .and_then(|()| encoder.finish())
        .map_err(|_| EnvelopeError::MalformedFraming)
}

fn gzip_decompress(data: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map(|_| out)
        .map_err(|_| EnvelopeError::MalformedFraming)
}

/// Compresses and frames `payload`, padding the result to a power of two.
pub fn encode_framed(
    compression: CompressionType,
    payload: &[u8],
) -> Result<Vec<u8>, EnvelopeError> {
    let body = match compression {
        CompressionType::Uncompressed => payload.to_vec(),
        CompressionType::Gzip => gzip_compress(payload)?,
    };

    let framed_len = HEADER_BYTES + body.len();
    let mut out = Vec::with_capacity(padded_size(framed_len));
    out.push((FRAMING_VERSION & 0b11) << 6 | (compression.algo_bits() & 0b111) << 3);
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(&body);
    out.resize(padded_size(framed_len), 0);
    Ok(out)
}

/// Strips framing and padding from `data` and decompresses the payload.
pub fn decode_framed(data: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    if data.len() < HEADER_BYTES {
        return Err(EnvelopeError::MalformedFraming);
    }
    let header = data[0];
    if header >> 6 != FRAMING_VERSION {
        return Err(EnvelopeError::MalformedFraming);
    }
    let compression = CompressionType::from_algo_bits((header >> 3) & 0b111)?;

    let len = u32::from_be_bytes([data[1], data[2], data[3], data[4]]) as usize;
    let body = data[HEADER_BYTES..]
        .get(..len)
        .ok_or(EnvelopeError::MalformedFraming)?;

    match compression {
        CompressionType::Uncompressed => Ok(body.to_vec()),
        CompressionType::Gzip => gzip_decompress(body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_round_trips_uncompressed() {
        let payload = b"auction result payload".to_vec();
        let framed = encode_framed(CompressionType::Uncompressed, &payload).unwrap();
        assert_eq!(decode_framed(&framed).unwrap(), payload);
    }

    #[test]
    fn frame_round_trips_gzip() {
        let payload = vec![7u8; 10_000];
        let framed = encode_framed(CompressionType::Gzip, &payload).unwrap();
        // Compressible input stays well under the raw size even after padding.
        assert!(framed.len() < payload.len());
        assert_eq!(decode_framed(&framed).unwrap(), payload);
    }

    #[test]
    fn encoded_size_is_padded_power_of_two_with_floor() {
        for payload_len in [0usize, 1, 100, 250, 251, 252, 1000, 5000] {
            let payload = vec![0xabu8; payload_len];
            let framed = encode_framed(CompressionType::Uncompressed, &payload).unwrap();
            let expected = (payload_len + 5).next_power_of_two().max(256);
            assert_eq!(framed.len(), expected, "payload_len={payload_len}");
            assert!(framed.len().is_power_of_two() || framed.len() == 256);
        }
    }

    #[test]
    fn padding_bytes_are_ignored_on_decode() {
        let payload = b"x".repeat(10);
        let mut framed = encode_framed(CompressionType::Uncompressed, &payload).unwrap();
        // Trailing garbage past the declared length must not affect decode.
        let last = framed.len() - 1;
        framed[last] = 0xff;
        assert_eq!(decode_framed(&framed).unwrap(), payload);
    }

    #[test]
    fn unknown_compression_is_rejected() {
        let mut framed = encode_framed(CompressionType::Uncompressed, b"abc").unwrap();
        framed[0] = (FRAMING_VERSION << 6) | (0b101 << 3);
        assert_eq!(
            decode_framed(&framed),
            Err(EnvelopeError::UnsupportedCompression)
        );
    }

    #[test]
    fn bad_version_and_short_input_are_malformed() {
        let framed = encode_framed(CompressionType::Uncompressed, b"abc").unwrap();
        let mut wrong_version = framed.clone();
        wrong_version[0] |= 0b1100_0000;
        assert_eq!(
            decode_framed(&wrong_version),
            Err(EnvelopeError::MalformedFraming)
        );
        assert_eq!(decode_framed(&[0u8; 3]), Err(EnvelopeError::MalformedFraming));
    }

    #[test]
    fn length_past_end_is_malformed() {
        let mut framed = vec![0u8; 16];
        framed[1..5].copy_from_slice(&(64u32).to_be_bytes());
        assert_eq!(decode_framed(&framed), Err(EnvelopeError::MalformedFraming));
    }
}
