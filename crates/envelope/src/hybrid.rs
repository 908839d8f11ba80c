//! HPKE encapsulation and the response key schedule.
//!
//! Suite: DHKEM(X25519, HKDF-SHA256), HKDF-SHA256, AES-256-GCM. The request
//! carries `key_id ‖ kem_id ‖ kdf_id ‖ aead_id ‖ enc ‖ ct`; the response is
//! `response_nonce ‖ ct` under a key derived from the request context's
//! exporter secret, salted with `enc ‖ response_nonce`.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use hkdf::Hkdf;
use hpke::aead::AesGcm256;
use hpke::kdf::HkdfSha256;
use hpke::kem::X25519HkdfSha256;
use hpke::{Deserializable, Kem as KemTrait, OpModeR, OpModeS, Serializable};
use rand::{CryptoRng, RngCore};
use sha2::Sha256;

use crate::EnvelopeError;

type Kem = X25519HkdfSha256;

/// IANA codepoint for DHKEM(X25519, HKDF-SHA256).
pub const KEM_ID: u16 = 0x0020;
/// IANA codepoint for HKDF-SHA256.
pub const KDF_ID: u16 = 0x0001;
/// IANA codepoint for AES-256-GCM.
pub const AEAD_ID: u16 = 0x0002;

const REQUEST_LABEL: &[u8] = b"message/auction request";
const RESPONSE_LABEL: &[u8] = b"message/auction response";

const HEADER_LEN: usize = 7;
const ENC_LEN: usize = 32;
const AEAD_KEY_LEN: usize = 32;
const AEAD_NONCE_LEN: usize = 12;
// Secret and response nonce are max(Nn, Nk) per the oblivious-HTTP schedule.
const SECRET_LEN: usize = 32;

/// Private half of an envelope key pair, addressed by a one-byte id.
#[derive(Clone)]
pub struct PrivateKey {
    pub id: u8,
    key: Vec<u8>,
}

impl PrivateKey {
    pub fn new(id: u8, key: Vec<u8>) -> Self {
        Self { id, key }
    }

    pub fn key_bytes(&self) -> &[u8] {
        &self.key
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key bytes stay out of logs.
        f.debug_struct("PrivateKey").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Public half of an envelope key pair.
#[derive(Debug, Clone)]
pub struct PublicKey {
    pub id: u8,
    key: Vec<u8>,
}

impl PublicKey {
    pub fn new(id: u8, key: Vec<u8>) -> Self {
        Self { id, key }
    }

    pub fn key_bytes(&self) -> &[u8] {
        &self.key
    }
}

/// Generates a fresh key pair under `id`.
pub fn generate_key_pair<R: CryptoRng + RngCore>(id: u8, rng: &mut R) -> (PrivateKey, PublicKey) {
    let (sk, pk) = Kem::gen_keypair(rng);
    (
        PrivateKey::new(id, sk.to_bytes().to_vec()),
        PublicKey::new(id, pk.to_bytes().to_vec()),
    )
}

/// Client-side state needed to open the sealed response.
pub struct RequestContext {
    enc: Vec<u8>,
    secret: [u8; SECRET_LEN],
}

/// Server-side state retained from request decryption; seals the response
/// with the same key schedule the client derived.
#[derive(Debug)]
pub struct ResponseContext {
    enc: Vec<u8>,
    secret: [u8; SECRET_LEN],
}

fn header(key_id: u8) -> [u8; HEADER_LEN] {
    let mut hdr = [0u8; HEADER_LEN];
    hdr[0] = key_id;
    hdr[1..3].copy_from_slice(&KEM_ID.to_be_bytes());
    hdr[3..5].copy_from_slice(&KDF_ID.to_be_bytes());
    hdr[5..7].copy_from_slice(&AEAD_ID.to_be_bytes());
    hdr
}

fn request_info(hdr: &[u8; HEADER_LEN]) -> Vec<u8> {
    let mut info = Vec::with_capacity(REQUEST_LABEL.len() + 1 + HEADER_LEN);
    info.extend_from_slice(REQUEST_LABEL);
    info.push(0);
    info.extend_from_slice(hdr);
    info
}

/// Reads the key id from the front of an encapsulated request without
/// decrypting anything.
pub fn parse_key_id(encapsulated: &[u8]) -> Result<u8, EnvelopeError> {
    encapsulated
        .first()
        .copied()
        .ok_or(EnvelopeError::MalformedFraming)
}

/// Seals a framed plaintext to `public_key`, returning the single
/// encapsulated byte string and the context for opening the response.
pub fn seal_request<R: CryptoRng + RngCore>(
    public_key: &PublicKey,
    plaintext: &[u8],
    rng: &mut R,
) -> Result<(Vec<u8>, RequestContext), EnvelopeError> {
    let pk = <Kem as KemTrait>::PublicKey::from_bytes(&public_key.key)
        .map_err(|_| EnvelopeError::InvalidKey)?;

    let hdr = header(public_key.id);
    let info = request_info(&hdr);
    let (encapped, mut ctx) = hpke::setup_sender::<AesGcm256, HkdfSha256, Kem, _>(
        &OpModeS::Base,
        &pk,
        &info,
        rng,
    )
    .map_err(|_| EnvelopeError::AeadFailure)?;
    let ct = ctx
        .seal(plaintext, b"")
        .map_err(|_| EnvelopeError::AeadFailure)?;

    let mut secret = [0u8; SECRET_LEN];
    ctx.export(RESPONSE_LABEL, &mut secret)
        .map_err(|_| EnvelopeError::AeadFailure)?;

    let enc = encapped.to_bytes().to_vec();
    let mut out = Vec::with_capacity(HEADER_LEN + enc.len() + ct.len());
    out.extend_from_slice(&hdr);
    out.extend_from_slice(&enc);
    out.extend_from_slice(&ct);
    Ok((out, RequestContext { enc, secret }))
}

/// Opens an encapsulated request with the private key its header names.
///
/// The caller is responsible for resolving `private_key` from
/// [`parse_key_id`]; a header naming a different id or suite is rejected.
pub fn open_request(
    private_key: &PrivateKey,
    encapsulated: &[u8],
) -> Result<(Vec<u8>, ResponseContext), EnvelopeError> {
    if encapsulated.len() < HEADER_LEN + ENC_LEN {
        return Err(EnvelopeError::MalformedFraming);
    }
    let hdr: [u8; HEADER_LEN] = encapsulated[..HEADER_LEN]
        .try_into()
        .map_err(|_| EnvelopeError::MalformedFraming)?;
    if hdr != header(private_key.id) {
        return Err(EnvelopeError::UnknownKeyId);
    }

    let enc = &encapsulated[HEADER_LEN..HEADER_LEN + ENC_LEN];
    let ct = &encapsulated[HEADER_LEN + ENC_LEN..];

    let sk = <Kem as KemTrait>::PrivateKey::from_bytes(&private_key.key)
        .map_err(|_| EnvelopeError::InvalidKey)?;
    let encapped =
        <Kem as KemTrait>::EncappedKey::from_bytes(enc).map_err(|_| EnvelopeError::AeadFailure)?;

    let info = request_info(&hdr);
    let mut ctx = hpke::setup_receiver::<AesGcm256, HkdfSha256, Kem>(
        &OpModeR::Base,
        &sk,
        &encapped,
        &info,
    )
    .map_err(|_| EnvelopeError::AeadFailure)?;
    let plaintext = ctx.open(ct, b"").map_err(|_| EnvelopeError::AeadFailure)?;

    let mut secret = [0u8; SECRET_LEN];
    ctx.export(RESPONSE_LABEL, &mut secret)
        .map_err(|_| EnvelopeError::AeadFailure)?;

    Ok((
        plaintext,
        ResponseContext { enc: enc.to_vec(), secret },
    ))
}

fn derive_response_key(
    enc: &[u8],
    secret: &[u8],
    response_nonce: &[u8],
) -> Result<(Aes256Gcm, [u8; AEAD_NONCE_LEN]), EnvelopeError> {
    let mut salt = Vec::with_capacity(enc.len() + response_nonce.len());
    salt.extend_from_slice(enc);
    salt.extend_from_slice(response_nonce);

    let hk = Hkdf::<Sha256>::new(Some(&salt), secret);
    let mut key = [0u8; AEAD_KEY_LEN];
    hk.expand(b"key", &mut key)
        .map_err(|_| EnvelopeError::AeadFailure)?;
    let mut nonce = [0u8; AEAD_NONCE_LEN];
    hk.expand(b"nonce", &mut nonce)
        .map_err(|_| EnvelopeError::AeadFailure)?;

    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| EnvelopeError::AeadFailure)?;
    Ok((cipher, nonce))
}

/// Seals the response plaintext under the request's exported key schedule.
pub fn seal_response<R: CryptoRng + RngCore>(
    context: &ResponseContext,
    plaintext: &[u8],
    rng: &mut R,
) -> Result<Vec<u8>, EnvelopeError> {
    let mut response_nonce = [0u8; SECRET_LEN];
    rng.fill_bytes(&mut response_nonce);

    let (cipher, nonce) = derive_response_key(&context.enc, &context.secret, &response_nonce)?;
    let ct = cipher
        .encrypt(Nonce::from_slice(&nonce), Payload { msg: plaintext, aad: b"" })
        .map_err(|_| EnvelopeError::AeadFailure)?;

    let mut out = Vec::with_capacity(SECRET_LEN + ct.len());
    out.extend_from_slice(&response_nonce);
    out.extend_from_slice(&ct);
    Ok(out)
}

/// Opens a sealed response on the client side of the hop.
pub fn open_response(
    context: &RequestContext,
    sealed: &[u8],
) -> Result<Vec<u8>, EnvelopeError> {
    if sealed.len() < SECRET_LEN {
        return Err(EnvelopeError::MalformedFraming);
    }
    let (response_nonce, ct) = sealed.split_at(SECRET_LEN);
    let (cipher, nonce) = derive_response_key(&context.enc, &context.secret, response_nonce)?;
    cipher
        .decrypt(Nonce::from_slice(&nonce), Payload { msg: ct, aad: b"" })
        .map_err(|_| EnvelopeError::AeadFailure)
}
