//! Fernet authenticated encryption.
//!
//! Tokens are byte-compatible with the published Fernet format, so passwords
//! encrypted by other Fernet implementations under the same key decrypt
//! here and vice versa.
//!
//! Layout of the token before URL-safe base64 encoding:
//!
//! ```text
//! [0x80: 1 byte][timestamp: 8 bytes BE][IV: 16 bytes][AES-128-CBC ciphertext][HMAC-SHA256: 32 bytes]
//! ```
//!
//! The HMAC covers every byte before it and is keyed with the signing half
//! of the `AccessKey`; the ciphertext uses the encryption half.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use super::keys::AccessKey;
use crate::errors::{ItAccessError, Result};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type HmacSha256 = Hmac<Sha256>;

/// Token version byte.
const VERSION: u8 = 0x80;

/// AES block size (and IV size).
const BLOCK_LEN: usize = 16;

/// Size of the HMAC tag appended to the token.
const HMAC_LEN: usize = 32;

/// Fixed-size prefix: 1 (version) + 8 (timestamp) + 16 (IV).
const PREFIX_LEN: usize = 1 + 8 + BLOCK_LEN;

/// Tokens stamped further than this into the future are rejected when a
/// TTL is enforced.
const MAX_CLOCK_SKEW_SECS: u64 = 60;

/// Encrypt `plaintext` into a URL-safe base64 Fernet token.
///
/// Uses the current time and a fresh random IV.
pub fn encrypt(key: &AccessKey, plaintext: &[u8]) -> Result<String> {
    let mut iv = [0u8; BLOCK_LEN];
    rand::rng().fill_bytes(&mut iv);
    encrypt_at_time(key, plaintext, unix_now(), iv)
}

/// Encrypt with an explicit timestamp and IV.
pub fn encrypt_at_time(
    key: &AccessKey,
    plaintext: &[u8],
    timestamp: u64,
    iv: [u8; BLOCK_LEN],
) -> Result<String> {
    let ciphertext = Aes128CbcEnc::new_from_slices(key.encryption_key(), &iv)
        .map_err(|e| ItAccessError::InvalidKey(format!("AES-128 key: {e}")))?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut token = Vec::with_capacity(PREFIX_LEN + ciphertext.len() + HMAC_LEN);
    token.push(VERSION);
    token.extend_from_slice(&timestamp.to_be_bytes());
    token.extend_from_slice(&iv);
    token.extend_from_slice(&ciphertext);

    let mut mac = HmacSha256::new_from_slice(key.signing_key())
        .map_err(|e| ItAccessError::InvalidKey(format!("HMAC key: {e}")))?;
    mac.update(&token);
    token.extend_from_slice(&mac.finalize().into_bytes());

    Ok(URL_SAFE.encode(token))
}

/// Verify and decrypt a Fernet token.
///
/// With `ttl_secs = None` the token age is not checked.
pub fn decrypt(key: &AccessKey, token: &str, ttl_secs: Option<u64>) -> Result<Vec<u8>> {
    decrypt_at_time(key, token, ttl_secs, unix_now())
}

/// Verify and decrypt a Fernet token against an explicit "now".
pub fn decrypt_at_time(
    key: &AccessKey,
    token: &str,
    ttl_secs: Option<u64>,
    now: u64,
) -> Result<Vec<u8>> {
    let data = verified_token(key, token)?;
    let timestamp = read_timestamp(&data)?;

    if let Some(ttl) = ttl_secs {
        if timestamp.saturating_add(ttl) < now {
            return Err(ItAccessError::InvalidToken);
        }
        if now.saturating_add(MAX_CLOCK_SKEW_SECS) < timestamp {
            return Err(ItAccessError::InvalidToken);
        }
    }

    let signed = &data[..data.len() - HMAC_LEN];
    let iv = &signed[1 + 8..PREFIX_LEN];
    let ciphertext = &signed[PREFIX_LEN..];
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
        return Err(ItAccessError::InvalidToken);
    }

    Aes128CbcDec::new_from_slices(key.encryption_key(), iv)
        .map_err(|e| ItAccessError::InvalidKey(format!("AES-128 key: {e}")))?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| ItAccessError::InvalidToken)
}

/// Return the creation time embedded in a token after verifying it.
pub fn extract_timestamp(key: &AccessKey, token: &str) -> Result<DateTime<Utc>> {
    let data = verified_token(key, token)?;
    let timestamp = read_timestamp(&data)?;
    let secs = i64::try_from(timestamp).map_err(|_| ItAccessError::InvalidToken)?;
    DateTime::from_timestamp(secs, 0).ok_or(ItAccessError::InvalidToken)
}

/// Decode a token and check its version, length and HMAC.
fn verified_token(key: &AccessKey, token: &str) -> Result<Vec<u8>> {
    let data = URL_SAFE
        .decode(token.trim().as_bytes())
        .map_err(|_| ItAccessError::InvalidToken)?;

    if data.len() < PREFIX_LEN + BLOCK_LEN + HMAC_LEN || data[0] != VERSION {
        return Err(ItAccessError::InvalidToken);
    }

    let (signed, tag) = data.split_at(data.len() - HMAC_LEN);
    let mut mac = HmacSha256::new_from_slice(key.signing_key())
        .map_err(|e| ItAccessError::InvalidKey(format!("HMAC key: {e}")))?;
    mac.update(signed);
    // Constant-time comparison.
    mac.verify_slice(tag)
        .map_err(|_| ItAccessError::InvalidToken)?;

    Ok(data)
}

fn read_timestamp(data: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = data[1..9]
        .try_into()
        .map_err(|_| ItAccessError::InvalidToken)?;
    Ok(u64::from_be_bytes(bytes))
}

fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or_default()
}
