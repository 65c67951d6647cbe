//! The symmetric key shared by every access record of an installation.
//!
//! The key is 32 bytes and is exchanged in its URL-safe base64 form, the
//! same text form Fernet keys use everywhere.  The first half signs tokens
//! (HMAC-SHA256), the second half encrypts them (AES-128-CBC).

use std::fmt;

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use zeroize::{Zeroize, Zeroizing};

use crate::errors::{ItAccessError, Result};

/// Length of the raw key in bytes.
pub const KEY_LEN: usize = 32;

/// Length of each half of the key.
const HALF_LEN: usize = KEY_LEN / 2;

/// A 32-byte access key that zeroes its memory when dropped.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct AccessKey {
    bytes: [u8; KEY_LEN],
}

impl AccessKey {
    /// Create a new `AccessKey` from raw bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Parse a key from its URL-safe base64 text form.
    pub fn from_urlsafe(encoded: &str) -> Result<Self> {
        let mut decoded = URL_SAFE
            .decode(encoded.trim().as_bytes())
            .map_err(|e| ItAccessError::InvalidKey(format!("not URL-safe base64: {e}")))?;

        if decoded.len() != KEY_LEN {
            let len = decoded.len();
            decoded.zeroize();
            return Err(ItAccessError::InvalidKey(format!(
                "key must be {KEY_LEN} bytes, got {len}"
            )));
        }

        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();
        Ok(Self::new(bytes))
    }

    /// The URL-safe base64 text form of the key.
    pub fn to_urlsafe(&self) -> Zeroizing<String> {
        Zeroizing::new(URL_SAFE.encode(self.bytes))
    }

    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// The HMAC-SHA256 signing half.
    pub fn signing_key(&self) -> &[u8] {
        &self.bytes[..HALF_LEN]
    }

    /// The AES-128 encryption half.
    pub fn encryption_key(&self) -> &[u8] {
        &self.bytes[HALF_LEN..]
    }
}

impl fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VECTOR_KEY: &str = "cw_0x689RpI-jtRR7oE8h_eQsKImvJapLeSbXpwF4e4=";

    #[test]
    fn urlsafe_roundtrip() {
        let key = AccessKey::from_urlsafe(VECTOR_KEY).unwrap();
        assert_eq!(key.to_urlsafe().as_str(), VECTOR_KEY);
    }

    #[test]
    fn halves_split_the_key() {
        let mut raw = [0u8; KEY_LEN];
        for (i, b) in raw.iter_mut().enumerate() {
            *b = i as u8;
        }
        let key = AccessKey::new(raw);
        assert_eq!(key.signing_key(), &raw[..16]);
        assert_eq!(key.encryption_key(), &raw[16..]);
    }

    #[test]
    fn rejects_wrong_length() {
        let short = URL_SAFE.encode([0u8; 16]);
        assert!(AccessKey::from_urlsafe(&short).is_err());
    }

    #[test]
    fn rejects_non_base64() {
        assert!(AccessKey::from_urlsafe("not a key!").is_err());
    }

    #[test]
    fn debug_does_not_leak_bytes() {
        let key = AccessKey::new([0x41; KEY_LEN]);
        assert_eq!(format!("{key:?}"), "AccessKey(<redacted>)");
    }
}
