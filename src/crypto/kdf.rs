//! Key derivation from the installation secret using PBKDF2-HMAC-SHA256.
//!
//! Every installation has one passphrase and one salt.  They are stretched
//! into the single `AccessKey` that encrypts every stored access password.
//! The parameters are fixed: changing any of them would make existing
//! tokens undecryptable.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, Zeroizing};

use super::keys::{AccessKey, KEY_LEN};
use crate::errors::{ItAccessError, Result};

/// PBKDF2 iteration count.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Length of the installation salt in bytes.
pub const SALT_LEN: usize = 16;

/// Random bytes behind a freshly generated passphrase.
const PASSPHRASE_ENTROPY_LEN: usize = 64;

/// Derive the access key from the passphrase bytes and the raw salt.
///
/// The same passphrase and salt always produce the same key.
pub fn derive_key(passphrase: &[u8], salt: &[u8]) -> Result<AccessKey> {
    if passphrase.is_empty() {
        return Err(ItAccessError::KeyDerivationFailed(
            "passphrase cannot be empty".into(),
        ));
    }
    if salt.is_empty() {
        return Err(ItAccessError::KeyDerivationFailed(
            "salt cannot be empty".into(),
        ));
    }

    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(passphrase, salt, PBKDF2_ITERATIONS, &mut key);

    let access_key = AccessKey::new(key);
    key.zeroize();
    Ok(access_key)
}

/// Generate a new passphrase: URL-safe base64 of 64 random bytes.
pub fn generate_passphrase() -> Zeroizing<String> {
    let mut raw = [0u8; PASSPHRASE_ENTROPY_LEN];
    rand::rng().fill_bytes(&mut raw);
    let passphrase = Zeroizing::new(URL_SAFE.encode(raw));
    raw.zeroize();
    passphrase
}

/// Generate a cryptographically random 16-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}
