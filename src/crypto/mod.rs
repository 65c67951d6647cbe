//! Cryptographic primitives for itaccess.
//!
//! This module provides:
//! - Random access password generation (`password`)
//! - PBKDF2-HMAC-SHA256 key derivation from the installation secret (`kdf`)
//! - Fernet token encryption and decryption (`fernet`)
//! - The zeroizing `AccessKey` wrapper (`keys`)

pub mod fernet;
pub mod kdf;
pub mod keys;
pub mod password;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{derive_key, encrypt, decrypt, AccessKey, ...};
pub use fernet::{decrypt, encrypt};
pub use kdf::{derive_key, generate_passphrase, generate_salt};
pub use keys::AccessKey;
pub use password::{generate_password, ALPHABET};
