//! Random access password generation.

use rand::Rng;

/// Characters a generated password is drawn from.
pub const ALPHABET: &[u8] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ<=>@#%&+";

/// Length of a generated password.
pub const DEFAULT_PASSWORD_LEN: usize = 16;

/// Generate a password of `len` characters from the thread-local CSPRNG.
pub fn generate_password(len: usize) -> String {
    generate_password_with(&mut rand::rng(), len)
}

/// Generate a password with the given RNG.
///
/// Every character is an independent uniform draw from `ALPHABET`.
pub fn generate_password_with<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
        .collect()
}
