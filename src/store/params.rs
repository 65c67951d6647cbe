//! Installation-wide configuration parameters and the secret they hold.
//!
//! Two parameters make up the installation secret:
//!
//! - `it_passkey`: the raw passphrase text.
//! - `it_passsalt`: the PBKDF2 salt, URL-safe base64.
//!
//! They are created together, at most once, and never rotated.  The
//! read-then-write of the bootstrap runs inside an IMMEDIATE transaction so
//! two first-time callers cannot both generate a secret: the second one
//! waits on the write lock and then sees the pair written by the first.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::kdf::{derive_key, generate_passphrase, generate_salt};
use crate::crypto::AccessKey;
use crate::errors::{ItAccessError, Result};

/// Parameter holding the passphrase.
pub const PARAM_PASS: &str = "it_passkey";

/// Parameter holding the base64-encoded salt.
pub const PARAM_SALT: &str = "it_passsalt";

/// Read a configuration parameter.
pub fn get_param(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM config_parameter WHERE key = ?1",
            [key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

/// Insert or replace a configuration parameter.
pub fn set_param(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO config_parameter (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

/// The installation secret as loaded from (or just written to) the database.
pub struct SecretState {
    passphrase: Zeroizing<String>,
    salt: Vec<u8>,
    /// `true` if this call generated and stored the secret.
    pub created: bool,
}

impl SecretState {
    /// Derive the access key shared by every record of the installation.
    pub fn derive_key(&self) -> Result<AccessKey> {
        derive_key(self.passphrase.as_bytes(), &self.salt)
    }

    /// The raw salt bytes.
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }
}

impl Drop for SecretState {
    fn drop(&mut self) {
        self.salt.zeroize();
    }
}

/// Load the installation secret, generating and storing it on first use.
pub fn load_or_bootstrap(conn: &mut Connection) -> Result<SecretState> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let passphrase = get_param(&tx, PARAM_PASS)?.filter(|p| !p.is_empty());

    let state = match passphrase {
        Some(passphrase) => {
            let passphrase = Zeroizing::new(passphrase);
            let encoded_salt = get_param(&tx, PARAM_SALT)?.ok_or_else(|| {
                ItAccessError::SecretStateCorrupt(format!(
                    "{PARAM_PASS} is set but {PARAM_SALT} is missing"
                ))
            })?;
            let salt = URL_SAFE.decode(encoded_salt.trim().as_bytes()).map_err(|e| {
                ItAccessError::SecretStateCorrupt(format!("{PARAM_SALT} is not URL-safe base64: {e}"))
            })?;
            SecretState {
                passphrase,
                salt,
                created: false,
            }
        }
        None => {
            let passphrase = generate_passphrase();
            let salt = generate_salt();
            set_param(&tx, PARAM_PASS, &passphrase)?;
            set_param(&tx, PARAM_SALT, &URL_SAFE.encode(salt))?;
            SecretState {
                passphrase,
                salt: salt.to_vec(),
                created: true,
            }
        }
    };

    tx.commit()?;
    Ok(state)
}

/// Returns `true` if the installation secret has been generated.
pub fn secret_exists(conn: &Connection) -> Result<bool> {
    Ok(get_param(conn, PARAM_PASS)?.is_some_and(|p| !p.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::db;

    #[test]
    fn get_missing_param_is_none() {
        let conn = db::open_in_memory().unwrap();
        assert!(get_param(&conn, "nope").unwrap().is_none());
    }

    #[test]
    fn set_param_overwrites() {
        let conn = db::open_in_memory().unwrap();
        set_param(&conn, "k", "v1").unwrap();
        set_param(&conn, "k", "v2").unwrap();
        assert_eq!(get_param(&conn, "k").unwrap().as_deref(), Some("v2"));
    }

    #[test]
    fn first_load_bootstraps_both_params() {
        let mut conn = db::open_in_memory().unwrap();
        assert!(!secret_exists(&conn).unwrap());

        let state = load_or_bootstrap(&mut conn).unwrap();
        assert!(state.created);
        assert_eq!(state.salt().len(), 16);

        let pass = get_param(&conn, PARAM_PASS).unwrap().unwrap();
        let salt = get_param(&conn, PARAM_SALT).unwrap().unwrap();
        assert_eq!(pass.len(), 88);
        assert_eq!(URL_SAFE.decode(salt).unwrap(), state.salt());
    }

    #[test]
    fn second_load_reuses_params() {
        let mut conn = db::open_in_memory().unwrap();
        let first = load_or_bootstrap(&mut conn).unwrap();
        let pass_before = get_param(&conn, PARAM_PASS).unwrap();

        let second = load_or_bootstrap(&mut conn).unwrap();
        assert!(!second.created);
        assert_eq!(get_param(&conn, PARAM_PASS).unwrap(), pass_before);
        assert_eq!(
            first.derive_key().unwrap().as_bytes(),
            second.derive_key().unwrap().as_bytes()
        );
    }

    #[test]
    fn existing_params_are_used_verbatim() {
        let mut conn = db::open_in_memory().unwrap();
        set_param(&conn, PARAM_PASS, "correct horse battery staple").unwrap();
        set_param(&conn, PARAM_SALT, &URL_SAFE.encode(b"0123456789abcdef")).unwrap();

        let state = load_or_bootstrap(&mut conn).unwrap();
        assert!(!state.created);
        assert_eq!(
            state.derive_key().unwrap().to_urlsafe().as_str(),
            "CQEF03iMraucElCfobodRqkaFY16F3mxFDIvP9WoJcs="
        );
    }

    #[test]
    fn passphrase_without_salt_is_corrupt() {
        let mut conn = db::open_in_memory().unwrap();
        set_param(&conn, PARAM_PASS, "orphan").unwrap();
        assert!(matches!(
            load_or_bootstrap(&mut conn),
            Err(ItAccessError::SecretStateCorrupt(_))
        ));
    }

    #[test]
    fn undecodable_salt_is_corrupt() {
        let mut conn = db::open_in_memory().unwrap();
        set_param(&conn, PARAM_PASS, "pass").unwrap();
        set_param(&conn, PARAM_SALT, "***").unwrap();
        assert!(matches!(
            load_or_bootstrap(&mut conn),
            Err(ItAccessError::SecretStateCorrupt(_))
        ));
    }
}
