//! The access record and the operations on its password.
//!
//! The `password` column holds either plaintext or ciphertext; the
//! `encrypted` flag tells which.  Ciphertext is the URL-safe base64 encoding
//! of a Fernet token's text, so an encrypted password is base64 twice over.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Serialize;
use zeroize::{Zeroize, Zeroizing};

use super::defaults::AccessDefaults;
use crate::crypto::{fernet, generate_password, AccessKey};
use crate::errors::{ItAccessError, Result};
use crate::store::models::Equipment;

/// A stored access credential.
#[derive(Debug, Clone, Serialize)]
pub struct Access {
    pub id: i64,
    pub company_id: i64,
    pub equipment_id: Option<i64>,
    pub site_id: Option<i64>,
    /// Username.
    pub name: String,
    #[serde(skip)]
    password: Option<String>,
    encrypted: bool,
    pub partner_id: Option<i64>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A plaintext password recovered from an encrypted record.
pub struct RevealedPassword {
    pub id: i64,
    pub username: String,
    pub password: Zeroizing<String>,
}

impl std::fmt::Debug for RevealedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevealedPassword")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Fields for a new access record.
#[derive(Debug, Clone, Default)]
pub struct NewAccess {
    pub name: String,
    pub password: Option<String>,
    /// Falls back to the installation's default company.
    pub company_id: Option<i64>,
    pub equipment_id: Option<i64>,
    pub site_id: Option<i64>,
    pub partner_id: Option<i64>,
}

impl NewAccess {
    /// Fill partner and site from `defaults` where the caller left them unset.
    pub fn with_defaults(mut self, defaults: AccessDefaults) -> Self {
        self.partner_id = self.partner_id.or(defaults.partner_id);
        self.site_id = self.site_id.or(defaults.site_id);
        self
    }
}

impl Access {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        id: i64,
        company_id: i64,
        equipment_id: Option<i64>,
        site_id: Option<i64>,
        name: String,
        password: Option<String>,
        encrypted: bool,
        partner_id: Option<i64>,
        active: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            company_id,
            equipment_id,
            site_id,
            name,
            password,
            encrypted,
            partner_id,
            active,
            created_at,
            updated_at,
        }
    }

    /// The stored password: plaintext, or ciphertext if `is_encrypted`.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    pub fn has_password(&self) -> bool {
        self.password.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Re-link the record to `equipment`.
    ///
    /// The partner follows the equipment: it becomes the equipment's partner,
    /// or unset when the equipment has none or the link is cleared.
    pub fn on_equipment_change(&mut self, equipment: Option<&Equipment>) {
        self.equipment_id = equipment.map(|e| e.id);
        self.partner_id = equipment.and_then(|e| e.partner_id);
    }

    /// Replace the password with a new plaintext value.
    pub fn set_password(&mut self, plaintext: impl Into<String>) {
        if let Some(mut old) = self.password.replace(plaintext.into()) {
            old.zeroize();
        }
        self.encrypted = false;
    }

    /// Replace the password with a freshly generated one of `len` characters.
    pub fn generate_password(&mut self, len: usize) {
        self.set_password(generate_password(len));
    }

    /// Encrypt the plaintext password in place.
    pub fn encrypt_password(&mut self, key: &AccessKey) -> Result<()> {
        if self.encrypted {
            return Err(ItAccessError::AlreadyEncrypted);
        }
        let plaintext = self
            .password
            .as_deref()
            .ok_or(ItAccessError::MissingPassword(self.id))?;

        let token = fernet::encrypt(key, plaintext.as_bytes())?;
        let stored = URL_SAFE.encode(token.as_bytes());

        if let Some(mut old) = self.password.replace(stored) {
            old.zeroize();
        }
        self.encrypted = true;
        Ok(())
    }

    /// Decrypt the stored password without modifying the record.
    ///
    /// `ttl_secs` bounds the token age; `None` accepts tokens of any age.
    pub fn decrypt_password(
        &self,
        key: &AccessKey,
        ttl_secs: Option<u64>,
    ) -> Result<Zeroizing<String>> {
        let token = self.stored_token()?;
        let plaintext = fernet::decrypt(key, &token, ttl_secs)?;

        String::from_utf8(plaintext).map(Zeroizing::new).map_err(|e| {
            let mut bad_bytes = e.into_bytes();
            bad_bytes.zeroize();
            ItAccessError::SerializationError("decrypted password is not valid UTF-8".into())
        })
    }

    /// When the stored token was created.
    pub fn encrypted_at(&self, key: &AccessKey) -> Result<DateTime<Utc>> {
        let token = self.stored_token()?;
        fernet::extract_timestamp(key, &token)
    }

    /// Unwrap the outer base64 layer to get the Fernet token text.
    fn stored_token(&self) -> Result<String> {
        if !self.encrypted {
            return Err(ItAccessError::NotEncrypted(self.id));
        }
        let stored = self
            .password
            .as_deref()
            .ok_or(ItAccessError::MissingPassword(self.id))?;
        let raw = URL_SAFE
            .decode(stored.trim().as_bytes())
            .map_err(|_| ItAccessError::InvalidToken)?;
        String::from_utf8(raw).map_err(|_| ItAccessError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::kdf::derive_key;
    use crate::crypto::ALPHABET;

    fn record(password: Option<&str>) -> Access {
        let now = Utc::now();
        Access::from_parts(
            1,
            1,
            None,
            None,
            "admin".into(),
            password.map(str::to_string),
            false,
            None,
            true,
            now,
            now,
        )
    }

    fn key() -> AccessKey {
        AccessKey::new([0x5A; 32])
    }

    #[test]
    fn encrypt_then_decrypt_roundtrip() {
        let mut access = record(Some("p@ssw0rd-ñ"));
        access.encrypt_password(&key()).unwrap();

        assert!(access.is_encrypted());
        assert_ne!(access.password(), Some("p@ssw0rd-ñ"));
        assert_eq!(access.decrypt_password(&key(), None).unwrap().as_str(), "p@ssw0rd-ñ");
    }

    #[test]
    fn encrypting_twice_fails() {
        let mut access = record(Some("secret"));
        access.encrypt_password(&key()).unwrap();
        let stored = access.password().map(str::to_string);

        let err = access.encrypt_password(&key()).unwrap_err();
        assert!(matches!(err, ItAccessError::AlreadyEncrypted));
        assert_eq!(err.to_string(), "Password already encrypted");
        assert_eq!(access.password().map(str::to_string), stored);
    }

    #[test]
    fn encrypt_without_password_fails() {
        let mut access = record(None);
        assert!(matches!(
            access.encrypt_password(&key()),
            Err(ItAccessError::MissingPassword(1))
        ));
    }

    #[test]
    fn decrypt_plaintext_record_fails() {
        let access = record(Some("plain"));
        assert!(matches!(
            access.decrypt_password(&key(), None),
            Err(ItAccessError::NotEncrypted(1))
        ));
    }

    #[test]
    fn decrypt_with_other_key_is_invalid_token() {
        let mut access = record(Some("secret"));
        access.encrypt_password(&key()).unwrap();
        let other = AccessKey::new([0x11; 32]);
        assert!(matches!(
            access.decrypt_password(&other, None),
            Err(ItAccessError::InvalidToken)
        ));
    }

    #[test]
    fn decrypts_password_stored_by_earlier_installations() {
        let key = derive_key(b"correct horse battery staple", b"0123456789abcdef").unwrap();
        let mut access = record(None);
        access.password = Some("Z0FBQUFBQmxVX0VBRUJFU0V4UVZGaGNZR1JvYkhCMGVIOXoyS2Y4SF82TnZqbDNxZXV2Vmk5X3B5aV9uMTNSVV9lclBzWHE5N3U2c0c2Wjd6TlZMLUZjMVh3Yi1RUl8yVEE9PQ==".into());
        access.encrypted = true;

        assert_eq!(access.decrypt_password(&key, None).unwrap().as_str(), "s3cr3t-P@ss");
        assert_eq!(access.encrypted_at(&key).unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn set_password_clears_encrypted_flag() {
        let mut access = record(Some("secret"));
        access.encrypt_password(&key()).unwrap();
        access.set_password("new-one");
        assert!(!access.is_encrypted());
        assert_eq!(access.password(), Some("new-one"));
    }

    #[test]
    fn generated_password_replaces_ciphertext() {
        let mut access = record(Some("secret"));
        access.encrypt_password(&key()).unwrap();
        access.generate_password(16);

        assert!(!access.is_encrypted());
        let p = access.password().unwrap();
        assert_eq!(p.len(), 16);
        assert!(p.bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn equipment_change_follows_partner() {
        let mut access = record(None);
        let server = Equipment {
            id: 7,
            name: "Server1".into(),
            partner_id: Some(3),
            site_id: Some(4),
        };
        access.on_equipment_change(Some(&server));
        assert_eq!(access.equipment_id, Some(7));
        assert_eq!(access.partner_id, Some(3));

        access.on_equipment_change(None);
        assert_eq!(access.equipment_id, None);
        assert_eq!(access.partner_id, None);
    }

    #[test]
    fn new_access_keeps_explicit_values_over_defaults() {
        let defaults = AccessDefaults {
            partner_id: Some(1),
            site_id: Some(2),
        };
        let new = NewAccess {
            name: "root".into(),
            site_id: Some(9),
            ..NewAccess::default()
        }
        .with_defaults(defaults);
        assert_eq!(new.partner_id, Some(1));
        assert_eq!(new.site_id, Some(9));
    }
}
