use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in itaccess.
#[derive(Debug, Error)]
pub enum ItAccessError {
    // --- Password state errors ---
    #[error("Password already encrypted")]
    AlreadyEncrypted,

    #[error("Password of access #{0} is not encrypted")]
    NotEncrypted(i64),

    #[error("Access #{0} has no password set")]
    MissingPassword(i64),

    // --- Crypto errors ---
    #[error("Invalid token — the stored password is corrupt or was encrypted under another key")]
    InvalidToken,

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Secret state is corrupt: {0}")]
    SecretStateCorrupt(String),

    // --- Store errors ---
    #[error("Database not found at {0} — run `itaccess init` first")]
    DatabaseNotFound(PathBuf),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("{model} #{id} not found")]
    RecordNotFound { model: &'static str, id: i64 },

    #[error("{model} #{id} is still referenced and cannot be deleted")]
    ReferenceRestricted { model: &'static str, id: i64 },

    #[error("Partner #{0} is not flagged as an IT manager")]
    PartnerNotItManager(i64),

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Clipboard error: {0}")]
    ClipboardError(String),

    #[error("User cancelled operation")]
    UserCancelled,

    #[error("Audit error: {0}")]
    AuditError(String),
}

/// Convenience type alias for itaccess results.
pub type Result<T> = std::result::Result<T, ItAccessError>;
