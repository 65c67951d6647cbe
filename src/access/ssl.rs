//! SSL artifacts stored alongside an access record.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::errors::ItAccessError;

/// The four artifact slots of an access record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SslKind {
    /// Certificate signing request.
    Csr,
    /// Certificate.
    Cert,
    /// Public key.
    PublicKey,
    /// Private key.
    PrivateKey,
}

impl SslKind {
    pub const ALL: [SslKind; 4] = [Self::Csr, Self::Cert, Self::PublicKey, Self::PrivateKey];

    /// Name stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csr => "csr",
            Self::Cert => "cert",
            Self::PublicKey => "public-key",
            Self::PrivateKey => "private-key",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Csr => "CSR",
            Self::Cert => "Cert",
            Self::PublicKey => "Public Key",
            Self::PrivateKey => "Private Key",
        }
    }
}

impl fmt::Display for SslKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SslKind {
    type Err = ItAccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ItAccessError::InvalidField {
                field: "ssl kind",
                reason: format!("unknown artifact '{s}' (csr, cert, public-key, private-key)"),
            })
    }
}

/// One stored artifact: the file name it was attached from and its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SslArtifact {
    pub kind: SslKind,
    pub filename: Option<String>,
    pub data: Vec<u8>,
}
