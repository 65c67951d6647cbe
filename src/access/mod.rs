//! Access records: one credential for a piece of equipment, a site or a
//! partner.
//!
//! This module provides:
//! - The `Access` record and its password operations (`record`)
//! - Defaults taken from the equipment a record is created for (`defaults`)
//! - SSL artifact slots attached to a record (`ssl`)

pub mod defaults;
pub mod record;
pub mod ssl;

pub use defaults::AccessDefaults;
pub use record::{Access, NewAccess, RevealedPassword};
pub use ssl::{SslArtifact, SslKind};
