//! Store module — SQLite persistence for access records.
//!
//! This module provides:
//! - Database creation, schema and pragmas (`db`)
//! - Configuration parameters and the installation secret (`params`)
//! - Company, partner, site and equipment records (`models`)
//! - High-level `AccessStore` used by the CLI (`repository`)

pub mod db;
pub mod models;
pub mod params;
pub mod repository;

// Re-export the most commonly used items.
pub use models::{Company, Equipment, NewEquipment, Partner, Site};
pub use params::{PARAM_PASS, PARAM_SALT};
pub use repository::{AccessStore, StoreOptions};
