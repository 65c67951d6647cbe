//! Project configuration loaded from `.itaccess.toml`.

pub mod settings;

pub use settings::Settings;
