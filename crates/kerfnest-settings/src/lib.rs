//! kerfnest Settings Crate
//!
//! Handles the configuration file: import, kerf, nesting and material
//! sections, JSON or TOML on disk.

pub mod config;
pub mod error;

pub use config::{Config, ImportSettings, KerfSettings, MaterialSettings, NestingSettings};
pub use error::{ConfigError, SettingsError, SettingsResult};
