//! assetflow Settings Crate
//!
//! Handles pipeline configuration and manifest files.

pub mod config;
pub mod error;
pub mod manifest;

pub use config::{EventSettings, FileFormat, LoaderSettings, PipelineConfig, WatchdogSettings};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
pub use manifest::{load_manifest, parse_manifest, save_manifest};
