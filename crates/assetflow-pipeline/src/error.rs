//! Errors raised while building a pipeline from configuration.

use assetflow_settings::SettingsError;
use thiserror::Error;

/// Failure of [`GroupSequencer::from_config`](crate::GroupSequencer::from_config).
#[derive(Error, Debug)]
pub enum SetupError {
    /// The pipeline configuration did not validate.
    #[error("Invalid pipeline config: {0}")]
    Config(#[from] SettingsError),

    /// The manifest or the bus setup was rejected.
    #[error(transparent)]
    Core(#[from] assetflow_core::Error),
}

impl SetupError {
    pub fn is_config_error(&self) -> bool {
        matches!(self, SetupError::Config(_))
    }

    pub fn is_manifest_error(&self) -> bool {
        matches!(self, SetupError::Core(e) if e.is_manifest_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assetflow_core::ManifestError;

    #[test]
    fn test_setup_error_kinds() {
        let config = SetupError::from(SettingsError::InvalidSetting {
            key: "events.channel_capacity".to_string(),
            reason: "must be positive".to_string(),
        });
        assert!(config.is_config_error());
        assert!(!config.is_manifest_error());
        assert!(config.to_string().contains("events.channel_capacity"));

        let manifest = SetupError::from(assetflow_core::Error::from(
            ManifestError::EmptyGroupName { index: 0 },
        ));
        assert!(manifest.is_manifest_error());
        assert!(!manifest.is_config_error());
    }
}
