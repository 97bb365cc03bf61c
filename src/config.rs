//! Session configuration.
//!
//! With the `config-file` feature the configuration can be saved to and
//! loaded from a RON file.

use std::time::Duration;

use crate::core::interval_from_secs;

/// Default config file name.
#[cfg(feature = "config-file")]
pub const DEFAULT_CONFIG_FILE: &str = "keyhole.ron";

/// What the embedding caller decides about a session.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "config-file", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct KeyholeConfig {
    /// Seconds between automatic full-state dumps. Zero or less disables them.
    pub auto_report_secs: f64,
    /// Use the compact `key:value` output format.
    pub plotter_mode: bool,
}

impl KeyholeConfig {
    /// Create the default config (no auto-report, normal output).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the auto-report period in seconds.
    pub fn auto_report_secs(mut self, secs: f64) -> Self {
        self.auto_report_secs = secs;
        self
    }

    /// Enable or disable plotter output.
    pub fn plotter_mode(mut self, enabled: bool) -> Self {
        self.plotter_mode = enabled;
        self
    }

    /// The auto-report period as an interval.
    pub fn auto_report(&self) -> Duration {
        interval_from_secs(self.auto_report_secs)
    }
}

#[cfg(feature = "config-file")]
mod file {
    use std::fs;
    use std::path::Path;

    use thiserror::Error;

    use super::KeyholeConfig;

    impl KeyholeConfig {
        /// Load config from a RON file.
        pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
            let path = path.as_ref();
            let contents = fs::read_to_string(path)
                .map_err(|e| ConfigError::Io(path.display().to_string(), e.to_string()))?;

            ron::from_str(&contents)
                .map_err(|e| ConfigError::Parse(path.display().to_string(), e.to_string()))
        }

        /// Save config to a RON file.
        pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
            let path = path.as_ref();

            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    fs::create_dir_all(parent)
                        .map_err(|e| ConfigError::Io(parent.display().to_string(), e.to_string()))?;
                }
            }

            let pretty = ron::ser::PrettyConfig::new().depth_limit(2);
            let contents = ron::ser::to_string_pretty(self, pretty)
                .map_err(|e| ConfigError::Serialize(e.to_string()))?;

            fs::write(path, contents)
                .map_err(|e| ConfigError::Io(path.display().to_string(), e.to_string()))
        }

        /// Load config from file, returning default if the file is missing or invalid.
        pub fn load_or_default(path: impl AsRef<Path>) -> Self {
            Self::load(path).unwrap_or_default()
        }
    }

    /// Errors that can occur during config operations.
    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    pub enum ConfigError {
        /// File I/O error (path, message).
        #[error("IO error for '{0}': {1}")]
        Io(String, String),
        /// RON parse error (path, message).
        #[error("Parse error for '{0}': {1}")]
        Parse(String, String),
        /// RON serialization error.
        #[error("Serialization error: {0}")]
        Serialize(String),
    }
}

#[cfg(feature = "config-file")]
pub use file::ConfigError;
