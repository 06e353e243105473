//! Error types for lockdown-core
//!
//! Centralized error handling using `thiserror` for ergonomic error definitions.

use thiserror::Error;

/// Main error type for lockdown-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// Path to the missing config file
        path: String,
    },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    ConfigValue {
        /// Configuration key
        key: String,
        /// Error message
        message: String,
    },

    /// Settings file exists but could not be decoded
    #[error("Settings file '{path}' is not a valid JSON object: {message}")]
    SettingsDecode {
        /// Path to the settings file
        path: String,
        /// Decoder message
        message: String,
    },

    /// Settings could not be persisted
    #[error("Failed to write settings to '{path}': {source}")]
    SettingsWrite {
        /// Path to the settings file
        path: String,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Proxy engine refused to start
    #[error("Tunnel start failed: {0}")]
    TunnelStart(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a config value error
    pub fn config_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValue {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a tunnel start error
    pub fn tunnel_start(message: impl Into<String>) -> Self {
        Self::TunnelStart(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config_value("metrics.log_reduction", "Must be greater than 0");
        assert!(err.to_string().contains("metrics.log_reduction"));
        assert!(err.to_string().contains("Must be greater than 0"));

        let err = Error::tunnel_start("address in use");
        assert!(err.to_string().contains("address in use"));
    }

    #[test]
    fn test_settings_write_keeps_source() {
        let err = Error::SettingsWrite {
            path: "settings.json".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("settings.json"));
    }
}
