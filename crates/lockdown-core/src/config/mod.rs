//! Configuration management for Lockdown
//!
//! Provides a strongly-typed configuration system with TOML support.
//! Rule sets and metrics live in the settings store, not here; this file
//! only carries how the engine and tunnel are wired up.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General application settings
    pub general: GeneralConfig,

    /// Settings store location
    pub store: StoreConfig,

    /// Tunnel network settings
    pub tunnel: TunnelConfig,

    /// Block metrics limits
    pub metrics: MetricsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| Error::ConfigNotFound {
            path: path.display().to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(Error::from)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.store.path.trim().is_empty() {
            return Err(Error::config_value("store.path", "Must not be empty"));
        }

        if self.tunnel.mtu < 1280 {
            return Err(Error::config_value(
                "tunnel.mtu",
                format!("{} is below the IPv6 minimum of 1280", self.tunnel.mtu),
            ));
        }

        if self.tunnel.ipv6_prefix_length > 128 {
            return Err(Error::config_value(
                "tunnel.ipv6_prefix_length",
                "Must be between 0 and 128",
            ));
        }

        if self.tunnel.proxy_port == 0 {
            return Err(Error::config_value("tunnel.proxy_port", "Must be between 1 and 65535"));
        }

        let limits = &self.metrics;
        if limits.log_reduction == 0 {
            return Err(Error::config_value(
                "metrics.log_reduction",
                "Must be greater than 0",
            ));
        }
        if limits.log_reduction > limits.max_log_size {
            return Err(Error::config_value(
                "metrics.log_reduction",
                format!(
                    "{} exceeds metrics.max_log_size ({})",
                    limits.log_reduction, limits.max_log_size
                ),
            ));
        }

        Ok(())
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Profile name
    pub name: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
        }
    }
}

/// Settings store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the JSON settings file shared with the host app
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "lockdown-settings.json".to_string(),
        }
    }
}

/// Tunnel network configuration handed to the OS at start
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TunnelConfig {
    /// Tunnel interface IPv4 address
    pub ipv4_address: Ipv4Addr,
    /// Tunnel interface IPv4 subnet mask
    pub ipv4_subnet_mask: Ipv4Addr,
    /// Tunnel interface IPv6 address
    pub ipv6_address: String,
    /// Tunnel interface IPv6 prefix length
    pub ipv6_prefix_length: u8,
    /// Interface MTU
    pub mtu: u16,
    /// Local proxy listen address
    pub proxy_address: Ipv4Addr,
    /// Local proxy listen port
    pub proxy_port: u16,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            ipv4_address: Ipv4Addr::new(10, 0, 0, 8),
            ipv4_subnet_mask: Ipv4Addr::new(255, 255, 255, 0),
            // Not a well-formed IPv6 literal, but it is what the OS has always accepted.
            ipv6_address: "fe80:1ca8:5ee3:4d6d:aaf5".to_string(),
            ipv6_prefix_length: 64,
            mtu: 1500,
            proxy_address: Ipv4Addr::LOCALHOST,
            proxy_port: 9090,
        }
    }
}

impl TunnelConfig {
    /// Parse the IPv6 address, if it is a valid literal
    pub fn ipv6_addr(&self) -> Option<Ipv6Addr> {
        self.ipv6_address.parse().ok()
    }
}

/// Day log limits for block metrics
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Day log length above which it is truncated
    pub max_log_size: usize,
    /// Number of most recent entries kept after truncation
    pub log_reduction: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            max_log_size: 5000,
            log_reduction: 4500,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log file path (None = stdout only)
    pub file: Option<String>,
    /// Enable JSON format logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            json_format: false,
        }
    }
}
