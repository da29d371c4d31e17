//! wasmgatt CLI configuration
//!
//! Configuration is layered with figment, lowest priority first:
//! - Default values
//! - `wasmgatt.toml` in the working directory, or the file given by `--config`
//! - Environment variables (`WASMGATT_*`, nested keys separated by `__`,
//!   e.g. `WASMGATT_BLE__DEVICE_NAME`)
//! - Command line flags

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use wasmgatt_ble::BleTransportConfig;
use wasmgatt_core::protocol::upload::{max_chunk_for_mtu, ATT_OVERHEAD, UPLOAD_HEADER_SIZE};
use wasmgatt_core::ProtocolConfig;

/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "wasmgatt.toml";

/// Smallest ATT MTU a BLE link can negotiate
const MIN_ATT_MTU: u16 = 23;

// ----------------------------------------------------------------------------
// CLI Application Configuration
// ----------------------------------------------------------------------------

/// Complete configuration for the wasmgatt CLI
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// BLE scan, connection and I/O settings
    pub ble: BleTransportConfig,
    /// Packet pacing and encoding policy
    pub protocol: ProtocolConfig,
    /// Output settings
    pub cli: CliConfig,
}

/// CLI-specific configuration options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Enable verbose logging output
    pub verbose: bool,
    /// Print results as JSON instead of text
    pub json: bool,
    /// Print every packet written during a dry run
    pub dump_writes: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            json: false,
            dump_writes: true,
        }
    }
}

// ----------------------------------------------------------------------------
// Configuration Loading Logic
// ----------------------------------------------------------------------------

impl AppConfig {
    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::Loading(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        Self::extract(Self::base_figment(path))
    }

    /// Load configuration and apply command line overrides on top
    pub fn load_with_overrides(
        path: Option<&Path>,
        device: Option<String>,
        verbose: bool,
        json: bool,
    ) -> Result<Self, ConfigError> {
        let mut figment = match path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::Loading(format!(
                    "Config file not found: {}",
                    path.display()
                )))
            }
            Some(path) => Self::base_figment(path),
            None => Self::base_figment(Path::new(DEFAULT_CONFIG_FILE)),
        };

        if let Some(name) = device {
            figment = figment.merge(("ble.device_name", name));
        }
        if verbose {
            figment = figment.merge(("cli.verbose", true));
        }
        if json {
            figment = figment.merge(("cli.json", true));
        }

        Self::extract(figment)
    }

    fn base_figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("WASMGATT_").split("__"))
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: AppConfig = figment
            .extract()
            .map_err(|e| ConfigError::Loading(format!("Failed to load configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ble.device_name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "BLE device name must not be empty".to_string(),
            ));
        }

        if self.ble.assumed_mtu < MIN_ATT_MTU {
            return Err(ConfigError::Validation(format!(
                "BLE MTU must be at least {}, got {}",
                MIN_ATT_MTU, self.ble.assumed_mtu
            )));
        }

        if self.protocol.chunk_size == 0 {
            return Err(ConfigError::Validation(
                "Upload chunk size must be greater than 0".to_string(),
            ));
        }

        let max_chunk = max_chunk_for_mtu(self.ble.assumed_mtu);
        if self.protocol.chunk_size > max_chunk {
            return Err(ConfigError::Validation(format!(
                "Upload chunk size {} plus the {}-byte header exceeds MTU {} less {} bytes of ATT overhead (max chunk {})",
                self.protocol.chunk_size,
                UPLOAD_HEADER_SIZE,
                self.ble.assumed_mtu,
                ATT_OVERHEAD,
                max_chunk
            )));
        }

        if self.protocol.max_upload_size == 0 {
            return Err(ConfigError::Validation(
                "Maximum upload size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Create example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&AppConfig::default())
            .unwrap_or_else(|_| "# Failed to generate example config".to_string())
    }
}

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Configuration-related errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {0}")]
    Loading(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
