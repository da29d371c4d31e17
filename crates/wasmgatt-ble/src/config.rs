//! BLE transport configuration

use std::time::Duration;

use wasmgatt_core::config::DEFAULT_ATT_MTU;
use wasmgatt_core::uuids::DEFAULT_DEVICE_NAME;

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Configuration for the btleplug transport
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BleTransportConfig {
    /// Advertised name of the device to connect to
    pub device_name: String,
    /// Require the advertised name to equal `device_name` instead of containing it
    pub exact_name_match: bool,
    /// Maximum time to scan for the device
    pub scan_timeout: Duration,
    /// Maximum time to wait for connection and service discovery
    pub connection_timeout: Duration,
    /// Maximum time for a single read or write
    pub io_timeout: Duration,
    /// ATT MTU assumed for the link (btleplug does not expose the negotiated value)
    pub assumed_mtu: u16,
}

impl Default for BleTransportConfig {
    fn default() -> Self {
        Self {
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            exact_name_match: false,
            scan_timeout: Duration::from_secs(10),
            connection_timeout: Duration::from_secs(10),
            io_timeout: Duration::from_secs(5),
            assumed_mtu: DEFAULT_ATT_MTU,
        }
    }
}

impl BleTransportConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the device name to look for
    pub fn with_device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = name.into();
        self
    }

    /// Require an exact name match
    pub fn with_exact_name_match(mut self, exact: bool) -> Self {
        self.exact_name_match = exact;
        self
    }

    /// Set scan timeout
    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    /// Set connection timeout
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set per-operation timeout
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Set the assumed ATT MTU
    pub fn with_assumed_mtu(mut self, mtu: u16) -> Self {
        self.assumed_mtu = mtu;
        self
    }

    /// Whether an advertised name selects the configured device
    pub fn matches_name(&self, advertised: &str) -> bool {
        if self.exact_name_match {
            advertised == self.device_name
        } else {
            advertised.contains(&self.device_name)
        }
    }
}
