//! btleplug transport for the wasmgatt firmware clients
//!
//! This crate implements [`GattTransport`](wasmgatt_core::GattTransport) over
//! a real BLE link: scan for the device by advertised name, connect, resolve
//! its characteristics and perform timed reads and writes.
//!
//! ## Architecture
//!
//! - [`config`] - Scan, connection and I/O settings
//! - [`error`] - btleplug-level errors and their mapping to `TransportError`
//! - [`device`] - Discovered devices and connection state
//! - [`discovery`] - Adapter setup and scanning
//! - [`connection`] - The connected device and its transport impl
//!
//! ## Usage
//!
//! ```rust,no_run
//! use wasmgatt_ble::{BleConnection, BleTransportConfig};
//! use wasmgatt_core::{ProtocolConfig, WasmClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BleTransportConfig::new().with_device_name("Dan5340BLE");
//! let connection = BleConnection::connect(config).await?;
//!
//! let client = WasmClient::new(&connection, ProtocolConfig::default());
//! let value = client.execute("add", &[5, 7]).await?;
//! println!("add(5, 7) = {}", value);
//!
//! connection.disconnect().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod device;
pub mod discovery;
pub mod error;

// Public API exports
pub use config::BleTransportConfig;
pub use connection::BleConnection;
pub use device::{ConnectionState, DiscoveredDevice};
pub use discovery::{BleDiscovery, ScanResults};
pub use error::BleTransportError;

// Re-export the transport trait for convenience
pub use wasmgatt_core::transport::GattTransport;
