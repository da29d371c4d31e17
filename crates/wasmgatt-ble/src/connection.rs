//! Connected device implementing the GATT transport seam

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{Characteristic, Peripheral as _, WriteType};
use btleplug::platform::Peripheral;
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{debug, error, info};
use uuid::Uuid;
use wasmgatt_core::uuids::characteristic_name;
use wasmgatt_core::{GattTransport, TransportError, WriteMode};

use crate::config::BleTransportConfig;
use crate::device::{ConnectionState, DiscoveredDevice};
use crate::discovery::BleDiscovery;
use crate::error::BleTransportError;

// ----------------------------------------------------------------------------
// Connection Management
// ----------------------------------------------------------------------------

/// A connected firmware device
pub struct BleConnection {
    config: BleTransportConfig,
    name: String,
    peripheral: Peripheral,
    characteristics: HashMap<Uuid, Characteristic>,
    state: RwLock<ConnectionState>,
}

impl BleConnection {
    /// Scan for the configured device name and connect to it
    pub async fn connect(config: BleTransportConfig) -> Result<Self, BleTransportError> {
        let mut discovery = BleDiscovery::new(config.clone());
        let device = discovery.find_device().await?;
        Self::connect_device(device, config).await
    }

    /// Connect to an already discovered device and resolve its characteristics
    pub async fn connect_device(
        device: DiscoveredDevice,
        config: BleTransportConfig,
    ) -> Result<Self, BleTransportError> {
        let peripheral = device.peripheral;
        info!("Connecting to {} ({})", device.name, device.address);

        with_timeout("connect", config.connection_timeout, peripheral.connect())
            .await?
            .map_err(|e| {
                error!("Failed to connect to {}: {}", device.name, e);
                BleTransportError::ConnectionFailed(e.to_string())
            })?;

        with_timeout(
            "service discovery",
            config.connection_timeout,
            peripheral.discover_services(),
        )
        .await?
        .map_err(|e| BleTransportError::ServiceDiscoveryFailed(e.to_string()))?;

        let characteristics: HashMap<Uuid, Characteristic> = peripheral
            .characteristics()
            .into_iter()
            .map(|c| (c.uuid, c))
            .collect();
        info!(
            "Connected to {}: {} characteristics",
            device.name,
            characteristics.len()
        );
        for uuid in characteristics.keys() {
            debug!(
                "  {} {}",
                uuid,
                characteristic_name(uuid).unwrap_or("(unknown)")
            );
        }

        Ok(Self {
            config,
            name: device.name,
            peripheral,
            characteristics,
            state: RwLock::new(ConnectionState::Connected),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Whether the device exposes a characteristic
    pub fn has_characteristic(&self, uuid: &Uuid) -> bool {
        self.characteristics.contains_key(uuid)
    }

    pub async fn disconnect(&self) -> Result<(), BleTransportError> {
        let mut state = self.state.write().await;
        if state.is_connected() {
            if let Err(e) = self.peripheral.disconnect().await {
                error!("Failed to disconnect from {}: {}", self.name, e);
                *state = ConnectionState::Failed;
                return Err(e.into());
            }
            info!("Disconnected from {}", self.name);
        }
        *state = ConnectionState::Disconnected;
        Ok(())
    }

    async fn characteristic(&self, uuid: Uuid) -> Result<&Characteristic, BleTransportError> {
        if !self.state.read().await.is_connected() {
            return Err(BleTransportError::NotConnected);
        }
        self.characteristics
            .get(&uuid)
            .ok_or(BleTransportError::CharacteristicNotFound {
                characteristic: uuid,
            })
    }
}

#[async_trait]
impl GattTransport for BleConnection {
    async fn write(
        &self,
        characteristic: Uuid,
        data: &[u8],
        mode: WriteMode,
    ) -> Result<(), TransportError> {
        let target = self.characteristic(characteristic).await?;
        let write_type = match mode {
            WriteMode::WithResponse => WriteType::WithResponse,
            WriteMode::WithoutResponse => WriteType::WithoutResponse,
        };

        with_timeout(
            "write",
            self.config.io_timeout,
            self.peripheral.write(target, data, write_type),
        )
        .await?
        .map_err(|e| BleTransportError::WriteFailed {
            characteristic,
            reason: e.to_string(),
        })?;
        Ok(())
    }

    async fn read(&self, characteristic: Uuid) -> Result<Vec<u8>, TransportError> {
        let target = self.characteristic(characteristic).await?;
        let value = with_timeout("read", self.config.io_timeout, self.peripheral.read(target))
            .await?
            .map_err(|e| BleTransportError::ReadFailed {
                characteristic,
                reason: e.to_string(),
            })?;
        Ok(value)
    }

    fn mtu(&self) -> u16 {
        self.config.assumed_mtu
    }
}

/// Bound a btleplug operation by a policy timeout
async fn with_timeout<F: Future>(
    operation: &str,
    duration: Duration,
    future: F,
) -> Result<F::Output, BleTransportError> {
    timeout(duration, future)
        .await
        .map_err(|_| BleTransportError::Timeout {
            operation: operation.to_string(),
            duration_ms: duration.as_millis() as u64,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result = with_timeout(
            "probe",
            Duration::from_millis(10),
            tokio::time::sleep(Duration::from_secs(5)),
        )
        .await;
        assert!(matches!(
            result,
            Err(BleTransportError::Timeout { duration_ms: 10, .. })
        ));
    }

    #[tokio::test]
    async fn test_with_timeout_passes_output() {
        let result = with_timeout("probe", Duration::from_secs(1), async { 7 }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
