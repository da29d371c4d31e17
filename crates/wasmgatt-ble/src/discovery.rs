//! Adapter setup and scanning by advertised name

use std::collections::HashSet;

use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, PeripheralId};
use futures::stream::StreamExt;
use smallvec::SmallVec;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::config::BleTransportConfig;
use crate::device::DiscoveredDevice;
use crate::error::BleTransportError;

// ----------------------------------------------------------------------------
// Discovery Implementation
// ----------------------------------------------------------------------------

/// Devices found by a scan, usually only a handful
pub type ScanResults = SmallVec<[DiscoveredDevice; 8]>;

/// Finds the firmware device over a btleplug adapter
pub struct BleDiscovery {
    config: BleTransportConfig,
    adapter: Option<Adapter>,
}

impl BleDiscovery {
    pub fn new(config: BleTransportConfig) -> Self {
        Self {
            config,
            adapter: None,
        }
    }

    /// Initialize the first available BLE adapter
    pub async fn initialize_adapter(&mut self) -> Result<&Adapter, BleTransportError> {
        let manager = Manager::new().await?;
        let adapter = manager
            .adapters()
            .await?
            .into_iter()
            .next()
            .ok_or(BleTransportError::AdapterNotAvailable)?;

        match adapter.adapter_info().await {
            Ok(info) => info!("Using BLE adapter: {}", info),
            Err(e) => debug!("Adapter info unavailable: {}", e),
        }
        let adapter: &Adapter = self.adapter.insert(adapter);
        Ok(adapter)
    }

    async fn adapter(&mut self) -> Result<Adapter, BleTransportError> {
        match &self.adapter {
            Some(adapter) => Ok(adapter.clone()),
            None => Ok(self.initialize_adapter().await?.clone()),
        }
    }

    /// Scan for the full scan timeout and return every named device seen
    pub async fn scan(&mut self) -> Result<ScanResults, BleTransportError> {
        let adapter = self.adapter().await?;
        let mut found = ScanResults::new();
        let mut seen = HashSet::new();

        self.run_scan(&adapter, |device| {
            if seen.insert(device.address.clone()) {
                found.push(device);
            }
            false
        })
        .await?;

        info!("Scan complete: {} named devices", found.len());
        Ok(found)
    }

    /// Scan until a device matching the configured name appears
    pub async fn find_device(&mut self) -> Result<DiscoveredDevice, BleTransportError> {
        let adapter = self.adapter().await?;
        let mut matched = None;
        let config = self.config.clone();

        info!("Scanning for '{}'", config.device_name);
        self.run_scan(&adapter, |device| {
            if config.matches_name(&device.name) {
                matched = Some(device);
                return true;
            }
            false
        })
        .await?;

        matched.ok_or_else(|| {
            warn!("Device '{}' not found", config.device_name);
            BleTransportError::DeviceNotFound {
                name: config.device_name.clone(),
            }
        })
    }

    /// Drive the adapter event stream until `visit` returns true or the scan times out
    async fn run_scan(
        &self,
        adapter: &Adapter,
        mut visit: impl FnMut(DiscoveredDevice) -> bool,
    ) -> Result<(), BleTransportError> {
        let mut events = adapter
            .events()
            .await
            .map_err(|e| BleTransportError::EventStreamFailed(e.to_string()))?;
        adapter.start_scan(ScanFilter::default()).await?;

        let deadline = Instant::now() + self.config.scan_timeout;
        while let Ok(Some(event)) = timeout_at(deadline, events.next()).await {
            let id = match event {
                CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => id,
                _ => continue,
            };
            if let Some(device) = describe(adapter, &id).await {
                debug!("Discovered {} ({})", device.name, device.address);
                if visit(device) {
                    break;
                }
            }
        }

        if let Err(e) = adapter.stop_scan().await {
            warn!("Failed to stop scan: {}", e);
        }
        Ok(())
    }
}

async fn describe(adapter: &Adapter, id: &PeripheralId) -> Option<DiscoveredDevice> {
    let peripheral = adapter.peripheral(id).await.ok()?;
    let properties = peripheral.properties().await.ok()??;
    let name = properties.local_name?;
    Some(DiscoveredDevice {
        name,
        address: properties.address.to_string(),
        rssi: properties.rssi,
        peripheral,
    })
}
