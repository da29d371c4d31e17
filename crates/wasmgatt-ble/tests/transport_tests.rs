//! Hardware-free checks of how BLE failures surface through the service clients

use async_trait::async_trait;
use tokio_test::{assert_err, block_on};
use uuid::Uuid;
use wasmgatt_ble::{BleTransportConfig, BleTransportError};
use wasmgatt_core::uuids::wasm;
use wasmgatt_core::{ProtocolConfig, TransportError, WasmClient, WasmGattError, WriteMode};

/// Transport whose link has dropped: every operation fails the way a
/// disconnected `BleConnection` reports it
struct DroppedLink {
    config: BleTransportConfig,
}

#[async_trait]
impl wasmgatt_ble::GattTransport for DroppedLink {
    async fn write(
        &self,
        _characteristic: Uuid,
        _data: &[u8],
        _mode: WriteMode,
    ) -> Result<(), TransportError> {
        Err(BleTransportError::NotConnected.into())
    }

    async fn read(&self, characteristic: Uuid) -> Result<Vec<u8>, TransportError> {
        Err(BleTransportError::CharacteristicNotFound { characteristic }.into())
    }

    fn mtu(&self) -> u16 {
        self.config.assumed_mtu
    }
}

fn link() -> DroppedLink {
    DroppedLink {
        config: BleTransportConfig::default(),
    }
}

#[test]
fn test_write_failure_aborts_upload() {
    let link = link();
    let client = WasmClient::new(&link, ProtocolConfig::immediate());

    let result = block_on(client.upload(&[0x00, 0x61, 0x73, 0x6D]));
    assert_eq!(
        assert_err!(result),
        WasmGattError::Transport(TransportError::NotConnected)
    );
}

#[test]
fn test_read_failure_names_characteristic() {
    let link = link();
    let client = WasmClient::new(&link, ProtocolConfig::immediate());

    let err = assert_err!(block_on(client.status()));
    assert_eq!(
        err,
        WasmGattError::Transport(TransportError::CharacteristicNotFound {
            characteristic: wasm::STATUS
        })
    );
}

#[test]
fn test_assumed_mtu_bounds_writes() {
    let link = DroppedLink {
        config: BleTransportConfig::new().with_assumed_mtu(23),
    };
    let client = WasmClient::new(&link, ProtocolConfig::immediate());

    let err = assert_err!(block_on(client.uploader().upload(&[0; 64], 16)));
    assert!(matches!(err, WasmGattError::Encoding(_)));
}

#[test]
fn test_config_serde_round_trip() {
    let config = BleTransportConfig::new()
        .with_device_name("BenchBoard")
        .with_exact_name_match(true);
    let value = serde_json::to_value(&config).unwrap();
    let back: BleTransportConfig = serde_json::from_value(value).unwrap();
    assert_eq!(back, config);
}
