//! Device Information Service reader

use uuid::Uuid;

use crate::errors::{DecodingError, Result};
use crate::transport::GattTransport;
use crate::uuids::device_info;

/// Identification strings published by the device
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct DeviceInfo {
    pub manufacturer: String,
    pub model: String,
    pub firmware_revision: String,
    pub hardware_revision: String,
    pub software_revision: String,
}

pub struct DeviceInfoClient<T> {
    transport: T,
}

impl<T: GattTransport> DeviceInfoClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Read a UTF-8 characteristic, trimming trailing NULs
    pub async fn read_string(&self, characteristic: Uuid) -> Result<String> {
        let mut bytes = self.transport.read(characteristic).await?;
        while bytes.last() == Some(&0) {
            bytes.pop();
        }
        String::from_utf8(bytes).map_err(|_| DecodingError::InvalidUtf8 { characteristic }.into())
    }

    pub async fn read_all(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo {
            manufacturer: self.read_string(device_info::MANUFACTURER_NAME).await?,
            model: self.read_string(device_info::MODEL_NUMBER).await?,
            firmware_revision: self.read_string(device_info::FIRMWARE_REVISION).await?,
            hardware_revision: self.read_string(device_info::HARDWARE_REVISION).await?,
            software_revision: self.read_string(device_info::SOFTWARE_REVISION).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::WasmGattError;
    use crate::transport::MockTransport;

    #[tokio::test]
    async fn test_read_all() {
        let mock = MockTransport::new();
        mock.set_value(device_info::MANUFACTURER_NAME, b"Nordic\0\0".to_vec());
        mock.set_value(device_info::MODEL_NUMBER, b"nRF5340".to_vec());
        mock.set_value(device_info::FIRMWARE_REVISION, b"1.0.0".to_vec());
        mock.set_value(device_info::HARDWARE_REVISION, b"A".to_vec());
        mock.set_value(device_info::SOFTWARE_REVISION, Vec::new());

        let info = DeviceInfoClient::new(&mock).read_all().await.unwrap();
        assert_eq!(info.manufacturer, "Nordic");
        assert_eq!(info.model, "nRF5340");
        assert_eq!(info.software_revision, "");
    }

    #[tokio::test]
    async fn test_invalid_utf8() {
        let mock = MockTransport::new();
        mock.set_value(device_info::MODEL_NUMBER, vec![0xFF, 0xFE]);

        assert_eq!(
            DeviceInfoClient::new(&mock)
                .read_string(device_info::MODEL_NUMBER)
                .await,
            Err(WasmGattError::Decoding(DecodingError::InvalidUtf8 {
                characteristic: device_info::MODEL_NUMBER
            }))
        );
    }
}
