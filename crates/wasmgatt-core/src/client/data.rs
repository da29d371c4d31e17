//! Data service client and MTU probe

use tracing::{debug, info, warn};

use crate::errors::{EncodingError, Result};
use crate::protocol::data::{test_pattern, TransferStatus, DATA_BUFFER_SIZE};
use crate::transport::{GattTransport, WriteMode};
use crate::uuids::data;

/// Payload sizes tried by [`DataClient::mtu_probe`] besides the link maximum
const PROBE_SIZES: [usize; 2] = [20, 47];

/// Outcome of one MTU probe size
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ProbeResult {
    pub size: usize,
    pub echoed: bool,
    pub error: Option<String>,
}

pub struct DataClient<T> {
    transport: T,
}

impl<T: GattTransport> DataClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Largest single upload the link and firmware buffer accept
    pub fn max_upload_len(&self) -> usize {
        self.transport.max_write_len().min(DATA_BUFFER_SIZE)
    }

    pub async fn upload(&self, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Err(EncodingError::EmptyPayload.into());
        }
        let max = self.max_upload_len();
        if bytes.len() > max {
            return Err(EncodingError::PayloadTooLarge {
                len: bytes.len(),
                max,
            }
            .into());
        }

        debug!("Data upload: {} bytes", bytes.len());
        self.transport
            .write(data::UPLOAD, bytes, WriteMode::WithResponse)
            .await?;
        Ok(())
    }

    pub async fn download(&self) -> Result<Vec<u8>> {
        Ok(self.transport.read(data::DOWNLOAD).await?)
    }

    pub async fn transfer_status(&self) -> Result<TransferStatus> {
        let bytes = self.transport.read(data::TRANSFER_STATUS).await?;
        Ok(TransferStatus::from_bytes(&bytes)?)
    }

    /// Upload `bytes` and check the device echoes them back unchanged
    pub async fn echo(&self, bytes: &[u8]) -> Result<bool> {
        self.upload(bytes).await?;
        let echoed = self.download().await?;
        Ok(echoed == bytes)
    }

    /// Echo test patterns of increasing size up to the link maximum
    pub async fn mtu_probe(&self) -> Vec<ProbeResult> {
        let max = self.max_upload_len();
        let mut sizes: Vec<usize> = PROBE_SIZES.iter().copied().filter(|&s| s < max).collect();
        sizes.push(max);

        info!("MTU probe: mtu={} sizes={:?}", self.transport.mtu(), sizes);

        let mut results = Vec::with_capacity(sizes.len());
        for size in sizes {
            let result = match self.echo(&test_pattern(size)).await {
                Ok(echoed) => ProbeResult {
                    size,
                    echoed,
                    error: None,
                },
                Err(e) => {
                    warn!("Probe of {} bytes failed: {}", size, e);
                    ProbeResult {
                        size,
                        echoed: false,
                        error: Some(e.to_string()),
                    }
                }
            };
            results.push(result);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{DecodingError, WasmGattError};
    use crate::protocol::data::TransferState;
    use crate::transport::MockTransport;

    #[tokio::test]
    async fn test_echo() {
        let mock = MockTransport::new();
        mock.echo(data::UPLOAD, data::DOWNLOAD);
        assert!(DataClient::new(&mock).echo(b"hello").await.unwrap());
    }

    #[tokio::test]
    async fn test_upload_limits() {
        let mock = MockTransport::with_mtu(23);
        let client = DataClient::new(&mock);
        assert_eq!(
            client.upload(&[]).await,
            Err(WasmGattError::Encoding(EncodingError::EmptyPayload))
        );
        assert_eq!(
            client.upload(&[0; 21]).await,
            Err(WasmGattError::Encoding(EncodingError::PayloadTooLarge { len: 21, max: 20 }))
        );
        assert!(client.upload(&[0; 20]).await.is_ok());
    }

    #[tokio::test]
    async fn test_transfer_status() {
        let mock = MockTransport::new();
        mock.set_value(data::TRANSFER_STATUS, vec![0x02, 0x2C, 0x01]);
        let client = DataClient::new(&mock);

        assert_eq!(
            client.transfer_status().await.unwrap(),
            TransferStatus {
                state: TransferState::Complete,
                buffer_size: 300
            }
        );

        mock.set_value(data::TRANSFER_STATUS, vec![0x02, 0x2C]);
        assert!(matches!(
            client.transfer_status().await,
            Err(WasmGattError::Decoding(DecodingError::TooShort { .. }))
        ));
    }

    #[tokio::test]
    async fn test_mtu_probe() {
        let mock = MockTransport::with_mtu(247);
        mock.echo(data::UPLOAD, data::DOWNLOAD);

        let results = DataClient::new(&mock).mtu_probe().await;
        let sizes: Vec<usize> = results.iter().map(|r| r.size).collect();
        assert_eq!(sizes, vec![20, 47, 244]);
        assert!(results.iter().all(|r| r.echoed && r.error.is_none()));
    }

    #[tokio::test]
    async fn test_mtu_probe_small_link() {
        let mock = MockTransport::with_mtu(23);
        mock.echo(data::UPLOAD, data::DOWNLOAD);

        let results = DataClient::new(&mock).mtu_probe().await;
        let sizes: Vec<usize> = results.iter().map(|r| r.size).collect();
        assert_eq!(sizes, vec![20]);
    }

    #[tokio::test]
    async fn test_mtu_probe_records_failures() {
        let mock = MockTransport::new();
        let results = DataClient::new(&mock).mtu_probe().await;
        assert!(results.iter().all(|r| !r.echoed && r.error.is_some()));
    }
}
