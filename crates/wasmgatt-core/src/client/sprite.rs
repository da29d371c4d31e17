//! Sprite registry client

use tracing::{debug, info, warn};

use crate::errors::{DecodingError, RemoteError, Result};
use crate::protocol::sprite::{
    Bitmap, RegistryStatus, SpriteDownloadResponse, SpriteRequest, SpriteStatus,
    SpriteUploadPacket, VerifyResponse,
};
use crate::transport::{GattTransport, WriteMode};
use crate::uuids::sprite;

/// Store, fetch and verify 16x16 sprites
pub struct SpriteClient<T> {
    transport: T,
}

impl<T: GattTransport> SpriteClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Store a bitmap under `sprite_id`; the CRC is computed here
    pub async fn upload(&self, sprite_id: u16, bitmap: &Bitmap) -> Result<()> {
        let packet = SpriteUploadPacket::new(sprite_id, *bitmap)?;
        info!("Uploading sprite {} (crc {:#06x})", sprite_id, packet.crc16);
        self.transport
            .write(sprite::UPLOAD, &packet.to_bytes(), WriteMode::WithResponse)
            .await?;
        Ok(())
    }

    /// Fetch a stored bitmap, checking its CRC locally
    pub async fn download(&self, sprite_id: u16) -> Result<Bitmap> {
        let request = SpriteRequest::new(sprite_id)?;
        self.transport
            .write(sprite::DOWNLOAD_REQUEST, &request.to_bytes(), WriteMode::WithResponse)
            .await?;

        let bytes = self.transport.read(sprite::DOWNLOAD_RESPONSE).await?;
        let response = SpriteDownloadResponse::from_bytes(&bytes)?;
        debug!("Download response: id={} status={:?}", response.sprite_id, response.status);

        if response.status != SpriteStatus::Success {
            return Err(RemoteError::SpriteRejected {
                sprite_id,
                status: response.status,
            }
            .into());
        }
        if response.sprite_id != sprite_id {
            return Err(DecodingError::SpriteIdMismatch {
                expected: sprite_id,
                actual: response.sprite_id,
            }
            .into());
        }
        if !response.crc_valid() {
            let computed = response.bitmap.crc();
            warn!(
                "Sprite {} CRC mismatch: received {:#06x}, computed {:#06x}",
                sprite_id, response.crc16, computed
            );
            return Err(DecodingError::CrcMismatch {
                sprite_id,
                received: response.crc16,
                computed,
            }
            .into());
        }

        Ok(response.bitmap)
    }

    /// Ask the device to recheck a stored sprite's CRC
    pub async fn verify(&self, sprite_id: u16) -> Result<VerifyResponse> {
        let request = SpriteRequest::new(sprite_id)?;
        self.transport
            .write(sprite::VERIFY_REQUEST, &request.to_bytes(), WriteMode::WithResponse)
            .await?;

        let bytes = self.transport.read(sprite::VERIFY_RESPONSE).await?;
        let response = VerifyResponse::from_bytes(&bytes)?;
        if response.sprite_id != sprite_id {
            return Err(DecodingError::SpriteIdMismatch {
                expected: sprite_id,
                actual: response.sprite_id,
            }
            .into());
        }
        Ok(response)
    }

    pub async fn registry_status(&self) -> Result<RegistryStatus> {
        let bytes = self.transport.read(sprite::REGISTRY_STATUS).await?;
        Ok(RegistryStatus::from_bytes(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{EncodingError, WasmGattError};
    use crate::protocol::sprite::VerifyStatus;
    use crate::transport::MockTransport;

    fn stored(sprite_id: u16, bitmap: Bitmap, status: SpriteStatus) -> Vec<u8> {
        SpriteDownloadResponse {
            sprite_id,
            bitmap,
            crc16: bitmap.crc(),
            status,
        }
        .to_bytes()
        .to_vec()
    }

    #[tokio::test]
    async fn test_upload_packet() {
        let mock = MockTransport::new();
        SpriteClient::new(&mock)
            .upload(42, &Bitmap::checkerboard())
            .await
            .unwrap();

        let writes = mock.writes_to(sprite::UPLOAD);
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].len(), 36);
        assert_eq!(&writes[0][..2], &[42, 0]);
    }

    #[tokio::test]
    async fn test_download_roundtrip() {
        let mock = MockTransport::new();
        mock.push_read(sprite::DOWNLOAD_RESPONSE, stored(7, Bitmap::border(), SpriteStatus::Success));

        let bitmap = SpriteClient::new(&mock).download(7).await.unwrap();
        assert_eq!(bitmap, Bitmap::border());
        assert_eq!(mock.writes_to(sprite::DOWNLOAD_REQUEST), vec![vec![7, 0]]);
    }

    #[tokio::test]
    async fn test_download_detects_corruption() {
        let mock = MockTransport::new();
        let mut bytes = stored(7, Bitmap::border(), SpriteStatus::Success);
        bytes[5] ^= 0x80;
        mock.push_read(sprite::DOWNLOAD_RESPONSE, bytes);

        assert!(matches!(
            SpriteClient::new(&mock).download(7).await,
            Err(WasmGattError::Decoding(DecodingError::CrcMismatch { sprite_id: 7, .. }))
        ));
    }

    #[tokio::test]
    async fn test_download_not_found() {
        let mock = MockTransport::new();
        mock.push_read(sprite::DOWNLOAD_RESPONSE, stored(9, Bitmap::default(), SpriteStatus::NotFound));

        assert_eq!(
            SpriteClient::new(&mock).download(9).await,
            Err(WasmGattError::Remote(RemoteError::SpriteRejected {
                sprite_id: 9,
                status: SpriteStatus::NotFound
            }))
        );
    }

    #[tokio::test]
    async fn test_invalid_id_rejected_locally() {
        let mock = MockTransport::new();
        assert_eq!(
            SpriteClient::new(&mock).download(0xFFFF).await,
            Err(WasmGattError::Encoding(EncodingError::InvalidSpriteId(0xFFFF)))
        );
        assert!(mock.writes().is_empty());
    }

    #[tokio::test]
    async fn test_verify() {
        let mock = MockTransport::new();
        mock.push_read(sprite::VERIFY_RESPONSE, vec![3, 0, 0xCD, 0xAB, 0xCD, 0xAB, 0x00, 0x00]);

        let response = SpriteClient::new(&mock).verify(3).await.unwrap();
        assert_eq!(response.status, VerifyStatus::Valid);
        assert!(response.is_valid());
    }
}
