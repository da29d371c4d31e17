//! DFU control point client

use tracing::{debug, info};

use crate::config::ProtocolConfig;
use crate::errors::{RemoteError, Result};
use crate::protocol::dfu::{image_chunks, DfuCommand, DfuControlPacket, DfuResponse};
use crate::transport::{GattTransport, WriteMode};
use crate::uuids::dfu;

use super::pause;

pub struct DfuClient<T> {
    transport: T,
    config: ProtocolConfig,
}

impl<T: GattTransport> DfuClient<T> {
    pub fn new(transport: T, config: ProtocolConfig) -> Self {
        Self { transport, config }
    }

    pub async fn send_command(&self, command: DfuCommand, params: &[u8]) -> Result<()> {
        let packet = DfuControlPacket::new(command, params)?;
        debug!("DFU command {:?}", command);
        self.transport
            .write(dfu::CONTROL_POINT, &packet.to_bytes(), WriteMode::WithResponse)
            .await?;
        Ok(())
    }

    /// Stream an image to the packet characteristic in 20-byte writes
    pub async fn send_image(&self, image: &[u8]) -> Result<usize> {
        let mut sent = 0;
        for chunk in image_chunks(image) {
            if sent > 0 {
                pause(self.config.inter_packet_delay).await;
            }
            self.transport
                .write(dfu::PACKET, chunk, self.config.upload_write_mode)
                .await?;
            sent += 1;
        }
        info!("DFU image sent: {} bytes in {} packets", image.len(), sent);
        Ok(sent)
    }

    /// Decode a control point indication, failing on any non-success code
    pub fn check_response(bytes: &[u8]) -> Result<DfuResponse> {
        let response = DfuResponse::from_bytes(bytes)?;
        if !response.is_success() {
            return Err(RemoteError::DfuRejected { response }.into());
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::WasmGattError;
    use crate::protocol::dfu::DfuResponseCode;
    use crate::transport::MockTransport;

    #[tokio::test]
    async fn test_send_command_and_image() {
        let mock = MockTransport::new();
        let client = DfuClient::new(&mock, ProtocolConfig::immediate());

        client.send_command(DfuCommand::StartDfu, &[]).await.unwrap();
        assert_eq!(client.send_image(&[0xAB; 50]).await.unwrap(), 3);

        let control = mock.writes_to(dfu::CONTROL_POINT);
        assert_eq!(control[0].len(), 20);
        assert_eq!(control[0][0], 0x01);

        let lengths: Vec<usize> = mock.writes_to(dfu::PACKET).iter().map(Vec::len).collect();
        assert_eq!(lengths, vec![20, 20, 10]);
    }

    #[test]
    fn test_check_response() {
        assert!(DfuClient::<MockTransport>::check_response(&[0x60, 0x01, 0x01]).is_ok());
        assert_eq!(
            DfuClient::<MockTransport>::check_response(&[0x60, 0x03, 0x05]),
            Err(WasmGattError::Remote(RemoteError::DfuRejected {
                response: DfuResponse {
                    request: 0x03,
                    code: DfuResponseCode::CrcError
                }
            }))
        );
    }
}
