//! DFU control point and packet framing
//!
//! Commands are 20-byte control point writes (opcode plus 19 parameter
//! bytes). Image data goes to the packet characteristic in chunks of at most
//! 20 bytes. Responses are indicated as `[0x60, opcode, code]`.

use serde::{Deserialize, Serialize};

use crate::errors::{ensure_len, DecodingError, EncodingError};

pub const DFU_CONTROL_SIZE: usize = 20;
pub const DFU_PARAM_SIZE: usize = DFU_CONTROL_SIZE - 1;
pub const DFU_PACKET_MAX: usize = 20;

/// Opcode marking a control point indication as a response
pub const DFU_RESPONSE_OPCODE: u8 = 0x60;

pub const DFU_RESPONSE_SIZE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DfuCommand {
    StartDfu = 0x01,
    Initialize = 0x02,
    ReceiveFirmware = 0x03,
    ValidateFirmware = 0x04,
    ActivateAndReset = 0x05,
}

impl TryFrom<u8> for DfuCommand {
    type Error = DecodingError;

    fn try_from(value: u8) -> Result<Self, DecodingError> {
        match value {
            0x01 => Ok(DfuCommand::StartDfu),
            0x02 => Ok(DfuCommand::Initialize),
            0x03 => Ok(DfuCommand::ReceiveFirmware),
            0x04 => Ok(DfuCommand::ValidateFirmware),
            0x05 => Ok(DfuCommand::ActivateAndReset),
            _ => Err(DecodingError::UnknownValue {
                packet: "DfuCommand",
                value,
            }),
        }
    }
}

/// Control point write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DfuControlPacket {
    pub command: DfuCommand,
    pub param: [u8; DFU_PARAM_SIZE],
}

impl DfuControlPacket {
    pub fn new(command: DfuCommand, params: &[u8]) -> Result<Self, EncodingError> {
        if params.len() > DFU_PARAM_SIZE {
            return Err(EncodingError::PayloadTooLarge {
                len: params.len(),
                max: DFU_PARAM_SIZE,
            });
        }
        let mut param = [0u8; DFU_PARAM_SIZE];
        param[..params.len()].copy_from_slice(params);
        Ok(Self { command, param })
    }

    pub fn to_bytes(&self) -> [u8; DFU_CONTROL_SIZE] {
        let mut bytes = [0u8; DFU_CONTROL_SIZE];
        bytes[0] = self.command as u8;
        bytes[1..].copy_from_slice(&self.param);
        bytes
    }
}

/// Response code carried by a control point indication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DfuResponseCode {
    Success,
    InvalidState,
    NotSupported,
    DataSizeExceeds,
    CrcError,
    OperationFailed,
    Unknown(u8),
}

impl From<u8> for DfuResponseCode {
    fn from(value: u8) -> Self {
        match value {
            0x01 => DfuResponseCode::Success,
            0x02 => DfuResponseCode::InvalidState,
            0x03 => DfuResponseCode::NotSupported,
            0x04 => DfuResponseCode::DataSizeExceeds,
            0x05 => DfuResponseCode::CrcError,
            0x06 => DfuResponseCode::OperationFailed,
            other => DfuResponseCode::Unknown(other),
        }
    }
}

/// Decoded control point indication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DfuResponse {
    /// Opcode the response refers to
    pub request: u8,
    pub code: DfuResponseCode,
}

impl DfuResponse {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodingError> {
        ensure_len("DfuResponse", bytes, DFU_RESPONSE_SIZE)?;
        if bytes[0] != DFU_RESPONSE_OPCODE {
            return Err(DecodingError::UnknownValue {
                packet: "DfuResponse",
                value: bytes[0],
            });
        }
        Ok(Self {
            request: bytes[1],
            code: DfuResponseCode::from(bytes[2]),
        })
    }

    pub fn is_success(&self) -> bool {
        self.code == DfuResponseCode::Success
    }
}

/// Split a firmware image into packet-characteristic writes
pub fn image_chunks(image: &[u8]) -> impl Iterator<Item = &[u8]> {
    image.chunks(DFU_PACKET_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_packet_layout() {
        let packet = DfuControlPacket::new(DfuCommand::Initialize, &[0xAA, 0xBB]).unwrap();
        let bytes = packet.to_bytes();
        assert_eq!(bytes.len(), 20);
        assert_eq!(&bytes[..3], &[0x02, 0xAA, 0xBB]);
        assert!(bytes[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_control_packet_param_limit() {
        assert!(DfuControlPacket::new(DfuCommand::StartDfu, &[0; 19]).is_ok());
        assert_eq!(
            DfuControlPacket::new(DfuCommand::StartDfu, &[0; 20]),
            Err(EncodingError::PayloadTooLarge { len: 20, max: 19 })
        );
    }

    #[test]
    fn test_response_decode() {
        let response = DfuResponse::from_bytes(&[0x60, 0x02, 0x02]).unwrap();
        assert_eq!(response.request, DfuCommand::Initialize as u8);
        assert_eq!(response.code, DfuResponseCode::InvalidState);
        assert!(!response.is_success());

        assert!(DfuResponse::from_bytes(&[0x61, 0x01, 0x01]).is_err());
        assert!(DfuResponse::from_bytes(&[0x60, 0x01]).is_err());
    }

    #[test]
    fn test_image_chunks() {
        let image = vec![0u8; 45];
        let sizes: Vec<usize> = image_chunks(&image).map(|c| c.len()).collect();
        assert_eq!(sizes, vec![20, 20, 5]);
    }
}
