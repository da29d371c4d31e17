//! Data service framing
//!
//! Uploads are raw variable-length writes that the firmware accumulates and
//! echoes back on the download characteristic.

use serde::{Deserialize, Serialize};

use crate::errors::{ensure_len, DecodingError};

/// Firmware accumulation buffer
pub const DATA_BUFFER_SIZE: usize = 1024;

pub const TRANSFER_STATUS_MIN_SIZE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TransferState {
    Idle = 0x00,
    Receiving = 0x01,
    Complete = 0x02,
    Error = 0x03,
}

impl TryFrom<u8> for TransferState {
    type Error = DecodingError;

    fn try_from(value: u8) -> Result<Self, DecodingError> {
        match value {
            0x00 => Ok(TransferState::Idle),
            0x01 => Ok(TransferState::Receiving),
            0x02 => Ok(TransferState::Complete),
            0x03 => Ok(TransferState::Error),
            _ => Err(DecodingError::UnknownValue {
                packet: "TransferState",
                value,
            }),
        }
    }
}

/// Transfer status read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferStatus {
    pub state: TransferState,
    /// Bytes currently held in the firmware buffer
    pub buffer_size: u16,
}

impl TransferStatus {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodingError> {
        ensure_len("TransferStatus", bytes, TRANSFER_STATUS_MIN_SIZE)?;
        Ok(Self {
            state: TransferState::try_from(bytes[0])?,
            buffer_size: u16::from_le_bytes([bytes[1], bytes[2]]),
        })
    }

    pub fn to_bytes(&self) -> [u8; TRANSFER_STATUS_MIN_SIZE] {
        let size = self.buffer_size.to_le_bytes();
        [self.state as u8, size[0], size[1]]
    }
}

/// Deterministic `i % 256` payload for echo and MTU probes
pub fn test_pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 256) as u8).collect()
}
