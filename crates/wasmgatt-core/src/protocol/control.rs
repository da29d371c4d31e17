//! Control service packets
//!
//! A 20-byte command is written, then an 8-byte response is read back. The
//! status characteristic carries the device state and uptime.

use serde::{Deserialize, Serialize};

use crate::errors::{ensure_len, DecodingError};

pub const CONTROL_COMMAND_SIZE: usize = 20;
pub const CONTROL_RESPONSE_SIZE: usize = 8;
pub const CONTROL_STATUS_SIZE: usize = 8;

/// Bytes of the status packet the client relies on
pub const CONTROL_STATUS_MIN_SIZE: usize = 5;

/// Control command opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ControlOpcode {
    GetStatus = 0x01,
    ResetDevice = 0x02,
    SetConfig = 0x03,
    GetVersion = 0x04,
}

/// Command packet: opcode, two parameters, 17 reserved bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlCommand {
    pub cmd_id: u8,
    pub param1: u8,
    pub param2: u8,
}

impl ControlCommand {
    pub fn new(opcode: ControlOpcode, param1: u8, param2: u8) -> Self {
        Self {
            cmd_id: opcode as u8,
            param1,
            param2,
        }
    }

    pub fn get_status() -> Self {
        Self::new(ControlOpcode::GetStatus, 0, 0)
    }

    pub fn reset_device() -> Self {
        Self::new(ControlOpcode::ResetDevice, 0, 0)
    }

    pub fn set_config(param1: u8, param2: u8) -> Self {
        Self::new(ControlOpcode::SetConfig, param1, param2)
    }

    pub fn get_version() -> Self {
        Self::new(ControlOpcode::GetVersion, 0, 0)
    }

    pub fn to_bytes(&self) -> [u8; CONTROL_COMMAND_SIZE] {
        let mut bytes = [0u8; CONTROL_COMMAND_SIZE];
        bytes[0] = self.cmd_id;
        bytes[1] = self.param1;
        bytes[2] = self.param2;
        bytes
    }
}

/// Response status byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlResponseStatus {
    Success,
    InvalidData,
    UnknownCommand,
    Other(u8),
}

impl From<u8> for ControlResponseStatus {
    fn from(value: u8) -> Self {
        match value {
            0x00 => ControlResponseStatus::Success,
            0x01 => ControlResponseStatus::InvalidData,
            0xFF => ControlResponseStatus::UnknownCommand,
            other => ControlResponseStatus::Other(other),
        }
    }
}

impl From<ControlResponseStatus> for u8 {
    fn from(status: ControlResponseStatus) -> Self {
        match status {
            ControlResponseStatus::Success => 0x00,
            ControlResponseStatus::InvalidData => 0x01,
            ControlResponseStatus::UnknownCommand => 0xFF,
            ControlResponseStatus::Other(other) => other,
        }
    }
}

/// Response packet: echoed opcode, status, 6 result bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlResponse {
    pub cmd_id: u8,
    pub status: ControlResponseStatus,
    pub result: [u8; 6],
}

impl ControlResponse {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodingError> {
        ensure_len("ControlResponse", bytes, CONTROL_RESPONSE_SIZE)?;
        let mut result = [0u8; 6];
        result.copy_from_slice(&bytes[2..8]);
        Ok(Self {
            cmd_id: bytes[0],
            status: ControlResponseStatus::from(bytes[1]),
            result,
        })
    }

    pub fn to_bytes(&self) -> [u8; CONTROL_RESPONSE_SIZE] {
        let mut bytes = [0u8; CONTROL_RESPONSE_SIZE];
        bytes[0] = self.cmd_id;
        bytes[1] = self.status.into();
        bytes[2..8].copy_from_slice(&self.result);
        bytes
    }

    pub fn is_success(&self) -> bool {
        self.status == ControlResponseStatus::Success
    }

    /// Firmware version triple carried by a GET_VERSION response
    pub fn version(&self) -> (u8, u8, u8) {
        (self.result[0], self.result[1], self.result[2])
    }
}

/// Device state reported by the control service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DeviceStatus {
    Idle = 0x00,
    Busy = 0x01,
    Error = 0x02,
}

impl TryFrom<u8> for DeviceStatus {
    type Error = DecodingError;

    fn try_from(value: u8) -> Result<Self, DecodingError> {
        match value {
            0x00 => Ok(DeviceStatus::Idle),
            0x01 => Ok(DeviceStatus::Busy),
            0x02 => Ok(DeviceStatus::Error),
            _ => Err(DecodingError::UnknownValue {
                packet: "DeviceStatus",
                value,
            }),
        }
    }
}

/// Status packet: device state and uptime in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlStatus {
    pub device_status: DeviceStatus,
    pub uptime_secs: u32,
}

impl ControlStatus {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodingError> {
        ensure_len("ControlStatus", bytes, CONTROL_STATUS_MIN_SIZE)?;
        Ok(Self {
            device_status: DeviceStatus::try_from(bytes[0])?,
            uptime_secs: u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]),
        })
    }

    pub fn to_bytes(&self) -> [u8; CONTROL_STATUS_SIZE] {
        let mut bytes = [0u8; CONTROL_STATUS_SIZE];
        bytes[0] = self.device_status as u8;
        bytes[1..5].copy_from_slice(&self.uptime_secs.to_le_bytes());
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_layout() {
        let bytes = ControlCommand::set_config(0x10, 0x20).to_bytes();
        assert_eq!(bytes.len(), 20);
        assert_eq!(&bytes[..3], &[0x03, 0x10, 0x20]);
        assert!(bytes[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_version_response() {
        let response = ControlResponse::from_bytes(&[0x04, 0x00, 1, 0, 0, 0, 0, 0]).unwrap();
        assert!(response.is_success());
        assert_eq!(response.cmd_id, ControlOpcode::GetVersion as u8);
        assert_eq!(response.version(), (1, 0, 0));
    }

    #[test]
    fn test_unknown_command_response() {
        let response = ControlResponse::from_bytes(&[0x09, 0xFF, 0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(response.status, ControlResponseStatus::UnknownCommand);
        assert!(!response.is_success());
        assert_eq!(response.to_bytes()[1], 0xFF);
    }

    #[test]
    fn test_status_packet() {
        let status = ControlStatus {
            device_status: DeviceStatus::Busy,
            uptime_secs: 3600,
        };
        let bytes = status.to_bytes();
        assert_eq!(&bytes[..5], &[0x01, 0x10, 0x0E, 0x00, 0x00]);
        assert_eq!(ControlStatus::from_bytes(&bytes).unwrap(), status);
        assert!(ControlStatus::from_bytes(&bytes[..4]).is_err());
    }
}
