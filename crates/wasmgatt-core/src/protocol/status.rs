//! WASM service status snapshot
//!
//! The firmware owns the upload/execute state machine. The client only reads
//! snapshots of it and never predicts transitions:
//!
//! ```text
//! IDLE -> RECEIVING -> RECEIVED -> LOADED -> EXECUTING -> COMPLETE | ERROR
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{ensure_len, DecodingError};
use crate::protocol::execute::WasmErrorCode;

/// Bytes of the status packet the client relies on
pub const STATUS_MIN_SIZE: usize = 12;

/// Full status packet size including reserved bytes
pub const STATUS_PACKET_SIZE: usize = 18;

/// Firmware WASM state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WasmStatus {
    Idle,
    Receiving,
    Received,
    Loaded,
    Executing,
    Complete,
    Error,
    /// A state byte this client does not know
    Unknown(u8),
}

impl WasmStatus {
    /// Whether a module is loaded and can be executed
    pub fn is_ready(&self) -> bool {
        *self == WasmStatus::Loaded
    }
}

impl From<u8> for WasmStatus {
    fn from(value: u8) -> Self {
        match value {
            0x00 => WasmStatus::Idle,
            0x01 => WasmStatus::Receiving,
            0x02 => WasmStatus::Received,
            0x03 => WasmStatus::Loaded,
            0x04 => WasmStatus::Executing,
            0x05 => WasmStatus::Complete,
            0x06 => WasmStatus::Error,
            other => WasmStatus::Unknown(other),
        }
    }
}

impl From<WasmStatus> for u8 {
    fn from(status: WasmStatus) -> Self {
        match status {
            WasmStatus::Idle => 0x00,
            WasmStatus::Receiving => 0x01,
            WasmStatus::Received => 0x02,
            WasmStatus::Loaded => 0x03,
            WasmStatus::Executing => 0x04,
            WasmStatus::Complete => 0x05,
            WasmStatus::Error => 0x06,
            WasmStatus::Unknown(other) => other,
        }
    }
}

/// Decoded read of the WASM status characteristic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WasmStatusReport {
    pub status: WasmStatus,
    pub error_code: WasmErrorCode,
    pub bytes_received: u16,
    pub total_size: u32,
    pub uptime_secs: u32,
}

impl WasmStatusReport {
    /// Parse a status read; reserved trailing bytes are ignored
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodingError> {
        ensure_len("WasmStatusReport", bytes, STATUS_MIN_SIZE)?;

        Ok(Self {
            status: WasmStatus::from(bytes[0]),
            error_code: WasmErrorCode::from(bytes[1]),
            bytes_received: u16::from_le_bytes([bytes[2], bytes[3]]),
            total_size: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            uptime_secs: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        })
    }

    /// Serialize in the firmware layout, reserved bytes zeroed
    pub fn to_bytes(&self) -> [u8; STATUS_PACKET_SIZE] {
        let mut bytes = [0u8; STATUS_PACKET_SIZE];
        bytes[0] = self.status.into();
        bytes[1] = self.error_code.into();
        bytes[2..4].copy_from_slice(&self.bytes_received.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.total_size.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.uptime_secs.to_le_bytes());
        bytes
    }

    /// Upload progress in percent, when a total is known
    pub fn progress(&self) -> Option<f32> {
        if self.total_size == 0 {
            return None;
        }
        Some(self.bytes_received as f32 * 100.0 / self.total_size as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_report_decode() {
        let bytes = [
            0x01, 0x00, // receiving, no error
            0x2C, 0x01, // 300 bytes received
            0x58, 0x02, 0x00, 0x00, // 600 total
            0x0A, 0x00, 0x00, 0x00, // 10 s uptime
            0, 0, 0, 0, 0, 0,
        ];
        let report = WasmStatusReport::from_bytes(&bytes).unwrap();
        assert_eq!(report.status, WasmStatus::Receiving);
        assert_eq!(report.error_code, WasmErrorCode::None);
        assert_eq!(report.bytes_received, 300);
        assert_eq!(report.total_size, 600);
        assert_eq!(report.uptime_secs, 10);
        assert_eq!(report.progress(), Some(50.0));
        assert_eq!(report.to_bytes(), bytes);
    }

    #[test]
    fn test_status_report_minimum_length() {
        assert!(WasmStatusReport::from_bytes(&[0u8; 12]).is_ok());
        assert!(matches!(
            WasmStatusReport::from_bytes(&[0u8; 11]),
            Err(DecodingError::TooShort { expected: 12, actual: 11, .. })
        ));
    }

    #[test]
    fn test_unknown_status_byte() {
        let mut bytes = [0u8; 12];
        bytes[0] = 0x07;
        let report = WasmStatusReport::from_bytes(&bytes).unwrap();
        assert_eq!(report.status, WasmStatus::Unknown(0x07));
        assert_eq!(u8::from(report.status), 0x07);

        for raw in 0u8..=6 {
            assert_eq!(u8::from(WasmStatus::from(raw)), raw);
        }
    }

    #[test]
    fn test_ready_states() {
        assert!(WasmStatus::Loaded.is_ready());
        assert!(!WasmStatus::Receiving.is_ready());
        assert!(!WasmStatus::Error.is_ready());
    }
}
