//! Error types for the BLE transport

use thiserror::Error;
use uuid::Uuid;
use wasmgatt_core::TransportError;

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Errors specific to the btleplug transport
#[derive(Error, Debug)]
pub enum BleTransportError {
    #[error("BLE adapter not available")]
    AdapterNotAvailable,

    #[error("Device not found: {name}")]
    DeviceNotFound { name: String },

    #[error("Failed to connect to device: {0}")]
    ConnectionFailed(String),

    #[error("{operation} timed out after {duration_ms}ms")]
    Timeout { operation: String, duration_ms: u64 },

    #[error("Failed to discover services: {0}")]
    ServiceDiscoveryFailed(String),

    #[error("Characteristic not found: {characteristic}")]
    CharacteristicNotFound { characteristic: Uuid },

    #[error("Device not connected")]
    NotConnected,

    #[error("Failed to write to characteristic {characteristic}: {reason}")]
    WriteFailed { characteristic: Uuid, reason: String },

    #[error("Failed to read from characteristic {characteristic}: {reason}")]
    ReadFailed { characteristic: Uuid, reason: String },

    #[error("Failed to get BLE events: {0}")]
    EventStreamFailed(String),

    #[error("BLE error: {0}")]
    Btleplug(#[from] btleplug::Error),
}

impl From<BleTransportError> for TransportError {
    fn from(err: BleTransportError) -> Self {
        match err {
            BleTransportError::AdapterNotAvailable => TransportError::AdapterUnavailable,
            BleTransportError::DeviceNotFound { name } => TransportError::DeviceNotFound { name },
            BleTransportError::Timeout {
                operation,
                duration_ms,
            } => TransportError::Timeout {
                operation,
                duration_ms,
            },
            BleTransportError::CharacteristicNotFound { characteristic } => {
                TransportError::CharacteristicNotFound { characteristic }
            }
            BleTransportError::NotConnected => TransportError::NotConnected,
            BleTransportError::WriteFailed {
                characteristic,
                reason,
            } => TransportError::WriteFailed {
                characteristic,
                reason,
            },
            BleTransportError::ReadFailed {
                characteristic,
                reason,
            } => TransportError::ReadFailed {
                characteristic,
                reason,
            },
            other => TransportError::Other(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_keeps_detail() {
        let err: TransportError = BleTransportError::DeviceNotFound {
            name: "Dan5340BLE".to_string(),
        }
        .into();
        assert_eq!(
            err,
            TransportError::DeviceNotFound {
                name: "Dan5340BLE".to_string()
            }
        );

        let err: TransportError = BleTransportError::Timeout {
            operation: "connect".to_string(),
            duration_ms: 10_000,
        }
        .into();
        assert_eq!(err.to_string(), "connect timed out after 10000ms");
    }

    #[test]
    fn test_conversion_fallback() {
        let err: TransportError =
            BleTransportError::ServiceDiscoveryFailed("gatt busy".to_string()).into();
        assert_eq!(
            err,
            TransportError::Other("Failed to discover services: gatt busy".to_string())
        );
    }
}
