//! Error types for the wasmgatt client
//!
//! Failures fall into four families: the BLE link failed ([`TransportError`]),
//! a request could not be encoded ([`EncodingError`]), a response could not be
//! decoded ([`DecodingError`]), or the firmware reported a failure
//! ([`RemoteError`]). [`WasmGattError`] unifies them.
//!
//! None of these are retried locally. The only recovery primitive the firmware
//! offers is the explicit upload RESET command.

use thiserror::Error;
use uuid::Uuid;

use crate::protocol::control::ControlResponseStatus;
use crate::protocol::dfu::DfuResponse;
use crate::protocol::execute::WasmErrorCode;
use crate::protocol::sprite::SpriteStatus;

// ----------------------------------------------------------------------------
// Specific Error Types
// ----------------------------------------------------------------------------

/// Failures reported by the GATT transport collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Write to characteristic {characteristic} failed: {reason}")]
    WriteFailed { characteristic: Uuid, reason: String },

    #[error("Read from characteristic {characteristic} failed: {reason}")]
    ReadFailed { characteristic: Uuid, reason: String },

    #[error("Characteristic not found: {characteristic}")]
    CharacteristicNotFound { characteristic: Uuid },

    #[error("Device not connected")]
    NotConnected,

    #[error("Device not found: {name}")]
    DeviceNotFound { name: String },

    #[error("BLE adapter not available")]
    AdapterUnavailable,

    #[error("{operation} timed out after {duration_ms}ms")]
    Timeout { operation: String, duration_ms: u64 },

    #[error("Transport error: {0}")]
    Other(String),
}

/// Requests rejected before anything is written to the device
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("Function name too long: {len} bytes (max: {max})")]
    NameTooLong { len: usize, max: usize },

    #[error("Too many arguments: {count} (max: {max})")]
    TooManyArguments { count: usize, max: usize },

    #[error("Chunk size must be greater than zero")]
    ChunkSizeZero,

    #[error("Packet too large: {packet} bytes (max: {max})")]
    ChunkTooLarge { packet: usize, max: usize },

    #[error("Payload too large: {len} bytes (max: {max})")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("Payload is not a WASM module (missing \\0asm magic)")]
    InvalidWasmMagic,

    #[error("Pixel out of bounds: ({x}, {y})")]
    InvalidPixel { x: usize, y: usize },

    #[error("Invalid sprite ID: {0:#06x}")]
    InvalidSpriteId(u16),

    #[error("Payload must not be empty")]
    EmptyPayload,
}

/// Responses that could not be interpreted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodingError {
    #[error("{packet} too short: {actual} bytes (expected at least {expected})")]
    TooShort {
        packet: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Unknown {packet} value: {value:#04x}")]
    UnknownValue { packet: &'static str, value: u8 },

    #[error("Characteristic {characteristic} is not valid UTF-8")]
    InvalidUtf8 { characteristic: Uuid },

    #[error("CRC mismatch for sprite {sprite_id}: received {received:#06x}, computed {computed:#06x}")]
    CrcMismatch {
        sprite_id: u16,
        received: u16,
        computed: u16,
    },

    #[error("Response for sprite {actual} while {expected} was requested")]
    SpriteIdMismatch { expected: u16, actual: u16 },
}

/// Failures reported by the firmware itself
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("WASM execution failed: {error_code:?}")]
    ExecutionFailed { error_code: WasmErrorCode },

    #[error("Sprite {sprite_id} rejected: {status:?}")]
    SpriteRejected { sprite_id: u16, status: SpriteStatus },

    #[error("Control command {command:#04x} rejected: {status:?}")]
    ControlRejected {
        command: u8,
        status: ControlResponseStatus,
    },

    #[error("DFU command rejected: {response:?}")]
    DfuRejected { response: DfuResponse },
}

// ----------------------------------------------------------------------------
// Main Error Type
// ----------------------------------------------------------------------------

/// Umbrella error for every wasmgatt operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WasmGattError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Decoding error: {0}")]
    Decoding(#[from] DecodingError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),
}

impl WasmGattError {
    /// True when the failure happened before anything reached the device
    pub fn is_local(&self) -> bool {
        matches!(self, WasmGattError::Encoding(_))
    }
}

/// Result alias used throughout the crate
pub type Result<T> = core::result::Result<T, WasmGattError>;

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

/// Fail with [`DecodingError::TooShort`] unless `bytes` holds at least `expected` bytes
pub(crate) fn ensure_len(
    packet: &'static str,
    bytes: &[u8],
    expected: usize,
) -> core::result::Result<(), DecodingError> {
    if bytes.len() < expected {
        return Err(DecodingError::TooShort {
            packet,
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}
