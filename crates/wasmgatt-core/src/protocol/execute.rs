//! Execute-function request and result packets
//!
//! ## Request (52 bytes, written to the execute characteristic)
//! - FunctionName: 32 bytes, zero padded
//! - ArgCount: 4 bytes (u32 LE)
//! - Args: 4 x 4 bytes (i32 LE), unused slots zero
//!
//! ## Result (read from the result characteristic)
//! - Status: 1 byte ([`WasmStatus`])
//! - ErrorCode: 1 byte ([`WasmErrorCode`])
//! - ReturnValue: 4 bytes (i32 LE)
//! - ExecutionTime: 4 bytes (u32 LE, microseconds), optional
//! - remaining bytes reserved

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{ensure_len, DecodingError, EncodingError, RemoteError, WasmGattError};
use crate::protocol::status::WasmStatus;

// ----------------------------------------------------------------------------
// Constants
// ----------------------------------------------------------------------------

/// Width of the function name field
pub const FUNCTION_NAME_SIZE: usize = 32;

/// Number of argument slots
pub const MAX_ARGS: usize = 4;

/// Size of an encoded request
pub const EXECUTE_REQUEST_SIZE: usize = FUNCTION_NAME_SIZE + 4 + MAX_ARGS * 4;

/// Bytes of a result the client requires
pub const EXECUTE_RESULT_MIN_SIZE: usize = 6;

/// Result length from which the execution time is present
const EXECUTE_RESULT_TIMED_SIZE: usize = 10;

// ----------------------------------------------------------------------------
// Error Codes
// ----------------------------------------------------------------------------

/// Error code reported alongside a WASM status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WasmErrorCode {
    None,
    BufferOverflow,
    InvalidMagic,
    LoadFailed,
    CompileFailed,
    FunctionNotFound,
    ExecutionFailed,
    InvalidParams,
    Unknown(u8),
}

impl From<u8> for WasmErrorCode {
    fn from(value: u8) -> Self {
        match value {
            0x00 => WasmErrorCode::None,
            0x01 => WasmErrorCode::BufferOverflow,
            0x02 => WasmErrorCode::InvalidMagic,
            0x03 => WasmErrorCode::LoadFailed,
            0x04 => WasmErrorCode::CompileFailed,
            0x05 => WasmErrorCode::FunctionNotFound,
            0x06 => WasmErrorCode::ExecutionFailed,
            0x07 => WasmErrorCode::InvalidParams,
            other => WasmErrorCode::Unknown(other),
        }
    }
}

impl From<WasmErrorCode> for u8 {
    fn from(code: WasmErrorCode) -> Self {
        match code {
            WasmErrorCode::None => 0x00,
            WasmErrorCode::BufferOverflow => 0x01,
            WasmErrorCode::InvalidMagic => 0x02,
            WasmErrorCode::LoadFailed => 0x03,
            WasmErrorCode::CompileFailed => 0x04,
            WasmErrorCode::FunctionNotFound => 0x05,
            WasmErrorCode::ExecutionFailed => 0x06,
            WasmErrorCode::InvalidParams => 0x07,
            WasmErrorCode::Unknown(other) => other,
        }
    }
}

// ----------------------------------------------------------------------------
// Execute Request
// ----------------------------------------------------------------------------

/// A call to an exported WASM function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    /// Name as written on the wire, zero padded
    pub function_name: [u8; FUNCTION_NAME_SIZE],
    pub arg_count: u32,
    pub args: [i32; MAX_ARGS],
}

impl ExecuteRequest {
    /// Build a request, rejecting names over 32 bytes and more than 4 args
    pub fn new(function_name: &str, args: &[i32]) -> Result<Self, EncodingError> {
        let name = function_name.as_bytes();
        if name.len() > FUNCTION_NAME_SIZE {
            return Err(EncodingError::NameTooLong {
                len: name.len(),
                max: FUNCTION_NAME_SIZE,
            });
        }
        if args.len() > MAX_ARGS {
            return Err(EncodingError::TooManyArguments {
                count: args.len(),
                max: MAX_ARGS,
            });
        }

        let mut padded = [0u8; FUNCTION_NAME_SIZE];
        padded[..name.len()].copy_from_slice(name);

        let mut slots = [0i32; MAX_ARGS];
        slots[..args.len()].copy_from_slice(args);

        Ok(Self {
            function_name: padded,
            arg_count: args.len() as u32,
            args: slots,
        })
    }

    /// Function name with the zero padding stripped
    pub fn name(&self) -> String {
        let end = self
            .function_name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(FUNCTION_NAME_SIZE);
        String::from_utf8_lossy(&self.function_name[..end]).into_owned()
    }

    /// Arguments actually in use
    pub fn active_args(&self) -> &[i32] {
        let count = (self.arg_count as usize).min(MAX_ARGS);
        &self.args[..count]
    }

    /// Serialize to the 52-byte wire form
    pub fn encode(&self) -> [u8; EXECUTE_REQUEST_SIZE] {
        let mut bytes = [0u8; EXECUTE_REQUEST_SIZE];
        bytes[..FUNCTION_NAME_SIZE].copy_from_slice(&self.function_name);
        bytes[32..36].copy_from_slice(&self.arg_count.to_le_bytes());
        for (i, arg) in self.args.iter().enumerate() {
            let offset = 36 + i * 4;
            bytes[offset..offset + 4].copy_from_slice(&arg.to_le_bytes());
        }
        bytes
    }

    /// Parse a 52-byte request
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodingError> {
        ensure_len("ExecuteRequest", bytes, EXECUTE_REQUEST_SIZE)?;

        let mut function_name = [0u8; FUNCTION_NAME_SIZE];
        function_name.copy_from_slice(&bytes[..FUNCTION_NAME_SIZE]);

        let arg_count = u32::from_le_bytes([bytes[32], bytes[33], bytes[34], bytes[35]]);
        let mut args = [0i32; MAX_ARGS];
        for (i, slot) in args.iter_mut().enumerate() {
            let offset = 36 + i * 4;
            *slot = i32::from_le_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ]);
        }

        Ok(Self {
            function_name,
            arg_count,
            args,
        })
    }
}

// ----------------------------------------------------------------------------
// Execute Result
// ----------------------------------------------------------------------------

/// Decoded read of the result characteristic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteResult {
    pub status: WasmStatus,
    pub error_code: WasmErrorCode,
    pub return_value: i32,
    /// Present when the firmware sends the full result struct
    pub execution_time_us: Option<u32>,
}

impl ExecuteResult {
    /// Parse a result read; bytes past the known fields are ignored
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodingError> {
        ensure_len("ExecuteResult", bytes, EXECUTE_RESULT_MIN_SIZE)?;

        let execution_time_us = if bytes.len() >= EXECUTE_RESULT_TIMED_SIZE {
            Some(u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]))
        } else {
            None
        };

        Ok(Self {
            status: WasmStatus::from(bytes[0]),
            error_code: WasmErrorCode::from(bytes[1]),
            return_value: i32::from_le_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]),
            execution_time_us,
        })
    }

    /// Serialize the known fields
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(EXECUTE_RESULT_TIMED_SIZE);
        bytes.push(self.status.into());
        bytes.push(self.error_code.into());
        bytes.extend_from_slice(&self.return_value.to_le_bytes());
        if let Some(time) = self.execution_time_us {
            bytes.extend_from_slice(&time.to_le_bytes());
        }
        bytes
    }

    /// The return value of the call
    ///
    /// ERROR maps to [`RemoteError::ExecutionFailed`]. Every other status,
    /// unknown bytes included, yields the return value as read.
    pub fn into_return_value(self) -> Result<i32, WasmGattError> {
        if self.status == WasmStatus::Error {
            return Err(RemoteError::ExecutionFailed {
                error_code: self.error_code,
            }
            .into());
        }
        if self.error_code != WasmErrorCode::None {
            warn!(
                "Result status {:?} carries error code {:?}",
                self.status, self.error_code
            );
        }
        Ok(self.return_value)
    }
}
