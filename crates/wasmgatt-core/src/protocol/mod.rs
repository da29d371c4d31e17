//! Wire formats for every firmware service
//!
//! All multi-byte fields are little-endian. Decoders accept trailing bytes
//! past the fields they know about and reject anything shorter than the
//! fields they need.

pub mod control;
pub mod data;
pub mod dfu;
pub mod execute;
pub mod sprite;
pub mod status;
pub mod upload;

pub use execute::{ExecuteRequest, ExecuteResult, WasmErrorCode};
pub use status::{WasmStatus, WasmStatusReport};
pub use upload::{ContinuationTotal, UploadCommand, UploadHeader, UploadPacket};
