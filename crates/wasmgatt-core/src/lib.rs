//! wasmgatt core
//!
//! Wire codecs and service clients for a BLE firmware exposing Device
//! Information, Control, Data, DFU, Sprite Registry and WASM upload/execute
//! GATT services. The firmware owns every state machine; this crate only
//! encodes writes, decodes reads and sequences them over a [`GattTransport`].

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod client;
pub mod config;
pub mod crc;
pub mod errors;
pub mod protocol;
pub mod transport;
pub mod uuids;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use client::{
    ChunkedUploader, ControlClient, DataClient, DeviceInfo, DeviceInfoClient, DfuClient,
    ProbeResult, SpriteClient, UploadReport, WasmClient,
};
pub use config::ProtocolConfig;
pub use errors::{
    DecodingError, EncodingError, RemoteError, Result, TransportError, WasmGattError,
};
pub use protocol::sprite::Bitmap;
pub use protocol::{
    ContinuationTotal, ExecuteRequest, ExecuteResult, UploadCommand, UploadHeader, UploadPacket,
    WasmErrorCode, WasmStatus, WasmStatusReport,
};
pub use transport::{GattTransport, WriteMode};

#[cfg(any(test, feature = "testing"))]
pub use transport::{MockTransport, RecordedWrite};
