//! Service clients
//!
//! Each client wraps a [`GattTransport`](crate::transport::GattTransport) and
//! speaks one firmware service. Every operation awaits its writes in order;
//! nothing is retried.

use std::time::Duration;

pub mod control;
pub mod data;
pub mod device_info;
pub mod dfu;
pub mod sprite;
pub mod wasm;

pub use control::ControlClient;
pub use data::{DataClient, ProbeResult};
pub use device_info::{DeviceInfo, DeviceInfoClient};
pub use dfu::DfuClient;
pub use sprite::SpriteClient;
pub use wasm::{ChunkedUploader, UploadReport, WasmClient};

/// Sleep for pacing, skipping zero-length pauses
pub(crate) async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
