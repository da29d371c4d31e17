//! WASM upload and execution client

use tracing::{debug, info, warn};

use crate::config::ProtocolConfig;
use crate::errors::{EncodingError, Result};
use crate::protocol::execute::{ExecuteRequest, ExecuteResult};
use crate::protocol::status::{WasmStatus, WasmStatusReport};
use crate::protocol::upload::{
    plan_upload, validate_wasm_magic, UploadCommand, UploadHeader, UploadPacket,
    UPLOAD_HEADER_SIZE,
};
use crate::transport::{GattTransport, WriteMode};
use crate::uuids::wasm;

use super::pause;

// ----------------------------------------------------------------------------
// Chunked Uploader
// ----------------------------------------------------------------------------

/// What a completed upload sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct UploadReport {
    pub packets: usize,
    pub bytes: usize,
    /// Sequence number the next packet of this upload would carry
    pub next_sequence: u8,
}

/// Streams a binary to the upload characteristic as START/CONTINUE packets
///
/// Writes are strictly sequential. A failed write aborts the upload and leaves
/// the device with a partial buffer; [`ChunkedUploader::reset`] is the only
/// recovery and is never issued implicitly.
pub struct ChunkedUploader<T> {
    transport: T,
    config: ProtocolConfig,
}

impl<T: GattTransport> ChunkedUploader<T> {
    pub fn new(transport: T, config: ProtocolConfig) -> Self {
        Self { transport, config }
    }

    /// Packets `upload` would send, after every local check
    pub fn plan(&self, data: &[u8], chunk_size: usize) -> Result<Vec<UploadPacket>> {
        if chunk_size == 0 {
            return Err(EncodingError::ChunkSizeZero.into());
        }
        let max_write = self.transport.max_write_len();
        let packet = UPLOAD_HEADER_SIZE.saturating_add(chunk_size);
        if packet > max_write {
            return Err(EncodingError::ChunkTooLarge {
                packet,
                max: max_write,
            }
            .into());
        }
        if data.len() > self.config.max_upload_size {
            return Err(EncodingError::PayloadTooLarge {
                len: data.len(),
                max: self.config.max_upload_size,
            }
            .into());
        }

        Ok(plan_upload(data, chunk_size, self.config.continuation_total)?)
    }

    /// Send `data` in chunks of at most `chunk_size` bytes
    pub async fn upload(&self, data: &[u8], chunk_size: usize) -> Result<UploadReport> {
        let packets = self.plan(data, chunk_size)?;

        if !data.is_empty() && !validate_wasm_magic(data) {
            warn!("Uploading {} bytes without WASM magic header", data.len());
        }
        info!(
            "Uploading {} bytes in {} packets (chunk size {})",
            data.len(),
            packets.len(),
            chunk_size
        );

        let count = packets.len();
        for (index, packet) in packets.iter().enumerate() {
            let wire = packet.to_wire_format();
            debug!(
                "Upload packet {}/{}: {:?} seq={} len={} [{}]",
                index + 1,
                count,
                packet.header.command,
                packet.header.sequence,
                packet.header.chunk_length,
                hex::encode(&wire[..UPLOAD_HEADER_SIZE])
            );

            if let Err(e) = self
                .transport
                .write(wasm::UPLOAD, &wire, self.config.upload_write_mode)
                .await
            {
                warn!("Upload aborted at packet {}/{}: {}", index + 1, count, e);
                return Err(e.into());
            }

            if index + 1 < count {
                pause(self.config.inter_packet_delay).await;
            }
        }

        info!("Upload complete: {} packets", count);
        Ok(UploadReport {
            packets: count,
            bytes: data.len(),
            next_sequence: count as u8,
        })
    }

    /// Discard the device's receive buffer
    pub async fn reset(&self) -> Result<()> {
        let header = UploadHeader::control(UploadCommand::Reset, 0, 0);
        debug!("Sending upload RESET");
        self.transport
            .write(wasm::UPLOAD, &header.to_bytes(), WriteMode::WithResponse)
            .await?;
        Ok(())
    }

    /// Ask the device to load whatever it has received
    pub async fn finish(&self, report: &UploadReport) -> Result<()> {
        let header = UploadHeader::control(
            UploadCommand::Finish,
            report.next_sequence,
            report.bytes as u32,
        );
        debug!("Sending upload FINISH seq={}", report.next_sequence);
        self.transport
            .write(wasm::UPLOAD, &header.to_bytes(), WriteMode::WithResponse)
            .await?;
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// WASM Client
// ----------------------------------------------------------------------------

/// Upload, inspect and execute WASM modules on the device
pub struct WasmClient<T> {
    transport: T,
    config: ProtocolConfig,
}

impl<T: GattTransport> WasmClient<T> {
    pub fn new(transport: T, config: ProtocolConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Uploader borrowing this client's transport
    pub fn uploader(&self) -> ChunkedUploader<&T> {
        ChunkedUploader::new(&self.transport, self.config.clone())
    }

    /// Upload with the configured chunk size
    pub async fn upload(&self, data: &[u8]) -> Result<UploadReport> {
        self.uploader().upload(data, self.config.chunk_size).await
    }

    pub async fn reset(&self) -> Result<()> {
        self.uploader().reset().await
    }

    /// Read the current status snapshot
    pub async fn status(&self) -> Result<WasmStatusReport> {
        let bytes = self.transport.read(wasm::STATUS).await?;
        let report = WasmStatusReport::from_bytes(&bytes)?;
        debug!("WASM status: {:?}", report);
        Ok(report)
    }

    /// Execute a function and return the raw result packet
    pub async fn execute_raw(&self, function_name: &str, args: &[i32]) -> Result<ExecuteResult> {
        let request = ExecuteRequest::new(function_name, args)?;

        info!("Executing {}({:?})", function_name, args);
        self.transport
            .write(wasm::EXECUTE, &request.encode(), WriteMode::WithResponse)
            .await?;

        pause(self.config.execute_settle).await;
        self.wait_while_executing().await?;

        let bytes = self.transport.read(wasm::RESULT).await?;
        debug!("Execute result [{}]", hex::encode(&bytes));
        Ok(ExecuteResult::decode(&bytes)?)
    }

    /// Execute a function and return its `i32` result
    pub async fn execute(&self, function_name: &str, args: &[i32]) -> Result<i32> {
        let result = self.execute_raw(function_name, args).await?;
        let value = result.into_return_value()?;
        info!("{} returned {}", function_name, value);
        Ok(value)
    }

    /// Upload a module, let it load, then call one function
    ///
    /// The request is validated before the upload starts.
    pub async fn upload_and_execute(
        &self,
        data: &[u8],
        function_name: &str,
        args: &[i32],
    ) -> Result<i32> {
        ExecuteRequest::new(function_name, args)?;

        self.upload(data).await?;
        pause(self.config.post_upload_settle).await;
        self.execute(function_name, args).await
    }

    async fn wait_while_executing(&self) -> Result<()> {
        for attempt in 0..self.config.status_poll_attempts {
            let report = self.status().await?;
            if report.status != WasmStatus::Executing {
                return Ok(());
            }
            debug!("Still executing (poll {})", attempt + 1);
            pause(self.config.status_poll_interval).await;
        }
        Ok(())
    }
}
