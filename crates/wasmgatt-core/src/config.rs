//! Protocol pacing and encoding configuration

use std::time::Duration;

use crate::protocol::upload::{max_chunk_for_mtu, ContinuationTotal, WASM_CODE_BUFFER_SIZE};
use crate::transport::WriteMode;

/// ATT MTU the defaults are sized for
pub const DEFAULT_ATT_MTU: u16 = 247;

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Settings shared by every service client
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Payload bytes per upload packet
    pub chunk_size: usize,
    /// Pause between consecutive upload packets
    pub inter_packet_delay: Duration,
    /// `total_length` carried by CONTINUE packets
    pub continuation_total: ContinuationTotal,
    /// Write type used for upload packets
    pub upload_write_mode: WriteMode,
    /// Pause between writing an execute request and reading the result
    pub execute_settle: Duration,
    /// Pause between the last upload packet and an execute request
    pub post_upload_settle: Duration,
    /// Status reads while waiting for EXECUTING to clear; 0 disables polling
    pub status_poll_attempts: u32,
    /// Interval between status polls
    pub status_poll_interval: Duration,
    /// Largest payload accepted for upload
    pub max_upload_size: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            chunk_size: max_chunk_for_mtu(DEFAULT_ATT_MTU),
            inter_packet_delay: Duration::from_millis(100),
            continuation_total: ContinuationTotal::Repeat,
            upload_write_mode: WriteMode::WithResponse,
            execute_settle: Duration::from_millis(500),
            post_upload_settle: Duration::from_secs(1),
            status_poll_attempts: 0,
            status_poll_interval: Duration::from_millis(100),
            max_upload_size: WASM_CODE_BUFFER_SIZE,
        }
    }
}

impl ProtocolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration with every delay zeroed, for in-memory transports
    pub fn immediate() -> Self {
        Self::default()
            .with_inter_packet_delay(Duration::ZERO)
            .with_execute_settle(Duration::ZERO)
            .with_post_upload_settle(Duration::ZERO)
            .with_status_poll_interval(Duration::ZERO)
    }

    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    pub fn with_inter_packet_delay(mut self, delay: Duration) -> Self {
        self.inter_packet_delay = delay;
        self
    }

    pub fn with_continuation_total(mut self, policy: ContinuationTotal) -> Self {
        self.continuation_total = policy;
        self
    }

    pub fn with_upload_write_mode(mut self, mode: WriteMode) -> Self {
        self.upload_write_mode = mode;
        self
    }

    pub fn with_execute_settle(mut self, delay: Duration) -> Self {
        self.execute_settle = delay;
        self
    }

    pub fn with_post_upload_settle(mut self, delay: Duration) -> Self {
        self.post_upload_settle = delay;
        self
    }

    pub fn with_status_polling(mut self, attempts: u32) -> Self {
        self.status_poll_attempts = attempts;
        self
    }

    pub fn with_status_poll_interval(mut self, interval: Duration) -> Self {
        self.status_poll_interval = interval;
        self
    }

    pub fn with_max_upload_size(mut self, size: usize) -> Self {
        self.max_upload_size = size;
        self
    }
}
