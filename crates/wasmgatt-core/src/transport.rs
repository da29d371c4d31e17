//! GATT transport seam
//!
//! Service clients see the device only through [`GattTransport`]: write bytes
//! to a characteristic, read bytes from one, and report the negotiated ATT
//! MTU. Connection lifecycle belongs to the implementation.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::TransportError;

// ----------------------------------------------------------------------------
// Transport Trait
// ----------------------------------------------------------------------------

/// GATT write type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Acknowledged write request
    #[default]
    WithResponse,
    /// Write command, no acknowledgement
    WithoutResponse,
}

/// Characteristic-level access to a connected device
#[async_trait]
pub trait GattTransport: Send + Sync {
    /// Write `data` to a characteristic
    async fn write(
        &self,
        characteristic: Uuid,
        data: &[u8],
        mode: WriteMode,
    ) -> Result<(), TransportError>;

    /// Read the current value of a characteristic
    async fn read(&self, characteristic: Uuid) -> Result<Vec<u8>, TransportError>;

    /// Negotiated ATT MTU
    fn mtu(&self) -> u16;

    /// Largest value a single write may carry
    fn max_write_len(&self) -> usize {
        (self.mtu() as usize).saturating_sub(crate::protocol::upload::ATT_OVERHEAD)
    }
}

#[async_trait]
impl<'a, T: GattTransport + ?Sized> GattTransport for &'a T {
    async fn write(
        &self,
        characteristic: Uuid,
        data: &[u8],
        mode: WriteMode,
    ) -> Result<(), TransportError> {
        (**self).write(characteristic, data, mode).await
    }

    async fn read(&self, characteristic: Uuid) -> Result<Vec<u8>, TransportError> {
        (**self).read(characteristic).await
    }

    fn mtu(&self) -> u16 {
        (**self).mtu()
    }
}

#[async_trait]
impl<T: GattTransport + ?Sized> GattTransport for std::sync::Arc<T> {
    async fn write(
        &self,
        characteristic: Uuid,
        data: &[u8],
        mode: WriteMode,
    ) -> Result<(), TransportError> {
        (**self).write(characteristic, data, mode).await
    }

    async fn read(&self, characteristic: Uuid) -> Result<Vec<u8>, TransportError> {
        (**self).read(characteristic).await
    }

    fn mtu(&self) -> u16 {
        (**self).mtu()
    }
}

// ----------------------------------------------------------------------------
// Mock Transport
// ----------------------------------------------------------------------------

#[cfg(any(test, feature = "testing"))]
pub use mock::{MockTransport, RecordedWrite};

#[cfg(any(test, feature = "testing"))]
mod mock {
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use uuid::Uuid;

    use super::{GattTransport, WriteMode};
    use crate::errors::TransportError;

    /// A write captured by [`MockTransport`]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedWrite {
        pub characteristic: Uuid,
        pub data: Vec<u8>,
        pub mode: WriteMode,
    }

    #[derive(Debug, Default)]
    struct MockState {
        writes: Vec<RecordedWrite>,
        reads: HashMap<Uuid, VecDeque<Vec<u8>>>,
        sticky: HashMap<Uuid, Vec<u8>>,
        fail_write_at: Option<usize>,
        echo: Option<(Uuid, Uuid)>,
    }

    /// In-memory transport that records writes and serves scripted reads
    ///
    /// Queued reads are consumed in order; once a characteristic's queue is
    /// empty its sticky value (if any) is returned on every read.
    #[derive(Debug)]
    pub struct MockTransport {
        mtu: u16,
        state: Mutex<MockState>,
    }

    impl Default for MockTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockTransport {
        /// Mock with a 517-byte MTU, the BLE maximum
        pub fn new() -> Self {
            Self::with_mtu(517)
        }

        pub fn with_mtu(mtu: u16) -> Self {
            Self {
                mtu,
                state: Mutex::new(MockState::default()),
            }
        }

        fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
            match self.state.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            }
        }

        /// Queue one read response for a characteristic
        pub fn push_read(&self, characteristic: Uuid, data: impl Into<Vec<u8>>) {
            self.state()
                .reads
                .entry(characteristic)
                .or_default()
                .push_back(data.into());
        }

        /// Value returned whenever the read queue is empty
        pub fn set_value(&self, characteristic: Uuid, data: impl Into<Vec<u8>>) {
            self.state().sticky.insert(characteristic, data.into());
        }

        /// Fail the write with this zero-based index
        pub fn fail_write_at(&self, index: usize) {
            self.state().fail_write_at = Some(index);
        }

        /// Make writes to `from` readable back from `to`
        pub fn echo(&self, from: Uuid, to: Uuid) {
            self.state().echo = Some((from, to));
        }

        pub fn writes(&self) -> Vec<RecordedWrite> {
            self.state().writes.clone()
        }

        /// Payloads written to one characteristic, in order
        pub fn writes_to(&self, characteristic: Uuid) -> Vec<Vec<u8>> {
            self.state()
                .writes
                .iter()
                .filter(|w| w.characteristic == characteristic)
                .map(|w| w.data.clone())
                .collect()
        }

        pub fn clear_writes(&self) {
            self.state().writes.clear();
        }
    }

    #[async_trait]
    impl GattTransport for MockTransport {
        async fn write(
            &self,
            characteristic: Uuid,
            data: &[u8],
            mode: WriteMode,
        ) -> Result<(), TransportError> {
            let mut state = self.state();
            let limit = (self.mtu as usize).saturating_sub(3);
            if data.len() > limit {
                return Err(TransportError::WriteFailed {
                    characteristic,
                    reason: format!("{} bytes exceeds MTU payload of {}", data.len(), limit),
                });
            }
            if state.fail_write_at == Some(state.writes.len()) {
                state.fail_write_at = None;
                return Err(TransportError::WriteFailed {
                    characteristic,
                    reason: "injected failure".to_string(),
                });
            }
            state.writes.push(RecordedWrite {
                characteristic,
                data: data.to_vec(),
                mode,
            });
            if let Some((from, to)) = state.echo {
                if from == characteristic {
                    state.sticky.insert(to, data.to_vec());
                }
            }
            Ok(())
        }

        async fn read(&self, characteristic: Uuid) -> Result<Vec<u8>, TransportError> {
            let mut state = self.state();
            if let Some(data) = state
                .reads
                .get_mut(&characteristic)
                .and_then(|queue| queue.pop_front())
            {
                return Ok(data);
            }
            state
                .sticky
                .get(&characteristic)
                .cloned()
                .ok_or(TransportError::ReadFailed {
                    characteristic,
                    reason: "no scripted value".to_string(),
                })
        }

        fn mtu(&self) -> u16 {
            self.mtu
        }
    }
}
