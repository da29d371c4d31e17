//! WASM upload framing
//!
//! A module is uploaded as a series of writes to the upload characteristic.
//! Each write carries an 8-byte little-endian header followed by the chunk:
//!
//! - Command: 1 byte ([`UploadCommand`])
//! - Sequence: 1 byte (0-based, wraps at 256)
//! - ChunkLength: 2 bytes (u16)
//! - TotalLength: 4 bytes (u32)
//! - Data: `ChunkLength` bytes

use serde::{Deserialize, Serialize};

use crate::errors::{ensure_len, DecodingError, EncodingError};

// ----------------------------------------------------------------------------
// Constants
// ----------------------------------------------------------------------------

/// Size of the upload header
pub const UPLOAD_HEADER_SIZE: usize = 8;

/// ATT protocol overhead per write (opcode + handle)
pub const ATT_OVERHEAD: usize = 3;

/// Largest chunk the firmware's receive struct holds
pub const MAX_UPLOAD_CHUNK_SIZE: usize = 244;

/// Firmware code buffer size
pub const WASM_CODE_BUFFER_SIZE: usize = 32 * 1024;

/// WASM binary magic (`\0asm`)
pub const WASM_MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6D];

/// Check for the `\0asm` module prefix
pub fn validate_wasm_magic(data: &[u8]) -> bool {
    data.starts_with(&WASM_MAGIC)
}

/// Largest chunk that fits a write on a link with the given ATT MTU
pub fn max_chunk_for_mtu(mtu: u16) -> usize {
    (mtu as usize)
        .saturating_sub(ATT_OVERHEAD + UPLOAD_HEADER_SIZE)
        .min(MAX_UPLOAD_CHUNK_SIZE)
}

// ----------------------------------------------------------------------------
// Upload Command
// ----------------------------------------------------------------------------

/// Command byte at the start of every upload packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum UploadCommand {
    /// First chunk; resets the receive buffer
    Start = 0x01,
    /// Any later chunk
    Continue = 0x02,
    /// Load whatever has been received
    Finish = 0x03,
    /// Discard the buffer and return to IDLE
    Reset = 0x04,
}

impl TryFrom<u8> for UploadCommand {
    type Error = DecodingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(UploadCommand::Start),
            0x02 => Ok(UploadCommand::Continue),
            0x03 => Ok(UploadCommand::Finish),
            0x04 => Ok(UploadCommand::Reset),
            _ => Err(DecodingError::UnknownValue {
                packet: "UploadCommand",
                value,
            }),
        }
    }
}

/// What CONTINUE packets carry in the `total_length` field
///
/// The firmware reads the total only from the START packet. Existing clients
/// disagree on what follows, so the choice is explicit configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContinuationTotal {
    /// Repeat the full payload length on every packet
    #[default]
    Repeat,
    /// Send zero after the START packet
    Zero,
}

// ----------------------------------------------------------------------------
// Upload Header
// ----------------------------------------------------------------------------

/// Header prepended to every upload chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadHeader {
    pub command: UploadCommand,
    pub sequence: u8,
    pub chunk_length: u16,
    pub total_length: u32,
}

impl UploadHeader {
    /// Header with no payload, used for RESET and FINISH
    pub fn control(command: UploadCommand, sequence: u8, total_length: u32) -> Self {
        Self {
            command,
            sequence,
            chunk_length: 0,
            total_length,
        }
    }

    /// Serialize to the 8-byte wire form
    pub fn to_bytes(&self) -> [u8; UPLOAD_HEADER_SIZE] {
        let mut bytes = [0u8; UPLOAD_HEADER_SIZE];
        bytes[0] = self.command as u8;
        bytes[1] = self.sequence;
        bytes[2..4].copy_from_slice(&self.chunk_length.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.total_length.to_le_bytes());
        bytes
    }

    /// Parse the first 8 bytes of `bytes`
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodingError> {
        ensure_len("UploadHeader", bytes, UPLOAD_HEADER_SIZE)?;

        Ok(Self {
            command: UploadCommand::try_from(bytes[0])?,
            sequence: bytes[1],
            chunk_length: u16::from_le_bytes([bytes[2], bytes[3]]),
            total_length: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        })
    }
}

// ----------------------------------------------------------------------------
// Upload Packet
// ----------------------------------------------------------------------------

/// A header plus the chunk it describes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPacket {
    pub header: UploadHeader,
    pub payload: Vec<u8>,
}

impl UploadPacket {
    /// Serialize to wire format
    pub fn to_wire_format(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(UPLOAD_HEADER_SIZE + self.payload.len());
        bytes.extend_from_slice(&self.header.to_bytes());
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    /// Parse a packet, taking `chunk_length` bytes after the header
    pub fn from_wire_format(bytes: &[u8]) -> Result<Self, DecodingError> {
        let header = UploadHeader::from_bytes(bytes)?;
        let end = UPLOAD_HEADER_SIZE + header.chunk_length as usize;
        ensure_len("UploadPacket", bytes, end)?;

        Ok(Self {
            header,
            payload: bytes[UPLOAD_HEADER_SIZE..end].to_vec(),
        })
    }

    /// Size on the wire
    pub fn wire_len(&self) -> usize {
        UPLOAD_HEADER_SIZE + self.payload.len()
    }
}

// ----------------------------------------------------------------------------
// Chunking
// ----------------------------------------------------------------------------

/// Split `data` into the packet sequence an upload sends
///
/// The first packet is START with sequence 0 and the full length; the rest are
/// CONTINUE with the sequence incremented per packet. An empty payload yields a
/// single empty START packet. The firmware treats that as a complete 0-byte
/// module and refuses to load it with an InvalidParams error code.
pub fn plan_upload(
    data: &[u8],
    chunk_size: usize,
    continuation: ContinuationTotal,
) -> Result<Vec<UploadPacket>, EncodingError> {
    if chunk_size == 0 {
        return Err(EncodingError::ChunkSizeZero);
    }
    if chunk_size > u16::MAX as usize {
        return Err(EncodingError::ChunkTooLarge {
            packet: UPLOAD_HEADER_SIZE + chunk_size,
            max: UPLOAD_HEADER_SIZE + u16::MAX as usize,
        });
    }
    let total_length = u32::try_from(data.len()).map_err(|_| EncodingError::PayloadTooLarge {
        len: data.len(),
        max: u32::MAX as usize,
    })?;

    if data.is_empty() {
        return Ok(vec![UploadPacket {
            header: UploadHeader::control(UploadCommand::Start, 0, 0),
            payload: Vec::new(),
        }]);
    }

    let packets = data
        .chunks(chunk_size)
        .enumerate()
        .map(|(index, chunk)| {
            let (command, total) = if index == 0 {
                (UploadCommand::Start, total_length)
            } else {
                let total = match continuation {
                    ContinuationTotal::Repeat => total_length,
                    ContinuationTotal::Zero => 0,
                };
                (UploadCommand::Continue, total)
            };

            UploadPacket {
                header: UploadHeader {
                    command,
                    sequence: index as u8,
                    chunk_length: chunk.len() as u16,
                    total_length: total,
                },
                payload: chunk.to_vec(),
            }
        })
        .collect();

    Ok(packets)
}

/// Concatenate packet payloads in sequence order
pub fn reassemble(packets: &[UploadPacket]) -> Vec<u8> {
    packets
        .iter()
        .filter(|p| matches!(p.header.command, UploadCommand::Start | UploadCommand::Continue))
        .flat_map(|p| p.payload.iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let header = UploadHeader {
            command: UploadCommand::Start,
            sequence: 3,
            chunk_length: 0x0102,
            total_length: 0x0A0B0C0D,
        };
        assert_eq!(
            header.to_bytes(),
            [0x01, 0x03, 0x02, 0x01, 0x0D, 0x0C, 0x0B, 0x0A]
        );
        assert_eq!(UploadHeader::from_bytes(&header.to_bytes()).unwrap(), header);
    }

    #[test]
    fn test_header_rejects_unknown_command() {
        let err = UploadHeader::from_bytes(&[0x09, 0, 0, 0, 0, 0, 0, 0]).unwrap_err();
        assert_eq!(
            err,
            DecodingError::UnknownValue {
                packet: "UploadCommand",
                value: 0x09
            }
        );
        assert!(UploadHeader::from_bytes(&[0x01; 7]).is_err());
    }

    #[test]
    fn test_reset_packet() {
        let packet = UploadPacket {
            header: UploadHeader::control(UploadCommand::Reset, 0, 0),
            payload: Vec::new(),
        };
        assert_eq!(packet.to_wire_format(), vec![0x04, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_plan_three_chunks() {
        let data: Vec<u8> = (0..=255u8).chain(0..=255u8).collect();
        let packets = plan_upload(&data, 244, ContinuationTotal::Repeat).unwrap();

        let lengths: Vec<usize> = packets.iter().map(|p| p.payload.len()).collect();
        assert_eq!(lengths, vec![244, 244, 24]);

        let commands: Vec<UploadCommand> = packets.iter().map(|p| p.header.command).collect();
        assert_eq!(
            commands,
            vec![
                UploadCommand::Start,
                UploadCommand::Continue,
                UploadCommand::Continue
            ]
        );

        let sequences: Vec<u8> = packets.iter().map(|p| p.header.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
        assert!(packets.iter().all(|p| p.header.total_length == 512));
        assert_eq!(reassemble(&packets), data);
    }

    #[test]
    fn test_plan_zero_continuation_total() {
        let data = vec![7u8; 30];
        let packets = plan_upload(&data, 10, ContinuationTotal::Zero).unwrap();
        assert_eq!(packets[0].header.total_length, 30);
        assert_eq!(packets[1].header.total_length, 0);
        assert_eq!(packets[2].header.total_length, 0);
    }

    #[test]
    fn test_plan_empty_payload() {
        let packets = plan_upload(&[], 100, ContinuationTotal::Repeat).unwrap();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].header.command, UploadCommand::Start);
        assert_eq!(packets[0].header.chunk_length, 0);
        assert_eq!(packets[0].header.total_length, 0);
    }

    #[test]
    fn test_plan_rejects_zero_chunk() {
        assert_eq!(
            plan_upload(&[1, 2, 3], 0, ContinuationTotal::Repeat),
            Err(EncodingError::ChunkSizeZero)
        );
    }

    #[test]
    fn test_sequence_wraps() {
        let data = vec![0u8; 300];
        let packets = plan_upload(&data, 1, ContinuationTotal::Repeat).unwrap();
        assert_eq!(packets[255].header.sequence, 255);
        assert_eq!(packets[256].header.sequence, 0);
    }

    #[test]
    fn test_packet_wire_roundtrip_ignores_trailing_bytes() {
        let packet = UploadPacket {
            header: UploadHeader {
                command: UploadCommand::Continue,
                sequence: 1,
                chunk_length: 3,
                total_length: 10,
            },
            payload: vec![1, 2, 3],
        };
        let mut wire = packet.to_wire_format();
        assert_eq!(wire.len(), packet.wire_len());
        wire.extend_from_slice(&[0xEE; 4]);
        assert_eq!(UploadPacket::from_wire_format(&wire).unwrap(), packet);
    }

    #[test]
    fn test_mtu_budget() {
        assert_eq!(max_chunk_for_mtu(247), 236);
        assert_eq!(max_chunk_for_mtu(23), 12);
        assert_eq!(max_chunk_for_mtu(512), MAX_UPLOAD_CHUNK_SIZE);
        assert_eq!(max_chunk_for_mtu(5), 0);
    }

    #[test]
    fn test_wasm_magic() {
        assert!(validate_wasm_magic(&[0x00, 0x61, 0x73, 0x6D, 0x01, 0, 0, 0]));
        assert!(!validate_wasm_magic(&[0x00, 0x61, 0x73]));
        assert!(!validate_wasm_magic(b"not wasm"));
    }
}
