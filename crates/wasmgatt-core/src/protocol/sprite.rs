//! Sprite registry packets
//!
//! Sprites are 16x16 monochrome bitmaps packed into 32 bytes. Pixel `(x, y)`
//! is bit `n = y * 16 + x`, stored in byte `n / 8` at bit `n % 8` (LSB first).
//! Every bitmap travels with the CRC16-CCITT of its 32 bytes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::crc::crc16;
use crate::errors::{ensure_len, DecodingError, EncodingError};

// ----------------------------------------------------------------------------
// Constants
// ----------------------------------------------------------------------------

pub const SPRITE_WIDTH: usize = 16;
pub const SPRITE_HEIGHT: usize = 16;
pub const SPRITE_DATA_SIZE: usize = SPRITE_WIDTH * SPRITE_HEIGHT / 8;

/// Reserved ID the registry never stores
pub const SPRITE_ID_INVALID: u16 = 0xFFFF;

pub const SPRITE_UPLOAD_SIZE: usize = 36;
pub const SPRITE_REQUEST_SIZE: usize = 2;
pub const SPRITE_DOWNLOAD_SIZE: usize = 37;
pub const REGISTRY_STATUS_SIZE: usize = 12;
pub const REGISTRY_STATUS_MIN_SIZE: usize = 10;
pub const VERIFY_RESPONSE_SIZE: usize = 8;
pub const VERIFY_RESPONSE_MIN_SIZE: usize = 7;

/// Reject the reserved sprite ID before anything is written
pub fn validate_sprite_id(sprite_id: u16) -> Result<(), EncodingError> {
    if sprite_id == SPRITE_ID_INVALID {
        return Err(EncodingError::InvalidSpriteId(sprite_id));
    }
    Ok(())
}

// ----------------------------------------------------------------------------
// Status Codes
// ----------------------------------------------------------------------------

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $value:expr),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[repr(u8)]
        pub enum $name {
            $($variant = $value),+
        }

        impl TryFrom<u8> for $name {
            type Error = DecodingError;

            fn try_from(value: u8) -> Result<Self, DecodingError> {
                match value {
                    $(v if v == $value => Ok($name::$variant),)+
                    _ => Err(DecodingError::UnknownValue {
                        packet: stringify!($name),
                        value,
                    }),
                }
            }
        }
    };
}

wire_enum! {
    /// Outcome of a sprite upload or download
    SpriteStatus {
        Success = 0x00,
        NotFound = 0x01,
        CrcError = 0x02,
        RegistryFull = 0x03,
        InvalidId = 0x04,
        InvalidData = 0x05,
    }
}

wire_enum! {
    /// Overall registry state
    RegistryState {
        Ready = 0x00,
        Busy = 0x01,
        Error = 0x02,
        Full = 0x03,
    }
}

wire_enum! {
    /// Last operation the registry performed
    SpriteOperation {
        None = 0x00,
        Upload = 0x01,
        Download = 0x02,
        Verify = 0x03,
        Status = 0x04,
    }
}

wire_enum! {
    /// Result of an on-device CRC check
    VerifyStatus {
        Valid = 0x00,
        Invalid = 0x01,
        NotFound = 0x02,
        Error = 0x03,
    }
}

// ----------------------------------------------------------------------------
// Bitmap
// ----------------------------------------------------------------------------

/// 16x16 monochrome sprite bitmap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bitmap(pub [u8; SPRITE_DATA_SIZE]);

/// 3x5 digit glyphs, one row per entry, MSB of the 3-bit row is the left column
const DIGIT_GLYPHS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b001, 0b001, 0b001],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

const DIGIT_ORIGIN: (usize, usize) = (6, 5);

impl Bitmap {
    pub fn from_bytes(bytes: [u8; SPRITE_DATA_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SPRITE_DATA_SIZE] {
        &self.0
    }

    fn bit_index(x: usize, y: usize) -> Result<usize, EncodingError> {
        if x >= SPRITE_WIDTH || y >= SPRITE_HEIGHT {
            return Err(EncodingError::InvalidPixel { x, y });
        }
        Ok(y * SPRITE_WIDTH + x)
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> Result<bool, EncodingError> {
        let n = Self::bit_index(x, y)?;
        Ok(self.0[n / 8] & (1 << (n % 8)) != 0)
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, on: bool) -> Result<(), EncodingError> {
        let n = Self::bit_index(x, y)?;
        if on {
            self.0[n / 8] |= 1 << (n % 8);
        } else {
            self.0[n / 8] &= !(1 << (n % 8));
        }
        Ok(())
    }

    /// Build a bitmap by evaluating `f` for every pixel
    fn from_fn(f: impl Fn(usize, usize) -> bool) -> Self {
        let mut bytes = [0u8; SPRITE_DATA_SIZE];
        for y in 0..SPRITE_HEIGHT {
            for x in 0..SPRITE_WIDTH {
                if f(x, y) {
                    let n = y * SPRITE_WIDTH + x;
                    bytes[n / 8] |= 1 << (n % 8);
                }
            }
        }
        Self(bytes)
    }

    pub fn checkerboard() -> Self {
        Self::from_fn(|x, y| (x + y) % 2 == 0)
    }

    pub fn border() -> Self {
        Self::from_fn(|x, y| x == 0 || y == 0 || x == SPRITE_WIDTH - 1 || y == SPRITE_HEIGHT - 1)
    }

    pub fn diagonal() -> Self {
        Self::from_fn(|x, y| x == y || x == SPRITE_WIDTH - 1 - y)
    }

    /// Digit glyph centred on the bitmap; `digit` is taken modulo 10
    pub fn digit(digit: u8) -> Self {
        let glyph = &DIGIT_GLYPHS[(digit % 10) as usize];
        let (ox, oy) = DIGIT_ORIGIN;
        Self::from_fn(|x, y| {
            if x < ox || x >= ox + 3 || y < oy || y >= oy + 5 {
                return false;
            }
            let row = glyph[y - oy];
            row & (1 << (2 - (x - ox))) != 0
        })
    }

    /// Pattern by name, as accepted on the command line
    pub fn pattern(name: &str) -> Option<Self> {
        match name {
            "checkerboard" => Some(Self::checkerboard()),
            "border" => Some(Self::border()),
            "diagonal" => Some(Self::diagonal()),
            "empty" => Some(Self::default()),
            "full" => Some(Self([0xFF; SPRITE_DATA_SIZE])),
            _ => {
                let digit: u8 = name.strip_prefix("digit-")?.parse().ok()?;
                (digit < 10).then(|| Self::digit(digit))
            }
        }
    }

    pub fn crc(&self) -> u16 {
        crc16(&self.0)
    }

    pub fn count_set(&self) -> u32 {
        self.0.iter().map(|b| b.count_ones()).sum()
    }
}

impl fmt::Display for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..SPRITE_HEIGHT {
            for x in 0..SPRITE_WIDTH {
                let n = y * SPRITE_WIDTH + x;
                let on = self.0[n / 8] & (1 << (n % 8)) != 0;
                f.write_str(if on { "#" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_bitmap(bytes: &[u8], offset: usize) -> Bitmap {
    let mut data = [0u8; SPRITE_DATA_SIZE];
    data.copy_from_slice(&bytes[offset..offset + SPRITE_DATA_SIZE]);
    Bitmap(data)
}

// ----------------------------------------------------------------------------
// Upload
// ----------------------------------------------------------------------------

/// Sprite upload: id, bitmap and CRC of the bitmap (36 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteUploadPacket {
    pub sprite_id: u16,
    pub bitmap: Bitmap,
    pub crc16: u16,
}

impl SpriteUploadPacket {
    /// Build an upload, computing the CRC from the bitmap
    pub fn new(sprite_id: u16, bitmap: Bitmap) -> Result<Self, EncodingError> {
        validate_sprite_id(sprite_id)?;
        Ok(Self {
            sprite_id,
            bitmap,
            crc16: bitmap.crc(),
        })
    }

    pub fn to_bytes(&self) -> [u8; SPRITE_UPLOAD_SIZE] {
        let mut bytes = [0u8; SPRITE_UPLOAD_SIZE];
        bytes[0..2].copy_from_slice(&self.sprite_id.to_le_bytes());
        bytes[2..34].copy_from_slice(&self.bitmap.0);
        bytes[34..36].copy_from_slice(&self.crc16.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodingError> {
        ensure_len("SpriteUploadPacket", bytes, SPRITE_UPLOAD_SIZE)?;
        Ok(Self {
            sprite_id: read_u16(bytes, 0),
            bitmap: read_bitmap(bytes, 2),
            crc16: read_u16(bytes, 34),
        })
    }
}

// ----------------------------------------------------------------------------
// Download / Verify Request
// ----------------------------------------------------------------------------

/// Download or verify request: just the sprite id (2 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteRequest {
    pub sprite_id: u16,
}

impl SpriteRequest {
    pub fn new(sprite_id: u16) -> Result<Self, EncodingError> {
        validate_sprite_id(sprite_id)?;
        Ok(Self { sprite_id })
    }

    pub fn to_bytes(&self) -> [u8; SPRITE_REQUEST_SIZE] {
        self.sprite_id.to_le_bytes()
    }
}

// ----------------------------------------------------------------------------
// Download Response
// ----------------------------------------------------------------------------

/// Stored sprite returned by the registry (37 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteDownloadResponse {
    pub sprite_id: u16,
    pub bitmap: Bitmap,
    pub crc16: u16,
    pub status: SpriteStatus,
}

impl SpriteDownloadResponse {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodingError> {
        ensure_len("SpriteDownloadResponse", bytes, SPRITE_DOWNLOAD_SIZE)?;
        Ok(Self {
            sprite_id: read_u16(bytes, 0),
            bitmap: read_bitmap(bytes, 2),
            crc16: read_u16(bytes, 34),
            status: SpriteStatus::try_from(bytes[36])?,
        })
    }

    pub fn to_bytes(&self) -> [u8; SPRITE_DOWNLOAD_SIZE] {
        let mut bytes = [0u8; SPRITE_DOWNLOAD_SIZE];
        bytes[0..2].copy_from_slice(&self.sprite_id.to_le_bytes());
        bytes[2..34].copy_from_slice(&self.bitmap.0);
        bytes[34..36].copy_from_slice(&self.crc16.to_le_bytes());
        bytes[36] = self.status as u8;
        bytes
    }

    /// Whether the carried CRC matches the carried bitmap
    pub fn crc_valid(&self) -> bool {
        self.bitmap.crc() == self.crc16
    }
}

// ----------------------------------------------------------------------------
// Registry Status
// ----------------------------------------------------------------------------

/// Registry statistics (12 bytes, trailing 2 reserved)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStatus {
    pub total_sprites: u16,
    pub free_slots: u16,
    pub last_sprite_id: u16,
    pub registry_state: RegistryState,
    pub last_operation: SpriteOperation,
    pub crc_errors: u16,
}

impl RegistryStatus {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodingError> {
        ensure_len("RegistryStatus", bytes, REGISTRY_STATUS_MIN_SIZE)?;
        Ok(Self {
            total_sprites: read_u16(bytes, 0),
            free_slots: read_u16(bytes, 2),
            last_sprite_id: read_u16(bytes, 4),
            registry_state: RegistryState::try_from(bytes[6])?,
            last_operation: SpriteOperation::try_from(bytes[7])?,
            crc_errors: read_u16(bytes, 8),
        })
    }

    pub fn to_bytes(&self) -> [u8; REGISTRY_STATUS_SIZE] {
        let mut bytes = [0u8; REGISTRY_STATUS_SIZE];
        bytes[0..2].copy_from_slice(&self.total_sprites.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.free_slots.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.last_sprite_id.to_le_bytes());
        bytes[6] = self.registry_state as u8;
        bytes[7] = self.last_operation as u8;
        bytes[8..10].copy_from_slice(&self.crc_errors.to_le_bytes());
        bytes
    }
}

// ----------------------------------------------------------------------------
// Verify Response
// ----------------------------------------------------------------------------

/// On-device CRC check result (8 bytes, trailing 1 reserved)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub sprite_id: u16,
    pub stored_crc16: u16,
    pub calculated_crc16: u16,
    pub status: VerifyStatus,
}

impl VerifyResponse {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodingError> {
        ensure_len("VerifyResponse", bytes, VERIFY_RESPONSE_MIN_SIZE)?;
        Ok(Self {
            sprite_id: read_u16(bytes, 0),
            stored_crc16: read_u16(bytes, 2),
            calculated_crc16: read_u16(bytes, 4),
            status: VerifyStatus::try_from(bytes[6])?,
        })
    }

    pub fn to_bytes(&self) -> [u8; VERIFY_RESPONSE_SIZE] {
        let mut bytes = [0u8; VERIFY_RESPONSE_SIZE];
        bytes[0..2].copy_from_slice(&self.sprite_id.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.stored_crc16.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.calculated_crc16.to_le_bytes());
        bytes[6] = self.status as u8;
        bytes
    }

    pub fn is_valid(&self) -> bool {
        self.status == VerifyStatus::Valid && self.stored_crc16 == self.calculated_crc16
    }
}
