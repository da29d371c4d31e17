//! CRC16-CCITT used for sprite bitmap integrity
//!
//! Polynomial 0x1021, initial value 0xFFFF, processed MSB first with no input
//! or output reflection and no final XOR (the "CCITT-FALSE" variant). This is
//! the checksum the sprite registry stores and recomputes.

/// CCITT generator polynomial
pub const CRC16_POLYNOMIAL: u16 = 0x1021;

/// Register value before any byte is processed
pub const CRC16_INITIAL: u16 = 0xFFFF;

/// Compute the CRC16-CCITT of `data`
pub fn crc16(data: &[u8]) -> u16 {
    data.iter().fold(CRC16_INITIAL, |crc, &byte| {
        let mut crc = crc ^ (u16::from(byte) << 8);
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ CRC16_POLYNOMIAL
            } else {
                crc << 1
            };
        }
        crc
    })
}

/// Check `data` against an expected checksum
pub fn verify(data: &[u8], expected_crc: u16) -> bool {
    crc16(data) == expected_crc
}
