//! Frame checksums
//!
//! Each wire protocol in this crate carries its own checksum:
//!
//! | Protocol              | Algorithm            | Width |
//! |-----------------------|----------------------|-------|
//! | SE05x T=1 over I2C    | CRC-16/X-25          | 16    |
//! | MM5D91 radar UART     | CRC-16/CCITT-FALSE   | 16    |
//! | EnOcean ESP3          | CRC-8 (poly 0x07)    | 8     |
//! | MAX22190 SPI          | Maxim CRC5 (0x35)    | 5     |
//!
//! The table-driven ones come from the `crc` crate.

use crc::{Crc, CRC_16_IBM_3740, CRC_16_IBM_SDLC, CRC_8_SMBUS};

/// CRC-16/X-25: reflected 0x1021, init 0xFFFF, final complement
const CRC16_X25: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_SDLC);

/// CRC-16/CCITT-FALSE: 0x1021, init 0xFFFF, no reflection
const CRC16_CCITT_FALSE: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// CRC-8: 0x07, init 0x00
const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);

/// CRC5 polynomial x^5 + x^4 + x^2 + 1
const CRC5_POLY: u8 = 0x35;

/// CRC5 seed, placed in the five bits the checksum will occupy
const CRC5_INIT: u32 = 0x07;

/// Number of frame bits covered by CRC5
const CRC5_COVERED_BITS: u32 = 19;

/// Checksum of a T=1 block (NAD through last information byte)
pub fn crc16_x25(data: &[u8]) -> u16 {
    CRC16_X25.checksum(data)
}

/// Checksum of a radar frame (header through last payload byte)
pub fn crc16_ccitt_false(data: &[u8]) -> u16 {
    CRC16_CCITT_FALSE.checksum(data)
}

/// Checksum of an ESP3 header or data section
pub fn crc8(data: &[u8]) -> u8 {
    CRC8.checksum(data)
}

/// MAX22190 frame checksum
///
/// Covers the first 19 bits of the 3-byte frame; the low five bits of
/// `frame[2]` are the checksum slot and are ignored on input.
pub fn crc5(frame: [u8; 3]) -> u8 {
    let input = ((u32::from(frame[0]) << 16) | (u32::from(frame[1]) << 8) | u32::from(frame[2]))
        & 0x00FF_FFE0
        | CRC5_INIT;

    let reduce = |value: u8| {
        if value & 0x20 != 0 {
            value ^ CRC5_POLY
        } else {
            value
        }
    };

    // First six bits at once, then one bit per step
    let mut step = reduce(((input >> 18) & 0x3F) as u8);
    for i in 0..CRC5_COVERED_BITS - 1 {
        let bit = ((input >> (CRC5_COVERED_BITS - 2 - i)) & 0x01) as u8;
        step = reduce(((step & 0x1F) << 1) | bit);
    }

    step & 0x1F
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECK_INPUT: &[u8] = b"123456789";

    #[test]
    fn test_catalogue_check_values() {
        assert_eq!(crc16_x25(CHECK_INPUT), 0x906E);
        assert_eq!(crc16_ccitt_false(CHECK_INPUT), 0x29B1);
        assert_eq!(crc8(CHECK_INPUT), 0xF4);
    }

    #[test]
    fn test_radar_command_frame() {
        // Detection status request: header, code, zero length
        assert_eq!(crc16_ccitt_false(&[0xD9, 0x0D, 0x00, 0x00]), 0x9DE5);
    }

    #[test]
    fn test_crc5_known_frames() {
        assert_eq!(crc5([0x00, 0x00, 0x00]), 0x07);
        assert_eq!(crc5([0x80, 0x00, 0x00]), 0x11);
        assert_eq!(crc5([0x87, 0xFF, 0x00]), 0x13);
    }

    #[test]
    fn test_crc5_ignores_checksum_slot() {
        let frame = [0x87, 0x5A, 0x00];
        let crc = crc5(frame);
        assert_eq!(crc5([0x87, 0x5A, crc]), crc);
        assert_eq!(crc5([0x87, 0x5A, 0x1F]), crc);
    }

    #[test]
    fn test_crc5_detects_single_bit_errors() {
        let frame = [0x04, 0xC3, 0x80];
        let crc = crc5(frame);

        let word = (u32::from(frame[0]) << 16) | (u32::from(frame[1]) << 8) | u32::from(frame[2]);
        for bit in 5..24 {
            let corrupted = word ^ (1 << bit);
            let bytes = [(corrupted >> 16) as u8, (corrupted >> 8) as u8, corrupted as u8];
            assert_ne!(crc5(bytes), crc, "bit {} flip not detected", bit);
        }
    }
}
