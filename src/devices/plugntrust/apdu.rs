//! SE05x APDU constants and command framing
//!
//! Commands are ISO7816-4 APDUs: `CLA INS P1 P2 [Lc data] [Le]`. Payloads up
//! to 255 bytes use short Lc/Le; longer payloads switch to the extended
//! three-byte Lc and two-byte Le.

use crate::platform::{Error, Result};

// =============================================================================
// Class / Instruction
// =============================================================================

/// ISO7816 interindustry class (SELECT)
pub const CLA_ISO7816: u8 = 0x00;

/// SE05x proprietary class
pub const CLA_SE05X: u8 = 0x80;

/// SELECT by name
pub const INS_SELECT: u8 = 0xA4;

/// Write / create an object
pub const INS_WRITE: u8 = 0x01;

/// Read an object or its attributes
pub const INS_READ: u8 = 0x02;

/// Management operations
pub const INS_MGMT: u8 = 0x04;

// =============================================================================
// P1 / P2
// =============================================================================

pub const P1_DEFAULT: u8 = 0x00;
pub const P1_BINARY: u8 = 0x06;
pub const P1_SELECT_BY_NAME: u8 = 0x04;

pub const P2_DEFAULT: u8 = 0x00;
pub const P2_SIZE: u8 = 0x07;
pub const P2_MEMORY: u8 = 0x22;
pub const P2_VERSION: u8 = 0x20;
pub const P2_LIST: u8 = 0x25;
pub const P2_EXIST: u8 = 0x27;
pub const P2_DELETE_OBJECT: u8 = 0x28;
pub const P2_RANDOM: u8 = 0x49;

// =============================================================================
// TLV Tags
// =============================================================================

pub const TAG_POLICY: u8 = 0x11;
pub const TAG_1: u8 = 0x41;
pub const TAG_2: u8 = 0x42;
pub const TAG_3: u8 = 0x43;
pub const TAG_4: u8 = 0x44;

// =============================================================================
// Values
// =============================================================================

/// SE05x IoT applet AID
pub const APPLET_AID: [u8; 16] = [
    0xA0, 0x00, 0x00, 0x03, 0x96, 0x54, 0x53, 0x00, 0x00, 0x00, 0x01, 0x03, 0x00, 0x00, 0x00,
    0x00,
];

/// Status word of a successful command
pub const SW_NO_ERROR: u16 = 0x9000;

/// `SE05x_Result` success
pub const RESULT_SUCCESS: u8 = 0x01;

/// Object list filter matching every type
pub const OBJECT_TYPE_ALL: u8 = 0xFF;

/// Largest APDU the applet accepts
pub const MAX_APDU_LEN: usize = 900;

/// Command header length
pub const HEADER_LEN: usize = 4;

/// Where command data is staged before the Lc field is known
pub const DATA_OFFSET: usize = HEADER_LEN + 3;

/// Finish an APDU whose `data_len` data bytes were staged at `DATA_OFFSET`
///
/// Writes the header and Lc, moves the data into place and appends Le.
/// Returns the APDU length.
pub fn frame_apdu(buf: &mut [u8], header: [u8; 4], data_len: usize) -> Result<usize> {
    let extended = data_len > 0xFF;
    let data_start = match (data_len, extended) {
        (0, _) => HEADER_LEN,
        (_, false) => HEADER_LEN + 1,
        (_, true) => HEADER_LEN + 3,
    };
    let le_len = if extended { 2 } else { 1 };
    let total = data_start + data_len + le_len;
    if data_len > 0xFFFF || buf.len() < total.max(DATA_OFFSET + data_len) {
        return Err(Error::BufferTooSmall);
    }

    buf[..HEADER_LEN].copy_from_slice(&header);
    if data_len > 0 {
        buf.copy_within(DATA_OFFSET..DATA_OFFSET + data_len, data_start);
        if extended {
            buf[HEADER_LEN] = 0x00;
            buf[HEADER_LEN + 1..HEADER_LEN + 3].copy_from_slice(&(data_len as u16).to_be_bytes());
        } else {
            buf[HEADER_LEN] = data_len as u8;
        }
    }
    buf[data_start + data_len..total].fill(0x00);

    Ok(total)
}

/// Split the status word off a response, returning the data length
pub fn check_status(response: &[u8]) -> Result<usize> {
    let data_len = response
        .len()
        .checked_sub(2)
        .ok_or(Error::InvalidResponse)?;
    let sw = u16::from_be_bytes([response[data_len], response[data_len + 1]]);
    if sw != SW_NO_ERROR {
        crate::log_warn!("SE05x status {:#06x}", sw);
        return Err(Error::Status(sw));
    }
    Ok(data_len)
}
