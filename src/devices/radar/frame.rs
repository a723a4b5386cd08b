//! MM5D91 UART framing
//!
//! ```text
//! header | code | len lo | len hi | payload[len] | crc lo | crc hi
//! ```
//!
//! CRC-16/CCITT-FALSE over header through the last payload byte.

use crate::communication::crc::crc16_ccitt_false;
use crate::platform::{Error, Result};

/// Header of commands and their responses
pub const HEADER_COMMAND: u8 = 0xD9;

/// Header of unsolicited event frames
pub const HEADER_EVENT: u8 = 0xDA;

/// Header, code, two length bytes
pub const PREFIX_LEN: usize = 4;

/// CRC trailer length
pub const CRC_LEN: usize = 2;

/// Largest payload accepted from the module
pub const MAX_PAYLOAD_LEN: usize = 64;

/// Largest frame on the wire
pub const MAX_FRAME_LEN: usize = PREFIX_LEN + MAX_PAYLOAD_LEN + CRC_LEN;

/// Serialize a frame into `out`, returning its length
pub fn encode_frame(header: u8, code: u8, payload: &[u8], out: &mut [u8]) -> Result<usize> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(Error::InvalidArgument);
    }
    let body_end = PREFIX_LEN + payload.len();
    let total = body_end + CRC_LEN;
    if out.len() < total {
        return Err(Error::BufferTooSmall);
    }

    out[0] = header;
    out[1] = code;
    out[2..4].copy_from_slice(&(payload.len() as u16).to_le_bytes());
    out[PREFIX_LEN..body_end].copy_from_slice(payload);
    let crc = crc16_ccitt_false(&out[..body_end]);
    out[body_end..total].copy_from_slice(&crc.to_le_bytes());

    Ok(total)
}

/// Verify the CRC of a complete frame
pub fn check_crc(frame: &[u8]) -> Result<()> {
    let body_end = frame
        .len()
        .checked_sub(CRC_LEN)
        .filter(|&end| end >= PREFIX_LEN)
        .ok_or(Error::InvalidResponse)?;
    let expected = crc16_ccitt_false(&frame[..body_end]);
    let received = u16::from_le_bytes([frame[body_end], frame[body_end + 1]]);
    if expected != received {
        crate::log_warn!(
            "Radar: CRC mismatch (expected {:#x}, received {:#x})",
            expected,
            received
        );
        return Err(Error::Crc);
    }
    Ok(())
}
