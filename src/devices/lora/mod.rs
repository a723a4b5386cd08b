//! LoRa Click (Microchip RN2483 LoRaWAN module, UART 57600)
//!
//! The module speaks ASCII: one command line in, one reply line out, both
//! terminated by CRLF. Transmissions and receive windows finish later with
//! an unsolicited line (`mac_tx_ok`, `mac_rx 1 CAFE`, `radio_err`, ...)
//! which [`Lora::process`] turns into a [`LoraEvent`].

mod driver;

pub use driver::Lora;

use crate::platform::{Error, Result};
use heapless::{String, Vec};

/// Longest line handled (a 255-byte radio payload in hex plus prefix)
pub const MAX_LINE: usize = 540;

/// Largest radio payload
pub const MAX_PAYLOAD: usize = 255;

/// LoRaWAN activation method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JoinMode {
    Otaa,
    Abp,
}

impl JoinMode {
    fn keyword(self) -> &'static str {
        match self {
            JoinMode::Otaa => "otaa",
            JoinMode::Abp => "abp",
        }
    }
}

/// Asynchronous module report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoraEvent {
    /// Uplink done, no downlink
    MacTxOk,
    /// Downlink received after an uplink
    MacRx { port: u8, data: Vec<u8, MAX_PAYLOAD> },
    /// Uplink failed
    MacErr,
    RadioTxOk,
    RadioRx { data: Vec<u8, MAX_PAYLOAD> },
    /// Radio receive window expired or transmission failed
    RadioErr,
    /// Any other line
    Other(String<MAX_LINE>),
}

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoraConfig {
    /// Wait for a command reply
    pub timeout_ms: u32,
    /// Wait for the join verdict
    pub join_timeout_ms: u32,
    pub reset_pulse_ms: u32,
    pub boot_time_ms: u32,
}

impl Default for LoraConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 1_000,
            join_timeout_ms: 15_000,
            reset_pulse_ms: 10,
            boot_time_ms: 100,
        }
    }
}

/// Decode an even-length hex string
pub fn decode_hex(text: &str) -> Result<Vec<u8, MAX_PAYLOAD>> {
    if text.len() % 2 != 0 {
        return Err(Error::InvalidResponse);
    }
    let mut out = Vec::new();
    for pair in text.as_bytes().chunks_exact(2) {
        let digits = core::str::from_utf8(pair).map_err(|_| Error::InvalidResponse)?;
        let byte = u8::from_str_radix(digits, 16).map_err(|_| Error::InvalidResponse)?;
        out.push(byte).map_err(|_| Error::BufferTooSmall)?;
    }
    Ok(out)
}

/// Classify an unsolicited line
pub fn parse_event(line: &str) -> Result<LoraEvent> {
    let mut words = line.split_ascii_whitespace();
    let event = match words.next() {
        Some("mac_tx_ok") => LoraEvent::MacTxOk,
        Some("mac_err") => LoraEvent::MacErr,
        Some("mac_rx") => {
            let port = words
                .next()
                .and_then(|p| p.parse().ok())
                .ok_or(Error::InvalidResponse)?;
            let data = decode_hex(words.next().unwrap_or(""))?;
            LoraEvent::MacRx { port, data }
        }
        Some("radio_tx_ok") => LoraEvent::RadioTxOk,
        Some("radio_err") => LoraEvent::RadioErr,
        Some("radio_rx") => LoraEvent::RadioRx {
            data: decode_hex(words.next().unwrap_or(""))?,
        },
        _ => {
            let mut other = String::new();
            other.push_str(line).map_err(|_| Error::BufferTooSmall)?;
            LoraEvent::Other(other)
        }
    };
    Ok(event)
}
