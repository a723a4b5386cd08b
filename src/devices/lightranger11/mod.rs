//! LightRanger 11 Click (ST VL53L7CX 8x8 multizone time-of-flight sensor)
//!
//! ## Protocol
//!
//! - I2C at 0x29, 16-bit big-endian register addresses, register pages
//!   selected through `0x7FFF`
//! - The sensor runs downloaded firmware; settings live in firmware memory
//!   and are reached through the DCI mailbox (`UI_CMD_*`)
//! - Multi-byte DCI payloads and ranging frames travel as big-endian 32-bit
//!   words; the driver swaps them to little-endian before interpreting them
//!
//! ## Usage
//!
//! ```ignore
//! use click_drivers::devices::lightranger11::{LightRanger11, LightRanger11Config, Resolution};
//!
//! let mut tof = LightRanger11::new(i2c, LightRanger11Config::default());
//! tof.check_id().await?;
//! tof.init(FIRMWARE).await?;
//! tof.set_resolution(Resolution::Zones8x8).await?;
//! tof.start_ranging().await?;
//! if tof.check_data_ready().await? {
//!     let results = tof.get_ranging_data().await?;
//! }
//! ```

mod driver;
pub mod registers;

pub use driver::LightRanger11;

use crate::platform::{Error, Result};
use registers::*;

/// Zones of the largest resolution
pub const MAX_ZONES: usize = 64;

/// Frame header bytes ahead of the first block
pub const FRAME_HEADER_LEN: usize = 16;
/// Footer bytes after the last block
pub const FRAME_FOOTER_LEN: usize = 8;

/// Largest ranging frame (8x8 with `OUTPUT_LIST`)
pub const MAX_FRAME_LEN: usize = 320;

/// Zone layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resolution {
    #[default]
    Zones4x4,
    Zones8x8,
}

impl Resolution {
    pub fn zones(self) -> u8 {
        match self {
            Resolution::Zones4x4 => 16,
            Resolution::Zones8x8 => 64,
        }
    }

    /// Highest ranging frequency for this layout
    pub fn max_frequency_hz(self) -> u8 {
        match self {
            Resolution::Zones4x4 => 60,
            Resolution::Zones8x8 => 15,
        }
    }

    fn from_zones(zones: u16) -> Result<Self> {
        match zones {
            16 => Ok(Resolution::Zones4x4),
            64 => Ok(Resolution::Zones8x8),
            _ => Err(Error::InvalidResponse),
        }
    }
}

/// One ranging frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsData {
    pub silicon_temp_degc: i8,
    pub nb_target_detected: [u8; MAX_ZONES],
    pub distance_mm: [i16; MAX_ZONES],
    pub target_status: [u8; MAX_ZONES],
    /// Valid entries in the per-zone arrays
    pub zones: u8,
}

impl Default for ResultsData {
    fn default() -> Self {
        Self {
            silicon_temp_degc: 0,
            nb_target_detected: [0; MAX_ZONES],
            distance_mm: [0; MAX_ZONES],
            target_status: [0; MAX_ZONES],
            zones: 0,
        }
    }
}

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightRanger11Config {
    pub address: u8,
    /// Polling budget for mailbox and boot status
    pub timeout_ms: u32,
    /// Firmware download chunk
    pub chunk_size: usize,
}

impl Default for LightRanger11Config {
    fn default() -> Self {
        Self {
            address: 0x29,
            timeout_ms: 2_000,
            chunk_size: 4096,
        }
    }
}

/// Decoded block header `(idx, type, size)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub idx: u16,
    pub kind: u8,
    pub size: u16,
}

impl BlockHeader {
    pub fn from_word(word: u32) -> Self {
        Self {
            idx: (word >> 16) as u16,
            kind: (word & 0x0F) as u8,
            size: ((word >> 4) & 0x0FFF) as u16,
        }
    }

    pub fn to_word(self) -> u32 {
        (u32::from(self.idx) << 16) | (u32::from(self.size & 0x0FFF) << 4) | u32::from(self.kind & 0x0F)
    }

    /// Payload bytes following the header
    pub fn payload_len(self) -> usize {
        if self.kind > 1 && self.kind < 0x0D {
            usize::from(self.kind) * usize::from(self.size)
        } else {
            usize::from(self.size)
        }
    }

    /// Per-zone blocks are resized to the active resolution
    fn sized_for(self, zones: u8) -> Self {
        if self.kind >= 1 && self.kind < 0x0D {
            Self {
                size: u16::from(zones),
                ..self
            }
        } else {
            self
        }
    }
}

/// Reverse the bytes of every 32-bit word
pub fn swap_words(buf: &mut [u8]) {
    for word in buf.chunks_exact_mut(4) {
        word.reverse();
    }
}

/// Output list headers sized for `resolution`
pub fn output_list(resolution: Resolution) -> [u32; OUTPUT_LIST.len()] {
    let mut list = OUTPUT_LIST;
    for word in list.iter_mut() {
        *word = BlockHeader::from_word(*word)
            .sized_for(resolution.zones())
            .to_word();
    }
    list
}

/// Bytes the firmware streams per frame for `resolution`
pub fn frame_len(resolution: Resolution) -> usize {
    let blocks: usize = output_list(resolution)
        .iter()
        .map(|&w| 4 + BlockHeader::from_word(w).payload_len())
        .sum();
    FRAME_HEADER_LEN + blocks + FRAME_FOOTER_LEN
}

/// Parse a frame already converted with `swap_words`
pub fn parse_results(frame: &[u8], resolution: Resolution) -> Result<ResultsData> {
    let len = frame.len();
    if len < FRAME_HEADER_LEN + FRAME_FOOTER_LEN {
        return Err(Error::InvalidResponse);
    }

    let header_id = u16::from_be_bytes([frame[8], frame[9]]);
    let footer_id = u16::from_be_bytes([frame[len - 4], frame[len - 3]]);
    if header_id != footer_id {
        crate::log_warn!("VL53L7CX: corrupted frame ({} != {})", header_id, footer_id);
        return Err(Error::InvalidResponse);
    }

    let zones = usize::from(resolution.zones());
    let mut results = ResultsData {
        zones: resolution.zones(),
        ..ResultsData::default()
    };

    let end = len - FRAME_FOOTER_LEN;
    let mut i = FRAME_HEADER_LEN;
    while i + 4 <= end {
        let header = BlockHeader::from_word(u32::from_le_bytes([
            frame[i],
            frame[i + 1],
            frame[i + 2],
            frame[i + 3],
        ]));
        let start = i + 4;
        let payload = frame
            .get(start..start + header.payload_len())
            .ok_or(Error::InvalidResponse)?;

        match header.idx {
            METADATA_IDX => {
                let temp = payload.get(8).ok_or(Error::InvalidResponse)?;
                results.silicon_temp_degc = *temp as i8;
            }
            NB_TARGET_DETECTED_IDX => {
                let n = zones.min(payload.len());
                results.nb_target_detected[..n].copy_from_slice(&payload[..n]);
            }
            DISTANCE_IDX => {
                for (out, raw) in results.distance_mm[..zones]
                    .iter_mut()
                    .zip(payload.chunks_exact(2))
                {
                    let mm = i16::from_le_bytes([raw[0], raw[1]]) / 4;
                    *out = mm.max(0);
                }
            }
            TARGET_STATUS_IDX => {
                let n = zones.min(payload.len());
                results.target_status[..n].copy_from_slice(&payload[..n]);
            }
            _ => {}
        }
        i = start + header.payload_len();
    }

    Ok(results)
}
