//! DIGI IN Click (Maxim MAX22190 octal industrial digital input)
//!
//! SPI frames are three bytes with CRC enabled (CRC pin high):
//!
//! ```text
//! SDI: [W|addr] [data] [000|crc5]
//! SDO: [inputs] [data] [WBG|24VM|ALRMT|crc5]
//! ```
//!
//! and two bytes with CRC disabled. The CRC covers the first 19 bits of the
//! frame; see `communication::crc::crc5`.

mod driver;
pub mod registers;

pub use driver::DigiIn;

use bitflags::bitflags;

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigiInConfig {
    /// Frames carry CRC5 (must match the board's CRC jumper)
    pub crc_enabled: bool,
}

impl Default for DigiInConfig {
    fn default() -> Self {
        Self { crc_enabled: true }
    }
}

bitflags! {
    /// Status bits returned in the third byte of every CRC frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FrameStatus: u8 {
        /// At least one input reports wire break
        const WIRE_BREAK = 0x80;
        /// Field supply below threshold
        const SUPPLY_LOW = 0x40;
        /// Temperature alarm
        const TEMPERATURE_ALARM = 0x20;
    }
}

bitflags! {
    /// FAULT1 register
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Fault1: u8 {
        const WIRE_BREAK = 0x01;
        const SUPPLY_24V_MISSING = 0x02;
        const SUPPLY_24V_LOW = 0x04;
        const TEMPERATURE_ALARM_1 = 0x08;
        const TEMPERATURE_ALARM_2 = 0x10;
        const FAULT2 = 0x20;
        const POWER_ON_RESET = 0x40;
        const CRC = 0x80;
    }
}

bitflags! {
    /// FAULT2 register
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Fault2: u8 {
        const REFERENCE_WIRE_BREAK_SHORT = 0x01;
        const REFERENCE_WIRE_BREAK_OPEN = 0x02;
        const REFERENCE_DI_SHORT = 0x04;
        const REFERENCE_DI_OPEN = 0x08;
        const OVERTEMPERATURE = 0x10;
        const FRAME_ERROR = 0x20;
    }
}

/// Glitch filter delay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FilterDelay {
    Us50,
    Us100,
    Us400,
    Us800,
    #[default]
    Ms1_6,
    Ms3_2,
    Ms12_8,
    Ms20,
}

impl FilterDelay {
    pub fn register_value(self) -> u8 {
        match self {
            FilterDelay::Us50 => 0,
            FilterDelay::Us100 => 1,
            FilterDelay::Us400 => 2,
            FilterDelay::Us800 => 3,
            FilterDelay::Ms1_6 => 4,
            FilterDelay::Ms3_2 => 5,
            FilterDelay::Ms12_8 => 6,
            FilterDelay::Ms20 => 7,
        }
    }
}

/// Per-channel filter settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterConfig {
    pub delay: FilterDelay,
    /// Skip the glitch filter entirely
    pub bypass: bool,
    /// Report wire break on this channel
    pub wire_break_detection: bool,
}

impl FilterConfig {
    pub fn register_value(&self) -> u8 {
        let mut value = self.delay.register_value() & registers::FLT_DELAY_MASK;
        if self.bypass {
            value |= registers::FLT_BYPASS;
        }
        if self.wire_break_detection {
            value |= registers::FLT_WIRE_BREAK_ENABLE;
        }
        value
    }
}
