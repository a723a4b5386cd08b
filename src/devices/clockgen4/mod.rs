//! Clock Gen 4 Click (TI CDCE6214 ultra-low-power clock generator)
//!
//! ## Clock path
//!
//! ```text
//! ref --/R--> PFD --> PLL (N.frac) --> VCO 2335..2625 MHz --/P (4,5,6)--/D--> OUTx
//! ```
//!
//! The chip is reachable over I2C or SPI with 16-bit registers; the driver
//! is generic over [`ClockInterface`].

mod driver;
pub mod interface;
pub mod registers;

pub use driver::ClockGen4;
pub use interface::{ClockI2c, ClockInterface, ClockSpi};

use crate::platform::{Error, Result};

pub const VCO_MIN_HZ: u64 = 2_335_000_000;
pub const VCO_MAX_HZ: u64 = 2_625_000_000;

/// Post-VCO prescaler choices
pub const PRESCALERS: [u8; 3] = [4, 5, 6];

/// 14-bit output divider
pub const OUT_DIV_MAX: u16 = 0x3FFF;

/// Reference divider range
pub const REF_DIV_MAX: u8 = 7;

/// Fractional-N resolution
pub const FRAC_BITS: u32 = 24;

/// Reference clock source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReferenceInput {
    #[default]
    Crystal,
    Lvcmos,
    Differential,
}

impl ReferenceInput {
    pub fn bits(self) -> u16 {
        match self {
            ReferenceInput::Crystal => 0,
            ReferenceInput::Lvcmos => 1,
            ReferenceInput::Differential => 2,
        }
    }
}

/// Output channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    Out1,
    Out2,
    Out3,
    Out4,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::Out1, Channel::Out2, Channel::Out3, Channel::Out4];

    pub fn index(self) -> u8 {
        match self {
            Channel::Out1 => 0,
            Channel::Out2 => 1,
            Channel::Out3 => 2,
            Channel::Out4 => 3,
        }
    }
}

/// Output driver standard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputFormat {
    Lvds,
    Hcsl,
    Lvcmos,
}

impl OutputFormat {
    pub fn bits(self) -> u16 {
        match self {
            OutputFormat::Lvds => 0,
            OutputFormat::Hcsl => 1,
            OutputFormat::Lvcmos => 2,
        }
    }
}

/// PLL and output divider settings for one output frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PllDividers {
    pub prescaler: u8,
    pub out_div: u16,
    pub n_int: u16,
    /// Fraction in units of 2^-24
    pub n_frac: u32,
    pub vco_hz: u64,
}

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockGen4Config {
    pub reference_hz: u32,
    pub input: ReferenceInput,
    pub ref_divider: u8,
    /// PLL lock polling budget after calibration
    pub lock_timeout_ms: u32,
}

impl Default for ClockGen4Config {
    fn default() -> Self {
        Self {
            reference_hz: 25_000_000,
            input: ReferenceInput::Crystal,
            ref_divider: 1,
            lock_timeout_ms: 100,
        }
    }
}

/// Find PLL settings producing `f_out` from a phase detector at `f_pfd`
///
/// Integer-N solutions are preferred; otherwise the first fractional one
/// in prescaler order is used.
pub fn compute_dividers(f_pfd: u32, f_out: u32) -> Result<PllDividers> {
    if f_pfd == 0 || f_out == 0 {
        return Err(Error::InvalidArgument);
    }
    let pfd = u64::from(f_pfd);

    let mut fractional = None;
    for &prescaler in PRESCALERS.iter() {
        let step = u64::from(f_out) * u64::from(prescaler);
        let first = VCO_MIN_HZ.div_ceil(step).max(1);
        let last = (VCO_MAX_HZ / step).min(u64::from(OUT_DIV_MAX));

        for out_div in first..=last {
            let vco = step * out_div;
            let n_int = vco / pfd;
            let rem = vco % pfd;
            let Ok(n_int) = u16::try_from(n_int) else {
                continue;
            };
            let dividers = PllDividers {
                prescaler,
                out_div: out_div as u16,
                n_int,
                n_frac: ((rem << FRAC_BITS) / pfd) as u32,
                vco_hz: vco,
            };
            if rem == 0 {
                return Ok(dividers);
            }
            if fractional.is_none() {
                fractional = Some(dividers);
            }
        }
    }

    fractional.ok_or_else(|| {
        crate::log_warn!("CDCE6214: no divider set for {} Hz", f_out);
        Error::InvalidArgument
    })
}
