//! PWM Click (NXP PCA9685 16-channel 12-bit PWM controller)
//!
//! ## Usage
//!
//! ```ignore
//! use click_drivers::devices::pwm::{Pwm, PwmConfig};
//!
//! let mut pwm = Pwm::new(i2c, oe_pin, PwmConfig::default());
//! pwm.default_config().await?;
//! pwm.set_output_enable(true)?;
//! pwm.set_duty(0, 0.25).await?;
//! ```

mod driver;

pub use driver::Pwm;

use crate::platform::{Error, Result};

pub const MODE1: u8 = 0x00;
pub const MODE2: u8 = 0x01;
pub const LED0_ON_L: u8 = 0x06;
pub const ALL_LED_ON_L: u8 = 0xFA;
pub const PRE_SCALE: u8 = 0xFE;

pub const MODE1_RESTART: u8 = 0x80;
pub const MODE1_AI: u8 = 0x20;
pub const MODE1_SLEEP: u8 = 0x10;
pub const MODE1_ALLCALL: u8 = 0x01;

pub const MODE2_INVRT: u8 = 0x10;
pub const MODE2_OUTDRV: u8 = 0x04;

/// FULL bit in the ON_H/OFF_H registers
pub const LED_FULL: u8 = 0x10;

pub const CHANNELS: u8 = 16;

/// Counter steps per period
pub const STEPS: u16 = 4096;

/// Internal oscillator
pub const OSC_HZ: f32 = 25_000_000.0;

pub const PRESCALE_MIN: u8 = 3;
pub const PRESCALE_MAX: u8 = 255;

/// Prescaler for an output frequency
pub fn prescale_for(hz: f32) -> Result<u8> {
    if hz.is_nan() || hz <= 0.0 {
        return Err(Error::InvalidArgument);
    }
    let value = libm::roundf(OSC_HZ / (f32::from(STEPS) * hz)) - 1.0;
    if !(f32::from(PRESCALE_MIN)..=f32::from(PRESCALE_MAX)).contains(&value) {
        return Err(Error::InvalidArgument);
    }
    Ok(value as u8)
}

/// Output frequency produced by a prescaler
pub fn frequency_for(prescale: u8) -> f32 {
    OSC_HZ / (f32::from(STEPS) * (f32::from(prescale) + 1.0))
}

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PwmConfig {
    pub address: u8,
    pub frequency_hz: f32,
    /// Totem-pole outputs instead of open drain
    pub totem_pole: bool,
    pub invert: bool,
}

impl Default for PwmConfig {
    fn default() -> Self {
        Self {
            address: 0x40,
            frequency_hz: 200.0,
            totem_pole: true,
            invert: false,
        }
    }
}
