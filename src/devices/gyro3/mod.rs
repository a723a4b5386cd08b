//! Gyro 3 Click (ST I3G4250D 3-axis gyroscope)
//!
//! The driver is generic over [`RegisterInterface`](crate::bus::RegisterInterface)
//! so the same code runs on I2C (`new_i2c`) and SPI (`new_spi`).

mod driver;
pub mod registers;

pub use driver::Gyro3;

use bitflags::bitflags;

/// Output data rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataRate {
    #[default]
    Hz100,
    Hz200,
    Hz400,
    Hz800,
}

impl DataRate {
    pub fn bits(self) -> u8 {
        match self {
            DataRate::Hz100 => 0x00,
            DataRate::Hz200 => 0x40,
            DataRate::Hz400 => 0x80,
            DataRate::Hz800 => 0xC0,
        }
    }

    pub fn hz(self) -> u16 {
        match self {
            DataRate::Hz100 => 100,
            DataRate::Hz200 => 200,
            DataRate::Hz400 => 400,
            DataRate::Hz800 => 800,
        }
    }
}

/// Full-scale range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FullScale {
    #[default]
    Dps245,
    Dps500,
    Dps2000,
}

impl FullScale {
    pub fn bits(self) -> u8 {
        match self {
            FullScale::Dps245 => 0x00,
            FullScale::Dps500 => 0x10,
            FullScale::Dps2000 => 0x20,
        }
    }

    /// Sensitivity in dps per LSB
    pub fn sensitivity(self) -> f32 {
        match self {
            FullScale::Dps245 => 0.00875,
            FullScale::Dps500 => 0.0175,
            FullScale::Dps2000 => 0.07,
        }
    }
}

/// High-pass filter mode (CTRL_REG2 HPM)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HighPassMode {
    NormalReset,
    Reference,
    Normal,
    AutoReset,
}

/// High-pass filter setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HighPass {
    pub mode: HighPassMode,
    /// HPCF code 0..=9
    pub cutoff: u8,
}

impl HighPass {
    pub fn register_value(self) -> u8 {
        let mode = match self.mode {
            HighPassMode::NormalReset => 0x00,
            HighPassMode::Reference => 0x10,
            HighPassMode::Normal => 0x20,
            HighPassMode::AutoReset => 0x30,
        };
        mode | (self.cutoff & 0x0F)
    }
}

bitflags! {
    /// INT1_CFG
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InterruptEnable: u8 {
        const AND_OR = 0x80;
        const LATCH = 0x40;
        const Z_HIGH = 0x20;
        const Z_LOW = 0x10;
        const Y_HIGH = 0x08;
        const Y_LOW = 0x04;
        const X_HIGH = 0x02;
        const X_LOW = 0x01;
    }

    /// INT1_SRC
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InterruptSource: u8 {
        const ACTIVE = 0x40;
        const Z_HIGH = 0x20;
        const Z_LOW = 0x10;
        const Y_HIGH = 0x08;
        const Y_LOW = 0x04;
        const X_HIGH = 0x02;
        const X_LOW = 0x01;
    }
}

/// Threshold interrupt on INT1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptConfig {
    pub enable: InterruptEnable,
    /// 15-bit thresholds for X, Y, Z
    pub threshold: [u16; 3],
    /// 7-bit duration in ODR periods
    pub duration: u8,
    /// Hold the event for `duration` before clearing
    pub wait: bool,
}

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Gyro3Config {
    pub data_rate: DataRate,
    pub full_scale: FullScale,
}

/// Scale a raw sample to degrees per second
pub fn raw_to_dps(raw: i16, full_scale: FullScale) -> f32 {
    f32::from(raw) * full_scale.sensitivity()
}
