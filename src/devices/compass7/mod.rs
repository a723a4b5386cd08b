//! Compass 7 Click (MEMSIC MMC5603NJ 3-axis AMR magnetometer)
//!
//! ## Features
//!
//! - ±30 G full scale, 20-bit output (0.0625 mG/LSB)
//! - Single-shot or continuous mode up to 1 kHz (255 Hz with auto SET/RESET)
//! - On-chip temperature sensor
//! - I2C at fixed address 0x30
//!
//! ## Usage
//!
//! ```ignore
//! use click_drivers::devices::compass7::{Compass7, Compass7Config};
//!
//! let mut compass = Compass7::new(i2c, Compass7Config::default());
//! compass.check_id().await?;
//! compass.default_config().await?;
//! let field = compass.read_magnetic_flux().await?;
//! ```

mod driver;
pub mod registers;

pub use driver::Compass7;

/// Measurement polling budget in milliseconds
pub const COMPASS7_TIMEOUT: u32 = 100;

/// Filter bandwidth (measurement time)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bandwidth {
    /// 6.6 ms
    #[default]
    Bw00,
    /// 3.5 ms
    Bw01,
    /// 2.0 ms
    Bw10,
    /// 1.2 ms
    Bw11,
}

impl Bandwidth {
    pub fn register_value(self) -> u8 {
        match self {
            Bandwidth::Bw00 => 0x00,
            Bandwidth::Bw01 => 0x01,
            Bandwidth::Bw10 => 0x02,
            Bandwidth::Bw11 => 0x03,
        }
    }
}

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compass7Config {
    pub address: u8,
    pub bandwidth: Bandwidth,
    /// Let the chip SET/RESET the sensor before measurements
    pub auto_set_reset: bool,
    /// Polling budget per measurement in milliseconds
    pub timeout_ms: u32,
}

impl Default for Compass7Config {
    fn default() -> Self {
        Self {
            address: registers::MMC5603_ADDR,
            bandwidth: Bandwidth::Bw00,
            auto_set_reset: true,
            timeout_ms: COMPASS7_TIMEOUT,
        }
    }
}

/// Convert a 20-bit axis reading to µT
pub fn raw_to_microtesla(raw: u32) -> f32 {
    let centered = (raw & 0x000F_FFFF) as i32 - registers::NULL_FIELD_OFFSET;
    centered as f32 / registers::COUNTS_PER_GAUSS * registers::MICROTESLA_PER_GAUSS
}

/// Convert the temperature register to °C
pub fn raw_to_celsius(raw: u8) -> f32 {
    f32::from(raw) * registers::TEMP_SENSITIVITY + registers::TEMP_OFFSET
}

/// Compass heading in degrees [0, 360) from the horizontal field components
pub fn heading_degrees(x: f32, y: f32) -> f32 {
    let heading = libm::atan2f(y, x).to_degrees();
    if heading < 0.0 {
        heading + 360.0
    } else {
        heading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flux_conversion_boundaries() {
        assert_eq!(raw_to_microtesla(524_288), 0.0);
        assert_eq!(raw_to_microtesla(0), -3200.0);
        let max = raw_to_microtesla(0x000F_FFFF);
        assert!((max - 3199.9939).abs() < 0.001);
        // Bits above the converter width are ignored
        assert_eq!(raw_to_microtesla(0xFFF0_0000 | 524_288), 0.0);
    }

    #[test]
    fn test_temperature_conversion() {
        assert_eq!(raw_to_celsius(0), -75.0);
        assert!((raw_to_celsius(125) - 25.0).abs() < 1e-4);
        assert!((raw_to_celsius(255) - 129.0).abs() < 1e-4);
    }

    #[test]
    fn test_heading() {
        assert!((heading_degrees(1.0, 0.0) - 0.0).abs() < 1e-4);
        assert!((heading_degrees(0.0, 1.0) - 90.0).abs() < 1e-4);
        assert!((heading_degrees(0.0, -1.0) - 270.0).abs() < 1e-4);
    }
}
