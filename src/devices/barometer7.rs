//! Barometer 7 Click (Infineon KP264 digital absolute pressure sensor, SPI)
//!
//! The KP264 speaks 16-bit frames with odd parity in bit 0. Responses are
//! pipelined: the answer to a command is clocked out during the next frame
//! and echoes the command code.
//!
//! ```text
//! command:  [cmd:3][0:12][P]
//! response: [cmd:3][data:10][status:2][P]
//! ```
//!
//! Pressure and temperature come back as 10-bit codes with a linear
//! transfer function.

use crate::core::time::delay_ms;
use crate::platform::{Error, Result};
use bitflags::bitflags;
use embedded_hal_async::spi::{Operation, SpiDevice};

// =============================================================================
// Commands
// =============================================================================

pub const CMD_NOP: u8 = 0b000;
pub const CMD_TRIGGER_PRESSURE: u8 = 0b001;
pub const CMD_TRIGGER_TEMPERATURE: u8 = 0b010;
pub const CMD_TRIGGER_DIAGNOSIS: u8 = 0b011;
pub const CMD_READ_IDENTIFIER: u8 = 0b111;

/// Response status: conversion not finished
const STATUS_BUSY: u8 = 0b01;

// =============================================================================
// Transfer Function
// =============================================================================

/// Full-scale 10-bit code
pub const RAW_MAX: u16 = 0x3FF;

pub const PRESSURE_MIN_KPA: f32 = 40.0;
pub const PRESSURE_MAX_KPA: f32 = 165.0;

pub const TEMPERATURE_MIN_C: f32 = -40.0;
pub const TEMPERATURE_MAX_C: f32 = 150.0;

/// Pressure in kPa from a 10-bit code
pub fn pressure_kpa(raw: u16) -> f32 {
    let raw = raw.min(RAW_MAX);
    PRESSURE_MIN_KPA + f32::from(raw) * (PRESSURE_MAX_KPA - PRESSURE_MIN_KPA) / f32::from(RAW_MAX)
}

/// Temperature in °C from a 10-bit code
pub fn temperature_celsius(raw: u16) -> f32 {
    let raw = raw.min(RAW_MAX);
    TEMPERATURE_MIN_C
        + f32::from(raw) * (TEMPERATURE_MAX_C - TEMPERATURE_MIN_C) / f32::from(RAW_MAX)
}

/// kPa to mbar
pub fn kpa_to_mbar(kpa: f32) -> f32 {
    kpa * 10.0
}

/// Build a command frame with odd parity
pub fn command_frame(cmd: u8) -> u16 {
    let word = u16::from(cmd & 0x07) << 13;
    with_odd_parity(word)
}

fn with_odd_parity(word: u16) -> u16 {
    let word = word & !0x0001;
    if word.count_ones() % 2 == 0 {
        word | 0x0001
    } else {
        word
    }
}

/// Check parity and split a response into `(echoed command, data, status)`
pub fn parse_response(word: u16) -> Result<(u8, u16, u8)> {
    if word.count_ones() % 2 != 1 {
        crate::log_warn!("KP264: parity error in {:#06x}", word);
        return Err(Error::Crc);
    }
    let cmd = (word >> 13) as u8;
    let data = (word >> 3) & RAW_MAX;
    let status = ((word >> 1) & 0x03) as u8;
    Ok((cmd, data, status))
}

// =============================================================================
// Types
// =============================================================================

/// Chip identification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Barometer7Identifier {
    pub supplier: u8,
    pub metal_version: u8,
    pub asic_version: u8,
}

impl Barometer7Identifier {
    fn from_data(data: u16) -> Self {
        Self {
            supplier: ((data >> 7) & 0x07) as u8,
            metal_version: ((data >> 4) & 0x07) as u8,
            asic_version: (data & 0x0F) as u8,
        }
    }
}

/// Pressure in both units the board is usually read in
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pressure {
    pub kpa: f32,
    pub mbar: f32,
}

bitflags! {
    /// Self-test result
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Diagnosis: u16 {
        const PRESSURE_BRIDGE = 0x001;
        const TEMPERATURE_SENSOR = 0x002;
        const SUPPLY = 0x004;
        const MEMORY = 0x008;
    }
}

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Barometer7Config {
    /// Wait between trigger and readout
    pub conversion_delay_ms: u32,
    /// Readout attempts while the chip reports busy
    pub busy_retries: u32,
}

impl Default for Barometer7Config {
    fn default() -> Self {
        Self {
            conversion_delay_ms: 2,
            busy_retries: 10,
        }
    }
}

// =============================================================================
// Driver
// =============================================================================

/// Barometer 7 Click driver
pub struct Barometer7<SPI> {
    spi: SPI,
    config: Barometer7Config,
}

impl<SPI> Barometer7<SPI>
where
    SPI: SpiDevice,
{
    pub fn new(spi: SPI, config: Barometer7Config) -> Self {
        Self { spi, config }
    }

    pub fn release(self) -> SPI {
        self.spi
    }

    /// Clock one frame out and the previous command's answer in
    async fn transfer(&mut self, cmd: u8) -> Result<u16> {
        let mut frame = command_frame(cmd).to_be_bytes();
        self.spi
            .transaction(&mut [Operation::TransferInPlace(&mut frame)])
            .await
            .map_err(Error::spi)?;
        Ok(u16::from_be_bytes(frame))
    }

    /// Trigger `cmd` and collect its pipelined answer
    async fn execute(&mut self, cmd: u8) -> Result<u16> {
        self.transfer(cmd).await?;

        for _ in 0..=self.config.busy_retries {
            delay_ms(self.config.conversion_delay_ms).await;
            let (echo, data, status) = parse_response(self.transfer(CMD_NOP).await?)?;
            if echo != cmd {
                crate::log_warn!("KP264: echo {:#x} does not match command {:#x}", echo, cmd);
                return Err(Error::InvalidResponse);
            }
            match status {
                0 => return Ok(data),
                STATUS_BUSY => {
                    // Re-issue so the next frame carries the result again
                    self.transfer(cmd).await?;
                }
                other => return Err(Error::Status(u16::from(other))),
            }
        }
        Err(Error::Timeout)
    }

    /// Read the chip identification
    pub async fn read_identifier(&mut self) -> Result<Barometer7Identifier> {
        let data = self.execute(CMD_READ_IDENTIFIER).await?;
        let id = Barometer7Identifier::from_data(data);
        crate::log_info!(
            "KP264 supplier {} metal {} asic {}",
            id.supplier,
            id.metal_version,
            id.asic_version
        );
        Ok(id)
    }

    /// 10-bit pressure code
    pub async fn read_raw_pressure(&mut self) -> Result<u16> {
        self.execute(CMD_TRIGGER_PRESSURE).await
    }

    /// 10-bit temperature code
    pub async fn read_raw_temperature(&mut self) -> Result<u16> {
        self.execute(CMD_TRIGGER_TEMPERATURE).await
    }

    /// Pressure in kPa and mbar
    pub async fn read_pressure(&mut self) -> Result<Pressure> {
        let kpa = pressure_kpa(self.read_raw_pressure().await?);
        Ok(Pressure {
            kpa,
            mbar: kpa_to_mbar(kpa),
        })
    }

    /// Temperature in °C
    pub async fn read_temperature(&mut self) -> Result<f32> {
        Ok(temperature_celsius(self.read_raw_temperature().await?))
    }

    /// Run the built-in self test; an empty set means no fault
    pub async fn diagnosis(&mut self) -> Result<Diagnosis> {
        let data = self.execute(CMD_TRIGGER_DIAGNOSIS).await?;
        Ok(Diagnosis::from_bits_truncate(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockSpi;

    fn response(cmd: u8, data: u16, status: u8) -> [u8; 2] {
        let word = (u16::from(cmd) << 13) | ((data & RAW_MAX) << 3) | (u16::from(status) << 1);
        with_odd_parity(word).to_be_bytes()
    }

    #[test]
    fn test_command_frames_have_odd_parity() {
        for cmd in 0..8 {
            assert_eq!(command_frame(cmd).count_ones() % 2, 1);
        }
        assert_eq!(command_frame(CMD_NOP), 0x0001);
        assert_eq!(command_frame(CMD_TRIGGER_PRESSURE), 0x2000);
    }

    #[test]
    fn test_conversion_boundaries() {
        assert_eq!(pressure_kpa(0), PRESSURE_MIN_KPA);
        assert!((pressure_kpa(RAW_MAX) - PRESSURE_MAX_KPA).abs() < 1e-3);
        assert_eq!(pressure_kpa(u16::MAX), pressure_kpa(RAW_MAX));
        assert_eq!(temperature_celsius(0), TEMPERATURE_MIN_C);
        assert!((temperature_celsius(RAW_MAX) - TEMPERATURE_MAX_C).abs() < 1e-3);
        assert_eq!(kpa_to_mbar(101.325), 1013.25);
    }

    #[test]
    fn test_parse_response_parity() {
        let word = u16::from_be_bytes(response(CMD_TRIGGER_TEMPERATURE, 0x155, 0));
        assert_eq!(parse_response(word), Ok((CMD_TRIGGER_TEMPERATURE, 0x155, 0)));
        assert_eq!(parse_response(word ^ 0x0100), Err(Error::Crc));
    }

    #[tokio::test]
    async fn test_read_pressure_pipelined() {
        let spi = MockSpi::new();
        spi.set_read_data(&[0x00, 0x00]);
        spi.push_read_data(&response(CMD_TRIGGER_PRESSURE, RAW_MAX, 0));
        let mut baro = Barometer7::new(spi.clone(), Barometer7Config::default());

        let pressure = baro.read_pressure().await.unwrap();

        assert!((pressure.kpa - PRESSURE_MAX_KPA).abs() < 1e-3);
        assert!((pressure.mbar - 1650.0).abs() < 1e-2);
        assert_eq!(spi.written_frames(), vec![vec![0x20, 0x00], vec![0x00, 0x01]]);
    }

    #[tokio::test]
    async fn test_busy_then_ready() {
        let spi = MockSpi::new();
        spi.set_read_data(&[0x00, 0x00]);
        spi.push_read_data(&response(CMD_TRIGGER_TEMPERATURE, 0, STATUS_BUSY));
        spi.push_read_data(&[0x00, 0x00]);
        spi.push_read_data(&response(CMD_TRIGGER_TEMPERATURE, 0x200, 0));
        let mut baro = Barometer7::new(spi.clone(), Barometer7Config::default());

        assert_eq!(baro.read_raw_temperature().await.unwrap(), 0x200);
        assert_eq!(spi.transactions().len(), 4);
    }

    #[tokio::test]
    async fn test_echo_mismatch() {
        let spi = MockSpi::new();
        spi.set_read_data(&[0x00, 0x00]);
        spi.push_read_data(&response(CMD_TRIGGER_TEMPERATURE, 0, 0));
        let mut baro = Barometer7::new(spi, Barometer7Config::default());

        assert_eq!(baro.read_raw_pressure().await, Err(Error::InvalidResponse));
    }

    #[tokio::test]
    async fn test_read_identifier() {
        let spi = MockSpi::new();
        spi.set_read_data(&[0x00, 0x00]);
        spi.push_read_data(&response(CMD_READ_IDENTIFIER, 0b010_011_0101, 0));
        let mut baro = Barometer7::new(spi, Barometer7Config::default());

        assert_eq!(
            baro.read_identifier().await.unwrap(),
            Barometer7Identifier {
                supplier: 2,
                metal_version: 3,
                asic_version: 5
            }
        );
    }

    #[tokio::test]
    async fn test_diagnosis_flags() {
        let spi = MockSpi::new();
        spi.set_read_data(&[0x00, 0x00]);
        spi.push_read_data(&response(CMD_TRIGGER_DIAGNOSIS, 0x005, 0));
        let mut baro = Barometer7::new(spi, Barometer7Config::default());

        assert_eq!(
            baro.diagnosis().await.unwrap(),
            Diagnosis::PRESSURE_BRIDGE | Diagnosis::SUPPLY
        );
    }
}
