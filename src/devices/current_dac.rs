//! 4-20mA T 2 Click (TI DAC161S997 16-bit loop-powered current DAC)
//!
//! Every SPI frame is 24 bits: `[register, value_hi, value_lo]`. A read is
//! two frames: `0x80 | register` latches the value and the following NOP
//! frame clocks it out.

use crate::bus::{sequence, ConfigureTarget, Step};
use crate::core::time::delay_ms;
use crate::platform::{Error, Result};
use bitflags::bitflags;
use embedded_hal_async::spi::SpiDevice;

// =============================================================================
// Registers
// =============================================================================

pub const XFER: u8 = 0x01;
pub const NOP: u8 = 0x02;
pub const WR_MODE: u8 = 0x03;
pub const DACCODE: u8 = 0x04;
pub const ERR_CONFIG: u8 = 0x05;
pub const ERR_LOW: u8 = 0x06;
pub const ERR_HIGH: u8 = 0x07;
pub const RESET: u8 = 0x08;
pub const STATUS: u8 = 0x09;

pub const READ_BIT: u8 = 0x80;

pub const XFER_VALUE: u16 = 0x00FF;
pub const RESET_VALUE: u16 = 0xC33C;
pub const WR_MODE_PROTECT: u16 = 0x0001;

/// Upper limit of the output range
pub const MAX_CURRENT_MA: f32 = 24.0;

/// DAC code for a loop current in mA
pub fn current_to_code(ma: f32) -> Result<u16> {
    if !(0.0..=MAX_CURRENT_MA).contains(&ma) {
        return Err(Error::InvalidArgument);
    }
    let code = libm::floorf(ma * 65536.0 / MAX_CURRENT_MA);
    Ok(if code >= 65535.0 { u16::MAX } else { code as u16 })
}

/// Loop current in mA for a DAC code
pub fn code_to_current(code: u16) -> f32 {
    f32::from(code) * MAX_CURRENT_MA / 65536.0
}

bitflags! {
    /// STATUS register
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u16 {
        const ERRLVL_PIN = 0x0010;
        const FRAME_ERROR = 0x0008;
        const SPI_TIMEOUT = 0x0004;
        const LOOP_ERROR = 0x0002;
        const CURRENT_LOOP = 0x0001;
    }
}

impl Status {
    /// DAC resolution field (bits 7:5)
    pub fn resolution(raw: u16) -> u8 {
        ((raw >> 5) & 0x07) as u8
    }
}

/// ERR_CONFIG fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ErrorConfig {
    /// Loop error retry interval code (0..=7, 50 ms steps)
    pub loop_retry_time: u8,
    pub disable_retry_loop: bool,
    pub mask_loop_error: bool,
    pub disable_loop_error_pin: bool,
    pub mask_spi_error: bool,
    /// SPI watchdog period code (0..=7, 50 ms steps)
    pub spi_timeout: u8,
    pub mask_spi_timeout: bool,
}

impl Default for ErrorConfig {
    fn default() -> Self {
        Self {
            loop_retry_time: 1,
            disable_retry_loop: false,
            mask_loop_error: false,
            disable_loop_error_pin: false,
            mask_spi_error: false,
            spi_timeout: 1,
            mask_spi_timeout: false,
        }
    }
}

impl ErrorConfig {
    pub fn register_value(&self) -> u16 {
        let flag = |set: bool, bit: u16| if set { bit } else { 0 };
        (u16::from(self.loop_retry_time & 0x07) << 8)
            | flag(self.disable_retry_loop, 0x0080)
            | flag(self.mask_loop_error, 0x0040)
            | flag(self.disable_loop_error_pin, 0x0020)
            | flag(self.mask_spi_error, 0x0010)
            | (u16::from(self.spi_timeout & 0x07) << 1)
            | flag(self.mask_spi_timeout, 0x0001)
    }
}

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentDacConfig {
    /// Latch writes only on XFER
    pub protect: bool,
    /// Error-low level code (upper byte of ERR_LOW, at most 0x80)
    pub error_low: u8,
    /// Error-high level code (upper byte of ERR_HIGH, at least 0x80)
    pub error_high: u8,
    pub error_config: ErrorConfig,
}

impl Default for CurrentDacConfig {
    fn default() -> Self {
        Self {
            protect: false,
            error_low: 0x24,
            error_high: 0xF0,
            error_config: ErrorConfig::default(),
        }
    }
}

// =============================================================================
// Driver
// =============================================================================

/// 4-20mA T 2 Click driver
pub struct CurrentDac<SPI> {
    spi: SPI,
    config: CurrentDacConfig,
}

impl<SPI> CurrentDac<SPI>
where
    SPI: SpiDevice,
{
    pub fn new(spi: SPI, config: CurrentDacConfig) -> Self {
        Self { spi, config }
    }

    pub fn release(self) -> SPI {
        self.spi
    }

    async fn frame(&mut self, reg: u8, value: u16) -> Result<[u8; 3]> {
        let [hi, lo] = value.to_be_bytes();
        let mut buf = [reg, hi, lo];
        self.spi.transfer_in_place(&mut buf).await.map_err(Error::spi)?;
        Ok(buf)
    }

    pub async fn write_register(&mut self, reg: u8, value: u16) -> Result<()> {
        self.frame(reg, value).await?;
        if self.config.protect && reg != XFER && reg != NOP {
            self.frame(XFER, XFER_VALUE).await?;
        }
        Ok(())
    }

    pub async fn read_register(&mut self, reg: u8) -> Result<u16> {
        self.frame(READ_BIT | reg, 0).await?;
        let rx = self.frame(NOP, 0).await?;
        Ok(u16::from_be_bytes([rx[1], rx[2]]))
    }

    /// Return every register to its power-on value
    pub async fn reset(&mut self) -> Result<()> {
        self.frame(RESET, RESET_VALUE).await?;
        delay_ms(1).await;
        self.config.protect = false;
        Ok(())
    }

    pub async fn set_protect_mode(&mut self, protect: bool) -> Result<()> {
        let value = if protect { WR_MODE_PROTECT } else { 0 };
        self.frame(WR_MODE, value).await?;
        self.config.protect = protect;
        Ok(())
    }

    pub async fn set_dac_code(&mut self, code: u16) -> Result<()> {
        self.write_register(DACCODE, code).await
    }

    /// Drive the loop at `ma` milliamps (0..=24)
    pub async fn set_output_current(&mut self, ma: f32) -> Result<()> {
        let code = current_to_code(ma)?;
        crate::log_debug!("DAC161: {} mA -> code {:#06x}", ma, code);
        self.set_dac_code(code).await
    }

    /// Currents signalled on loop and SPI errors
    pub async fn set_error_levels(&mut self, low: u8, high: u8) -> Result<()> {
        if low > 0x80 || high < 0x80 {
            return Err(Error::InvalidArgument);
        }
        self.write_register(ERR_LOW, u16::from(low) << 8).await?;
        self.write_register(ERR_HIGH, u16::from(high) << 8).await?;
        self.config.error_low = low;
        self.config.error_high = high;
        Ok(())
    }

    pub async fn set_error_config(&mut self, error_config: ErrorConfig) -> Result<()> {
        self.write_register(ERR_CONFIG, error_config.register_value())
            .await?;
        self.config.error_config = error_config;
        Ok(())
    }

    pub async fn read_status(&mut self) -> Result<Status> {
        let raw = self.read_register(STATUS).await?;
        Ok(Status::from_bits_truncate(raw))
    }

    /// Error handling, error levels and write mode from the config
    pub async fn default_config(&mut self) -> Result<()> {
        if self.config.error_low > 0x80 || self.config.error_high < 0x80 {
            return Err(Error::InvalidArgument);
        }
        let protect = self.config.protect;
        // The chip may still be protected from an earlier call, so latch
        // every write; XFER is ignored in unprotected mode
        self.config.protect = true;
        let steps: [Step<u8, u16>; 4] = [
            Step::Write(ERR_CONFIG, self.config.error_config.register_value()),
            Step::Write(ERR_LOW, u16::from(self.config.error_low) << 8),
            Step::Write(ERR_HIGH, u16::from(self.config.error_high) << 8),
            Step::Write(WR_MODE, if protect { WR_MODE_PROTECT } else { 0 }),
        ];
        let result = sequence::apply(self, &steps).await;
        self.config.protect = protect;
        result
    }
}

impl<SPI> ConfigureTarget<u8, u16> for CurrentDac<SPI>
where
    SPI: SpiDevice,
{
    async fn write_step(&mut self, reg: u8, value: u16) -> Result<()> {
        self.write_register(reg, value).await
    }

    async fn update_step(&mut self, reg: u8, mask: u16, value: u16) -> Result<()> {
        let current = self.read_register(reg).await?;
        let updated = (current & !mask) | (value & mask);
        if updated != current {
            self.write_register(reg, updated).await?;
        }
        Ok(())
    }
}
