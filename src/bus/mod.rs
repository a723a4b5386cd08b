//! Register transaction layer
//!
//! Most Click chips are a bank of 8-bit registers behind an I2C address or
//! an SPI chip select. Every access is one bus transaction:
//!
//! ```text
//! select device -> register address (+ framing bits) -> payload -> deselect
//! ```
//!
//! `RegisterInterface` is that primitive. `I2cRegisters` and `SpiRegisters`
//! implement it for the two buses; drivers that can sit on either bus (Gyro 3)
//! are generic over the trait, so the bus choice is made at compile time.
//!
//! Chips with their own framing (16-bit addresses, CRC, parity) keep the
//! transaction code in their driver but still use `sequence` for their fixed
//! configuration writes.

pub mod i2c;
pub mod sequence;
pub mod spi;

pub use i2c::I2cRegisters;
pub use sequence::{apply, ConfigureTarget, Step};
pub use spi::{SpiFraming, SpiRegisters};

use crate::platform::Result;

/// Register access over a single bus transaction
#[allow(async_fn_in_trait)]
pub trait RegisterInterface {
    /// Write `data` starting at `reg`
    async fn write_registers(&mut self, reg: u8, data: &[u8]) -> Result<()>;

    /// Read `buf.len()` bytes starting at `reg`
    async fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> Result<()>;

    /// Write a single register
    async fn write_register(&mut self, reg: u8, value: u8) -> Result<()> {
        self.write_registers(reg, &[value]).await
    }

    /// Read a single register
    async fn read_register(&mut self, reg: u8) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_registers(reg, &mut buf).await?;
        Ok(buf[0])
    }

    /// Read-modify-write the bits selected by `mask`
    ///
    /// Skips the write when the register already holds the requested bits.
    async fn update_register(&mut self, reg: u8, mask: u8, value: u8) -> Result<()> {
        let current = self.read_register(reg).await?;
        let updated = (current & !mask) | (value & mask);
        if updated != current {
            self.write_register(reg, updated).await?;
        }
        Ok(())
    }
}
