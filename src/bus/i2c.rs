//! I2C register access

use super::RegisterInterface;
use crate::platform::{Error, Result};
use embedded_hal_async::i2c::{I2c, Operation};

/// 8-bit register file behind a 7-bit I2C address
///
/// Some chips (ST sensors) only advance the register pointer during a burst
/// when the MSB of the address byte is set. `with_auto_increment` supplies
/// that bit; it is applied to multi-byte transfers only.
pub struct I2cRegisters<I2C> {
    i2c: I2C,
    address: u8,
    auto_increment: u8,
}

impl<I2C> I2cRegisters<I2C>
where
    I2C: I2c,
{
    /// Create register access for the device at `address`
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            auto_increment: 0,
        }
    }

    /// Set the register-address bit that enables pointer auto-increment
    pub fn with_auto_increment(mut self, mask: u8) -> Self {
        self.auto_increment = mask;
        self
    }

    /// Device address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Change the device address (address-select pins moved)
    pub fn set_address(&mut self, address: u8) {
        self.address = address;
    }

    /// Raw bus access for transfers that are not register shaped
    pub fn bus(&mut self) -> &mut I2C {
        &mut self.i2c
    }

    /// Give the bus back
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn register_byte(&self, reg: u8, len: usize) -> u8 {
        if len > 1 {
            reg | self.auto_increment
        } else {
            reg
        }
    }
}

impl<I2C> RegisterInterface for I2cRegisters<I2C>
where
    I2C: I2c,
{
    async fn write_registers(&mut self, reg: u8, data: &[u8]) -> Result<()> {
        let reg_byte = [self.register_byte(reg, data.len())];
        self.i2c
            .transaction(
                self.address,
                &mut [Operation::Write(&reg_byte), Operation::Write(data)],
            )
            .await
            .map_err(Error::i2c)
    }

    async fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> Result<()> {
        let reg_byte = [self.register_byte(reg, buf.len())];
        self.i2c
            .write_read(self.address, &reg_byte, buf)
            .await
            .map_err(Error::i2c)
    }
}
