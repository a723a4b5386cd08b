//! 16-bit register transport for the clock generator
//!
//! Both buses carry the address and value big-endian:
//!
//! ```text
//! I2C write: [addr_hi, addr_lo, val_hi, val_lo]
//! I2C read:  [addr_hi, addr_lo] (repeated START) -> [val_hi, val_lo]
//! SPI write: [addr_hi, addr_lo, val_hi, val_lo]
//! SPI read:  [addr_hi | 0x80, addr_lo, 0, 0] -> value in the last two bytes
//! ```

use crate::bus::ConfigureTarget;
use crate::platform::{Error, Result};
use embedded_hal_async::i2c::I2c;
use embedded_hal_async::spi::{Operation, SpiDevice};

/// Default I2C address
pub const I2C_ADDRESS: u8 = 0x67;

const SPI_READ: u8 = 0x80;

/// 16-bit register access
#[allow(async_fn_in_trait)]
pub trait ClockInterface {
    async fn write_reg(&mut self, reg: u16, value: u16) -> Result<()>;

    async fn read_reg(&mut self, reg: u16) -> Result<u16>;

    /// Read-modify-write, skipping the write when nothing changes
    async fn update_reg(&mut self, reg: u16, mask: u16, value: u16) -> Result<()> {
        let current = self.read_reg(reg).await?;
        let updated = (current & !mask) | (value & mask);
        if updated != current {
            self.write_reg(reg, updated).await?;
        }
        Ok(())
    }
}

impl<T> ConfigureTarget<u16, u16> for T
where
    T: ClockInterface,
{
    async fn write_step(&mut self, reg: u16, value: u16) -> Result<()> {
        self.write_reg(reg, value).await
    }

    async fn update_step(&mut self, reg: u16, mask: u16, value: u16) -> Result<()> {
        self.update_reg(reg, mask, value).await
    }
}

/// I2C transport
pub struct ClockI2c<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> ClockI2c<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> ClockInterface for ClockI2c<I2C> {
    async fn write_reg(&mut self, reg: u16, value: u16) -> Result<()> {
        let [a1, a0] = reg.to_be_bytes();
        let [v1, v0] = value.to_be_bytes();
        self.i2c
            .write(self.address, &[a1, a0, v1, v0])
            .await
            .map_err(Error::i2c)
    }

    async fn read_reg(&mut self, reg: u16) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &reg.to_be_bytes(), &mut buf)
            .await
            .map_err(Error::i2c)?;
        Ok(u16::from_be_bytes(buf))
    }
}

/// SPI transport
pub struct ClockSpi<SPI> {
    spi: SPI,
}

impl<SPI: SpiDevice> ClockSpi<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI: SpiDevice> ClockInterface for ClockSpi<SPI> {
    async fn write_reg(&mut self, reg: u16, value: u16) -> Result<()> {
        let [a1, a0] = reg.to_be_bytes();
        let [v1, v0] = value.to_be_bytes();
        self.spi
            .write(&[a1 & !SPI_READ, a0, v1, v0])
            .await
            .map_err(Error::spi)
    }

    async fn read_reg(&mut self, reg: u16) -> Result<u16> {
        let [a1, a0] = reg.to_be_bytes();
        let mut buf = [0u8; 2];
        self.spi
            .transaction(&mut [
                Operation::Write(&[a1 | SPI_READ, a0]),
                Operation::Read(&mut buf),
            ])
            .await
            .map_err(Error::spi)?;
        Ok(u16::from_be_bytes(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::{I2cTransaction, MockI2c, MockSpi};

    #[tokio::test]
    async fn test_i2c_framing() {
        let i2c = MockI2c::new();
        i2c.set_read_data(&[0x62, 0x14]);
        let mut bus = ClockI2c::new(i2c.clone(), I2C_ADDRESS);

        bus.write_reg(0x0038, 0x0102).await.unwrap();
        assert_eq!(bus.read_reg(0x0005).await.unwrap(), 0x6214);

        assert_eq!(
            i2c.transactions(),
            vec![
                I2cTransaction::Write {
                    addr: I2C_ADDRESS,
                    data: vec![0x00, 0x38, 0x01, 0x02]
                },
                I2cTransaction::WriteRead {
                    addr: I2C_ADDRESS,
                    write_data: vec![0x00, 0x05],
                    read_len: 2
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_spi_framing() {
        let spi = MockSpi::new();
        spi.set_read_data(&[0xAB, 0xCD]);
        let mut bus = ClockSpi::new(spi.clone());

        bus.write_reg(0x0019, 0x0005).await.unwrap();
        assert_eq!(bus.read_reg(0x0007).await.unwrap(), 0xABCD);

        assert_eq!(
            spi.written_frames(),
            vec![vec![0x00, 0x19, 0x00, 0x05], vec![0x80, 0x07]]
        );
    }

    #[tokio::test]
    async fn test_update_reg_skips_unchanged() {
        let i2c = MockI2c::new();
        i2c.set_read_data(&[0x00, 0x10]);
        let mut bus = ClockI2c::new(i2c.clone(), I2C_ADDRESS);

        bus.update_reg(0x0000, 0x0010, 0x0010).await.unwrap();
        assert_eq!(i2c.transactions().len(), 1);
    }
}
