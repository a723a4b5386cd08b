//! SPI register access

use super::RegisterInterface;
use crate::platform::{Error, Result};
use embedded_hal_async::spi::{Operation, SpiDevice};

/// Address-byte flags of an SPI register protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiFraming {
    /// OR-ed into the address byte of reads
    pub read_bit: u8,
    /// OR-ed into the address byte of multi-byte transfers
    pub multi_byte_bit: u8,
}

impl SpiFraming {
    /// MSB set for reads, no burst flag
    pub const READ_MSB: Self = Self {
        read_bit: 0x80,
        multi_byte_bit: 0x00,
    };

    /// ST sensor convention: MSB read, bit 6 auto-increment
    pub const READ_MSB_MULTI_BIT6: Self = Self {
        read_bit: 0x80,
        multi_byte_bit: 0x40,
    };

    fn address_byte(&self, reg: u8, read: bool, len: usize) -> u8 {
        let mut byte = reg;
        if read {
            byte |= self.read_bit;
        }
        if len > 1 {
            byte |= self.multi_byte_bit;
        }
        byte
    }
}

impl Default for SpiFraming {
    fn default() -> Self {
        Self::READ_MSB
    }
}

/// 8-bit register file behind an SPI chip select
///
/// The `SpiDevice` owns chip-select handling: each register access is one
/// `transaction`, so CS stays asserted from address byte to last data byte.
pub struct SpiRegisters<SPI> {
    spi: SPI,
    framing: SpiFraming,
}

impl<SPI> SpiRegisters<SPI>
where
    SPI: SpiDevice,
{
    /// Create register access with the given address framing
    pub fn new(spi: SPI, framing: SpiFraming) -> Self {
        Self { spi, framing }
    }

    /// Raw bus access
    pub fn bus(&mut self) -> &mut SPI {
        &mut self.spi
    }

    /// Give the bus back
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI> RegisterInterface for SpiRegisters<SPI>
where
    SPI: SpiDevice,
{
    async fn write_registers(&mut self, reg: u8, data: &[u8]) -> Result<()> {
        let addr = [self.framing.address_byte(reg, false, data.len())];
        self.spi
            .transaction(&mut [Operation::Write(&addr), Operation::Write(data)])
            .await
            .map_err(Error::spi)
    }

    async fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> Result<()> {
        let addr = [self.framing.address_byte(reg, true, buf.len())];
        self.spi
            .transaction(&mut [Operation::Write(&addr), Operation::Read(buf)])
            .await
            .map_err(Error::spi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockSpi;

    #[tokio::test]
    async fn test_write_register_frame() {
        let spi = MockSpi::new();
        let mut regs = SpiRegisters::new(spi.clone(), SpiFraming::READ_MSB);

        regs.write_register(0x20, 0x0F).await.unwrap();

        assert_eq!(spi.written_frames(), vec![vec![0x20, 0x0F]]);
    }

    #[tokio::test]
    async fn test_read_sets_read_and_multi_bits() {
        let spi = MockSpi::new();
        spi.set_read_data(&[0xD3, 0x10, 0x20]);
        let mut regs = SpiRegisters::new(spi.clone(), SpiFraming::READ_MSB_MULTI_BIT6);

        let id = regs.read_register(0x0F).await.unwrap();
        let mut buf = [0u8; 2];
        regs.read_registers(0x28, &mut buf).await.unwrap();

        assert_eq!(id, 0xD3);
        assert_eq!(buf, [0x10, 0x20]);
        assert_eq!(spi.written_frames(), vec![vec![0x8F], vec![0xE8]]);
    }

    #[tokio::test]
    async fn test_bus_error_propagates() {
        let spi = MockSpi::new();
        spi.fail_next(1);
        let mut regs = SpiRegisters::new(spi, SpiFraming::default());

        assert!(matches!(
            regs.write_register(0x00, 0x00).await,
            Err(Error::Spi(_))
        ));
    }
}
