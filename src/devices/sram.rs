//! SRAM Click (Microchip 23LC1024 1 Mbit serial SRAM)
//!
//! Instructions are one byte followed by a 24-bit address. The mode register
//! decides how far one transaction may run: a single byte, to the end of the
//! 32-byte page (wrapping inside it), or across the whole array.

use crate::platform::{Error, Result};
use embedded_hal_async::spi::{Operation, SpiDevice};

pub const CMD_READ: u8 = 0x03;
pub const CMD_WRITE: u8 = 0x02;
pub const CMD_RDMR: u8 = 0x05;
pub const CMD_WRMR: u8 = 0x01;
pub const CMD_RSTIO: u8 = 0xFF;

/// Array size in bytes
pub const CAPACITY: u32 = 0x2_0000;

/// Page size in bytes
pub const PAGE_SIZE: u32 = 32;

const MODE_MASK: u8 = 0xC0;

/// Operating mode (mode register bits 7:6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Byte,
    Page,
    #[default]
    Sequential,
}

impl Mode {
    pub fn bits(self) -> u8 {
        match self {
            Mode::Byte => 0x00,
            Mode::Page => 0x80,
            Mode::Sequential => 0x40,
        }
    }

    pub fn from_bits(bits: u8) -> Result<Self> {
        match bits & MODE_MASK {
            0x00 => Ok(Mode::Byte),
            0x80 => Ok(Mode::Page),
            0x40 => Ok(Mode::Sequential),
            _ => Err(Error::InvalidResponse),
        }
    }

    /// Longest transfer starting at `address` that this mode allows
    fn burst_len(self, address: u32, remaining: usize) -> usize {
        let limit = match self {
            Mode::Byte => 1,
            Mode::Page => (PAGE_SIZE - address % PAGE_SIZE) as usize,
            Mode::Sequential => remaining,
        };
        remaining.min(limit)
    }
}

fn check_range(address: u32, len: usize) -> Result<()> {
    let end = u64::from(address) + len as u64;
    if end > u64::from(CAPACITY) {
        return Err(Error::InvalidArgument);
    }
    Ok(())
}

fn command(instruction: u8, address: u32) -> [u8; 4] {
    let [_, a2, a1, a0] = address.to_be_bytes();
    [instruction, a2, a1, a0]
}

/// SRAM Click driver
pub struct Sram<SPI> {
    spi: SPI,
    mode: Mode,
}

impl<SPI> Sram<SPI>
where
    SPI: SpiDevice,
{
    /// The chip powers up in sequential mode
    pub fn new(spi: SPI) -> Self {
        Self {
            spi,
            mode: Mode::Sequential,
        }
    }

    pub fn release(self) -> SPI {
        self.spi
    }

    /// Mode the driver believes the chip is in
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Leave SDI/SQI mode and return to plain SPI
    pub async fn reset_io(&mut self) -> Result<()> {
        self.spi.write(&[CMD_RSTIO]).await.map_err(Error::spi)
    }

    pub async fn set_mode(&mut self, mode: Mode) -> Result<()> {
        self.spi
            .write(&[CMD_WRMR, mode.bits()])
            .await
            .map_err(Error::spi)?;
        self.mode = mode;
        Ok(())
    }

    pub async fn get_mode(&mut self) -> Result<Mode> {
        let mut buf = [0u8; 1];
        self.spi
            .transaction(&mut [Operation::Write(&[CMD_RDMR]), Operation::Read(&mut buf)])
            .await
            .map_err(Error::spi)?;
        let mode = Mode::from_bits(buf[0])?;
        self.mode = mode;
        Ok(mode)
    }

    /// Write `data` at `address`, split into as many transactions as the mode needs
    pub async fn write(&mut self, address: u32, data: &[u8]) -> Result<()> {
        check_range(address, data.len())?;
        let mut offset = 0;
        while offset < data.len() {
            let at = address + offset as u32;
            let len = self.mode.burst_len(at, data.len() - offset);
            let cmd = command(CMD_WRITE, at);
            self.spi
                .transaction(&mut [
                    Operation::Write(&cmd),
                    Operation::Write(&data[offset..offset + len]),
                ])
                .await
                .map_err(Error::spi)?;
            offset += len;
        }
        Ok(())
    }

    /// Fill `buf` from `address`
    pub async fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        check_range(address, buf.len())?;
        let mut offset = 0;
        while offset < buf.len() {
            let at = address + offset as u32;
            let len = self.mode.burst_len(at, buf.len() - offset);
            let cmd = command(CMD_READ, at);
            self.spi
                .transaction(&mut [
                    Operation::Write(&cmd),
                    Operation::Read(&mut buf[offset..offset + len]),
                ])
                .await
                .map_err(Error::spi)?;
            offset += len;
        }
        Ok(())
    }

    pub async fn write_byte(&mut self, address: u32, value: u8) -> Result<()> {
        self.write(address, &[value]).await
    }

    pub async fn read_byte(&mut self, address: u32) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read(address, &mut buf).await?;
        Ok(buf[0])
    }

    /// Plain SPI, sequential mode
    pub async fn default_config(&mut self) -> Result<()> {
        self.reset_io().await?;
        self.set_mode(Mode::Sequential).await
    }
}
