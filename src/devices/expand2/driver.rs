//! MCP23017 driver

use super::registers::*;
use super::{Expand2Config, InterruptConfig, Port};
use crate::bus::{sequence, I2cRegisters, RegisterInterface, Step};
use crate::core::time::delay_ms;
use crate::platform::{Error, Result};
use embedded_hal::digital::OutputPin;
use embedded_hal_async::i2c::I2c;

fn pin_mask(pin: u8) -> Result<u8> {
    if pin > 7 {
        return Err(Error::InvalidArgument);
    }
    Ok(1 << pin)
}

/// Expand 2 Click driver
pub struct Expand2<I2C, RST> {
    regs: I2cRegisters<I2C>,
    rst: RST,
    config: Expand2Config,
}

impl<I2C, RST> Expand2<I2C, RST>
where
    I2C: I2c,
    RST: OutputPin,
{
    pub fn new(i2c: I2C, rst: RST, config: Expand2Config) -> Result<Self> {
        if !(BASE_ADDRESS..=BASE_ADDRESS + 7).contains(&config.address) {
            return Err(Error::InvalidArgument);
        }
        Ok(Self {
            regs: I2cRegisters::new(i2c, config.address),
            rst,
            config,
        })
    }

    pub fn release(self) -> (I2C, RST) {
        (self.regs.release(), self.rst)
    }

    /// Pulse the RST line
    pub async fn reset(&mut self) -> Result<()> {
        self.rst.set_low().map_err(Error::gpio)?;
        delay_ms(1).await;
        self.rst.set_high().map_err(Error::gpio)?;
        delay_ms(1).await;
        Ok(())
    }

    /// All pins inputs without pull-ups, interrupts off
    pub async fn default_config(&mut self) -> Result<()> {
        let mut iocon = IOCON_SEQOP;
        if self.config.mirror_interrupts {
            iocon |= IOCON_MIRROR;
        }
        if self.config.interrupt_open_drain {
            iocon |= IOCON_ODR;
        } else if self.config.interrupt_active_high {
            iocon |= IOCON_INTPOL;
        }

        let steps = [
            Step::Write(IOCON, iocon),
            Step::Write(Port::A.register(IODIRA), 0xFF),
            Step::Write(Port::B.register(IODIRA), 0xFF),
            Step::Write(Port::A.register(IPOLA), 0x00),
            Step::Write(Port::B.register(IPOLA), 0x00),
            Step::Write(Port::A.register(GPPUA), 0x00),
            Step::Write(Port::B.register(GPPUA), 0x00),
            Step::Write(Port::A.register(GPINTENA), 0x00),
            Step::Write(Port::B.register(GPINTENA), 0x00),
        ];
        sequence::apply(&mut self.regs, &steps).await
    }

    /// 1 = input, 0 = output
    pub async fn set_direction(&mut self, port: Port, inputs: u8) -> Result<()> {
        self.regs.write_register(port.register(IODIRA), inputs).await
    }

    pub async fn set_pull_up(&mut self, port: Port, mask: u8) -> Result<()> {
        self.regs.write_register(port.register(GPPUA), mask).await
    }

    /// Invert the logic level reported for the selected inputs
    pub async fn set_polarity(&mut self, port: Port, inverted: u8) -> Result<()> {
        self.regs.write_register(port.register(IPOLA), inverted).await
    }

    pub async fn write_port(&mut self, port: Port, value: u8) -> Result<()> {
        self.regs.write_register(port.register(OLATA), value).await
    }

    pub async fn read_port(&mut self, port: Port) -> Result<u8> {
        self.regs.read_register(port.register(GPIOA)).await
    }

    pub async fn set_pin(&mut self, port: Port, pin: u8) -> Result<()> {
        let mask = pin_mask(pin)?;
        self.regs
            .update_register(port.register(OLATA), mask, mask)
            .await
    }

    pub async fn clear_pin(&mut self, port: Port, pin: u8) -> Result<()> {
        let mask = pin_mask(pin)?;
        self.regs.update_register(port.register(OLATA), mask, 0).await
    }

    pub async fn toggle_pin(&mut self, port: Port, pin: u8) -> Result<()> {
        let mask = pin_mask(pin)?;
        let latch = self.regs.read_register(port.register(OLATA)).await?;
        self.regs
            .write_register(port.register(OLATA), latch ^ mask)
            .await
    }

    pub async fn read_pin(&mut self, port: Port, pin: u8) -> Result<bool> {
        let mask = pin_mask(pin)?;
        Ok(self.read_port(port).await? & mask != 0)
    }

    pub async fn configure_interrupt(&mut self, port: Port, config: InterruptConfig) -> Result<()> {
        self.regs
            .write_register(port.register(DEFVALA), config.default_value)
            .await?;
        self.regs
            .write_register(port.register(INTCONA), config.compare)
            .await?;
        self.regs
            .write_register(port.register(GPINTENA), config.enable)
            .await
    }

    /// Pins that caused the pending interrupt
    pub async fn interrupt_flags(&mut self, port: Port) -> Result<u8> {
        self.regs.read_register(port.register(INTFA)).await
    }

    /// Port state latched at the interrupt; reading it clears the interrupt
    pub async fn interrupt_capture(&mut self, port: Port) -> Result<u8> {
        self.regs.read_register(port.register(INTCAPA)).await
    }
}
