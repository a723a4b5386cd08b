//! PCA9685 driver

use super::*;
use crate::bus::{sequence, I2cRegisters, RegisterInterface, Step};
use crate::core::time::delay_ms;
use crate::platform::{Error, Result};
use embedded_hal::digital::OutputPin;
use embedded_hal_async::i2c::I2c;

fn channel_register(channel: u8) -> Result<u8> {
    if channel >= CHANNELS {
        return Err(Error::InvalidArgument);
    }
    Ok(LED0_ON_L + 4 * channel)
}

/// `[ON_L, ON_H, OFF_L, OFF_H]` for a duty cycle in `0.0..=1.0`
fn duty_registers(fraction: f32) -> Result<[u8; 4]> {
    if !(0.0..=1.0).contains(&fraction) {
        return Err(Error::InvalidArgument);
    }
    if fraction == 0.0 {
        return Ok([0, 0, 0, LED_FULL]);
    }
    if fraction == 1.0 {
        return Ok([0, LED_FULL, 0, 0]);
    }
    let off = (libm::roundf(fraction * f32::from(STEPS)) as u16).min(STEPS - 1);
    let [hi, lo] = off.to_be_bytes();
    Ok([0, 0, lo, hi])
}

/// PWM Click driver
///
/// `OE` is the active-low output enable line; pass `NoPin` when it is tied.
pub struct Pwm<I2C, OE> {
    regs: I2cRegisters<I2C>,
    oe: OE,
    config: PwmConfig,
    /// Frequency the prescaler currently produces
    frequency_hz: f32,
}

impl<I2C, OE> Pwm<I2C, OE>
where
    I2C: I2c,
    OE: OutputPin,
{
    pub fn new(i2c: I2C, oe: OE, config: PwmConfig) -> Self {
        Self {
            regs: I2cRegisters::new(i2c, config.address),
            oe,
            config,
            frequency_hz: frequency_for(30),
        }
    }

    pub fn release(self) -> (I2C, OE) {
        (self.regs.release(), self.oe)
    }

    /// Output frequency in Hz
    pub fn frequency(&self) -> f32 {
        self.frequency_hz
    }

    /// Auto-increment, output stage from the config, then the configured frequency
    pub async fn default_config(&mut self) -> Result<()> {
        let mut mode2 = 0;
        if self.config.totem_pole {
            mode2 |= MODE2_OUTDRV;
        }
        if self.config.invert {
            mode2 |= MODE2_INVRT;
        }
        let steps = [
            Step::Write(MODE1, MODE1_AI | MODE1_ALLCALL),
            Step::Write(MODE2, mode2),
        ];
        sequence::apply(&mut self.regs, &steps).await?;
        self.set_frequency(self.config.frequency_hz).await
    }

    /// Reprogram the prescaler; the oscillator is stopped while it changes
    pub async fn set_frequency(&mut self, hz: f32) -> Result<()> {
        let prescale = prescale_for(hz)?;
        let mode1 = self.regs.read_register(MODE1).await? & !MODE1_RESTART;

        self.regs
            .write_register(MODE1, mode1 | MODE1_SLEEP)
            .await?;
        self.regs.write_register(PRE_SCALE, prescale).await?;
        self.regs.write_register(MODE1, mode1).await?;
        delay_ms(1).await;
        self.regs
            .write_register(MODE1, mode1 | MODE1_RESTART)
            .await?;

        self.frequency_hz = frequency_for(prescale);
        crate::log_debug!("PCA9685: prescale {} ({} Hz)", prescale, self.frequency_hz);
        Ok(())
    }

    /// Raw on/off counter values (0..=4095)
    pub async fn set_channel(&mut self, channel: u8, on: u16, off: u16) -> Result<()> {
        let reg = channel_register(channel)?;
        if on >= STEPS || off >= STEPS {
            return Err(Error::InvalidArgument);
        }
        let [on_hi, on_lo] = on.to_be_bytes();
        let [off_hi, off_lo] = off.to_be_bytes();
        self.regs
            .write_registers(reg, &[on_lo, on_hi, off_lo, off_hi])
            .await
    }

    pub async fn set_duty(&mut self, channel: u8, fraction: f32) -> Result<()> {
        let reg = channel_register(channel)?;
        let value = duty_registers(fraction)?;
        self.regs.write_registers(reg, &value).await
    }

    pub async fn set_full_on(&mut self, channel: u8) -> Result<()> {
        let reg = channel_register(channel)?;
        self.regs.write_registers(reg, &[0, LED_FULL, 0, 0]).await
    }

    pub async fn set_full_off(&mut self, channel: u8) -> Result<()> {
        let reg = channel_register(channel)?;
        self.regs.write_registers(reg, &[0, 0, 0, LED_FULL]).await
    }

    /// Same duty cycle on every channel
    pub async fn set_all_duty(&mut self, fraction: f32) -> Result<()> {
        let value = duty_registers(fraction)?;
        self.regs.write_registers(ALL_LED_ON_L, &value).await
    }

    /// Stop the oscillator; outputs go off
    pub async fn sleep(&mut self) -> Result<()> {
        self.regs
            .update_register(MODE1, MODE1_SLEEP, MODE1_SLEEP)
            .await
    }

    /// Restart the oscillator and resume the previous duty cycles
    pub async fn wake(&mut self) -> Result<()> {
        let mode1 = self.regs.read_register(MODE1).await?;
        if mode1 & MODE1_SLEEP == 0 {
            return Ok(());
        }
        let awake = mode1 & !MODE1_SLEEP & !MODE1_RESTART;
        self.regs.write_register(MODE1, awake).await?;
        delay_ms(1).await;
        if mode1 & MODE1_RESTART != 0 {
            self.regs
                .write_register(MODE1, awake | MODE1_RESTART)
                .await?;
        }
        Ok(())
    }

    /// Drive the active-low OE line
    pub fn set_output_enable(&mut self, enabled: bool) -> Result<()> {
        if enabled {
            self.oe.set_low().map_err(Error::gpio)
        } else {
            self.oe.set_high().map_err(Error::gpio)
        }
    }
}
