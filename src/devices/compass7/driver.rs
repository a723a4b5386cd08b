//! MMC5603NJ I2C driver

use super::registers::*;
use super::{heading_degrees, raw_to_celsius, raw_to_microtesla, Compass7Config};
use crate::bus::{sequence, I2cRegisters, RegisterInterface, Step};
use crate::core::time::delay_ms;
use crate::platform::{Error, Result};
use embedded_hal_async::i2c::I2c;
use nalgebra::Vector3;

/// Compass 7 Click driver
pub struct Compass7<I2C> {
    regs: I2cRegisters<I2C>,
    config: Compass7Config,
    /// CTRL0 bits that must accompany every CTRL0 write
    ctrl0_base: u8,
}

impl<I2C> Compass7<I2C>
where
    I2C: I2c,
{
    pub fn new(i2c: I2C, config: Compass7Config) -> Self {
        Self {
            regs: I2cRegisters::new(i2c, config.address),
            config,
            ctrl0_base: if config.auto_set_reset {
                CTRL0_AUTO_SR_EN
            } else {
                0
            },
        }
    }

    pub fn release(self) -> I2C {
        self.regs.release()
    }

    pub async fn write_register(&mut self, reg: u8, value: u8) -> Result<()> {
        self.regs.write_register(reg, value).await
    }

    pub async fn read_register(&mut self, reg: u8) -> Result<u8> {
        self.regs.read_register(reg).await
    }

    /// Verify the product ID
    pub async fn check_id(&mut self) -> Result<()> {
        let id = self.regs.read_register(PRODUCT_ID).await?;
        if id != PRODUCT_ID_VALUE {
            crate::log_error!(
                "MMC5603 product ID mismatch: expected {:#x}, got {:#x}",
                PRODUCT_ID_VALUE,
                id
            );
            return Err(Error::DeviceIdMismatch {
                expected: u32::from(PRODUCT_ID_VALUE),
                found: u32::from(id),
            });
        }
        crate::log_info!("MMC5603 detected (ID: {:#x})", id);
        Ok(())
    }

    /// Software reset; registers return to power-on values
    pub async fn soft_reset(&mut self) -> Result<()> {
        self.regs
            .write_register(INTERNAL_CONTROL_1, CTRL1_SW_RESET)
            .await?;
        delay_ms(20).await;
        Ok(())
    }

    /// Bandwidth, auto SET/RESET, single-shot mode
    pub async fn default_config(&mut self) -> Result<()> {
        let steps = [
            Step::Write(INTERNAL_CONTROL_1, self.config.bandwidth.register_value()),
            Step::Write(INTERNAL_CONTROL_2, 0x00),
            Step::Write(ODR, 0x00),
            Step::Write(INTERNAL_CONTROL_0, self.ctrl0_base),
        ];
        sequence::apply(&mut self.regs, &steps).await
    }

    /// Magnetize the sensor in the SET direction
    pub async fn set(&mut self) -> Result<()> {
        self.regs
            .write_register(INTERNAL_CONTROL_0, self.ctrl0_base | CTRL0_DO_SET)
            .await?;
        delay_ms(1).await;
        Ok(())
    }

    /// Magnetize the sensor in the RESET direction
    pub async fn reset(&mut self) -> Result<()> {
        self.regs
            .write_register(INTERNAL_CONTROL_0, self.ctrl0_base | CTRL0_DO_RESET)
            .await?;
        delay_ms(1).await;
        Ok(())
    }

    async fn wait_status(&mut self, mask: u8) -> Result<()> {
        for _ in 0..self.config.timeout_ms {
            if self.regs.read_register(STATUS1).await? & mask != 0 {
                return Ok(());
            }
            delay_ms(1).await;
        }
        crate::log_warn!("MMC5603 measurement timeout (status mask {:#x})", mask);
        Err(Error::Timeout)
    }

    /// Trigger a magnetic measurement and wait for it to finish
    pub async fn take_measurement(&mut self) -> Result<()> {
        self.regs
            .write_register(INTERNAL_CONTROL_0, self.ctrl0_base | CTRL0_TAKE_MEAS_M)
            .await?;
        self.wait_status(STATUS1_MEAS_M_DONE).await
    }

    /// 20-bit axis values of the last measurement
    pub async fn read_raw(&mut self) -> Result<[u32; 3]> {
        let mut buf = [0u8; 9];
        self.regs.read_registers(XOUT0, &mut buf).await?;

        let axis = |hi: u8, mid: u8, lo: u8| {
            (u32::from(hi) << 12) | (u32::from(mid) << 4) | (u32::from(lo) >> 4)
        };
        Ok([
            axis(buf[0], buf[1], buf[6]),
            axis(buf[2], buf[3], buf[7]),
            axis(buf[4], buf[5], buf[8]),
        ])
    }

    /// Measure and return the field in µT
    pub async fn read_magnetic_flux(&mut self) -> Result<Vector3<f32>> {
        if !self.is_continuous().await? {
            self.take_measurement().await?;
        }
        let [x, y, z] = self.read_raw().await?;
        Ok(Vector3::new(
            raw_to_microtesla(x),
            raw_to_microtesla(y),
            raw_to_microtesla(z),
        ))
    }

    /// Measure the die temperature in °C
    pub async fn read_temperature(&mut self) -> Result<f32> {
        self.regs
            .write_register(INTERNAL_CONTROL_0, self.ctrl0_base | CTRL0_TAKE_MEAS_T)
            .await?;
        self.wait_status(STATUS1_MEAS_T_DONE).await?;
        let raw = self.regs.read_register(TOUT).await?;
        Ok(raw_to_celsius(raw))
    }

    /// Set the continuous-mode rate in Hz (1..=255) and latch it
    pub async fn set_output_data_rate(&mut self, hz: u8) -> Result<()> {
        if hz == 0 {
            return Err(Error::InvalidArgument);
        }
        self.regs.write_register(ODR, hz).await?;
        // CMM_FREQ_EN makes the chip compute the measurement period
        self.regs
            .write_register(INTERNAL_CONTROL_0, self.ctrl0_base | CTRL0_CMM_FREQ_EN)
            .await
    }

    /// Start continuous measurements at the programmed rate
    pub async fn start_continuous(&mut self) -> Result<()> {
        self.regs
            .update_register(INTERNAL_CONTROL_2, CTRL2_CMM_EN, CTRL2_CMM_EN)
            .await
    }

    /// Return to single-shot mode
    pub async fn stop_continuous(&mut self) -> Result<()> {
        self.regs
            .update_register(INTERNAL_CONTROL_2, CTRL2_CMM_EN, 0)
            .await
    }

    async fn is_continuous(&mut self) -> Result<bool> {
        Ok(self.regs.read_register(INTERNAL_CONTROL_2).await? & CTRL2_CMM_EN != 0)
    }

    /// Heading in degrees from the X/Y field, board held level
    pub async fn heading(&mut self) -> Result<f32> {
        let field = self.read_magnetic_flux().await?;
        Ok(heading_degrees(field.x, field.y))
    }
}
