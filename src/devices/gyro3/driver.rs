//! I3G4250D driver over any register bus

use super::registers::*;
use super::{raw_to_dps, DataRate, FullScale, Gyro3Config, HighPass, InterruptConfig, InterruptSource};
use crate::bus::{sequence, I2cRegisters, RegisterInterface, SpiFraming, SpiRegisters, Step};
use crate::platform::{Error, Result};
use embedded_hal_async::i2c::I2c;
use embedded_hal_async::spi::SpiDevice;
use nalgebra::Vector3;

/// Gyro 3 Click driver
pub struct Gyro3<REG> {
    regs: REG,
    config: Gyro3Config,
}

impl<I2C: I2c> Gyro3<I2cRegisters<I2C>> {
    /// Gyroscope on I2C at `address` (0x68 or 0x69)
    pub fn new_i2c(i2c: I2C, address: u8, config: Gyro3Config) -> Self {
        let regs = I2cRegisters::new(i2c, address).with_auto_increment(I2C_AUTO_INCREMENT);
        Self::new(regs, config)
    }
}

impl<SPI: SpiDevice> Gyro3<SpiRegisters<SPI>> {
    /// Gyroscope on SPI
    pub fn new_spi(spi: SPI, config: Gyro3Config) -> Self {
        Self::new(SpiRegisters::new(spi, SpiFraming::READ_MSB_MULTI_BIT6), config)
    }
}

impl<REG> Gyro3<REG>
where
    REG: RegisterInterface,
{
    pub fn new(regs: REG, config: Gyro3Config) -> Self {
        Self { regs, config }
    }

    pub fn release(self) -> REG {
        self.regs
    }

    pub fn full_scale(&self) -> FullScale {
        self.config.full_scale
    }

    pub async fn check_id(&mut self) -> Result<()> {
        let id = self.regs.read_register(WHO_AM_I).await?;
        if id != WHO_AM_I_VALUE {
            crate::log_error!("I3G4250D WHO_AM_I mismatch: {:#x}", id);
            return Err(Error::DeviceIdMismatch {
                expected: u32::from(WHO_AM_I_VALUE),
                found: u32::from(id),
            });
        }
        Ok(())
    }

    /// Power on all three axes at the configured rate and range
    pub async fn default_config(&mut self) -> Result<()> {
        let steps = [
            Step::Write(CTRL_REG2, 0x00),
            Step::Write(CTRL_REG3, CTRL3_I2_DRDY),
            Step::Write(CTRL_REG4, self.config.full_scale.bits()),
            Step::Write(CTRL_REG5, 0x00),
            Step::Write(
                CTRL_REG1,
                self.config.data_rate.bits() | CTRL1_PD | CTRL1_XYZ_EN,
            ),
        ];
        sequence::apply(&mut self.regs, &steps).await
    }

    pub async fn set_data_rate(&mut self, rate: DataRate) -> Result<()> {
        self.regs
            .update_register(CTRL_REG1, CTRL1_DR_MASK | CTRL1_BW_MASK, rate.bits())
            .await?;
        self.config.data_rate = rate;
        Ok(())
    }

    pub async fn set_full_scale(&mut self, full_scale: FullScale) -> Result<()> {
        self.regs
            .update_register(CTRL_REG4, CTRL4_FS_MASK, full_scale.bits())
            .await?;
        self.config.full_scale = full_scale;
        Ok(())
    }

    pub async fn power_down(&mut self) -> Result<()> {
        self.regs.update_register(CTRL_REG1, CTRL1_PD, 0).await
    }

    /// New X/Y/Z sample available
    pub async fn data_ready(&mut self) -> Result<bool> {
        Ok(self.regs.read_register(STATUS_REG).await? & STATUS_ZYXDA != 0)
    }

    /// Raw X, Y, Z samples (little-endian pairs)
    pub async fn read_raw(&mut self) -> Result<[i16; 3]> {
        let mut buf = [0u8; 6];
        self.regs.read_registers(OUT_X_L, &mut buf).await?;
        Ok([
            i16::from_le_bytes([buf[0], buf[1]]),
            i16::from_le_bytes([buf[2], buf[3]]),
            i16::from_le_bytes([buf[4], buf[5]]),
        ])
    }

    /// Angular rate in degrees per second
    pub async fn read_angular_rate(&mut self) -> Result<Vector3<f32>> {
        let [x, y, z] = self.read_raw().await?;
        let fs = self.config.full_scale;
        Ok(Vector3::new(raw_to_dps(x, fs), raw_to_dps(y, fs), raw_to_dps(z, fs)))
    }

    /// Uncalibrated temperature byte (-1 LSB/°C)
    pub async fn read_temperature_raw(&mut self) -> Result<i8> {
        Ok(self.regs.read_register(OUT_TEMP).await? as i8)
    }

    /// Route the high-pass filter to the outputs, or bypass it with `None`
    pub async fn set_high_pass(&mut self, filter: Option<HighPass>) -> Result<()> {
        match filter {
            Some(hp) => {
                self.regs.write_register(CTRL_REG2, hp.register_value()).await?;
                self.regs
                    .update_register(
                        CTRL_REG5,
                        CTRL5_HP_EN | CTRL5_OUT_SEL_MASK,
                        CTRL5_HP_EN | CTRL5_OUT_SEL_HPF,
                    )
                    .await
            }
            None => {
                self.regs
                    .update_register(CTRL_REG5, CTRL5_HP_EN | CTRL5_OUT_SEL_MASK, 0)
                    .await
            }
        }
    }

    /// Program the INT1 threshold generator and route it to the INT1 pin
    pub async fn configure_interrupt(&mut self, config: &InterruptConfig) -> Result<()> {
        if config.threshold.iter().any(|&t| t > 0x7FFF) || config.duration > 0x7F {
            return Err(Error::InvalidArgument);
        }

        let mut ths = [0u8; 6];
        for (chunk, &t) in ths.chunks_exact_mut(2).zip(config.threshold.iter()) {
            chunk.copy_from_slice(&t.to_be_bytes());
        }
        self.regs.write_registers(INT1_THS_XH, &ths).await?;

        let wait = if config.wait { 0x80 } else { 0x00 };
        self.regs
            .write_register(INT1_DURATION, wait | config.duration)
            .await?;
        self.regs
            .write_register(INT1_CFG, config.enable.bits())
            .await?;

        let route = if config.enable.is_empty() { 0 } else { CTRL3_I1_INT1 };
        self.regs
            .update_register(CTRL_REG3, CTRL3_I1_INT1, route)
            .await
    }

    /// Read (and, when latched, clear) INT1_SRC
    pub async fn read_interrupt_source(&mut self) -> Result<InterruptSource> {
        let src = self.regs.read_register(INT1_SRC).await?;
        Ok(InterruptSource::from_bits_truncate(src))
    }
}

#[cfg(test)]
mod tests {
    use super::super::InterruptEnable;
    use super::*;
    use crate::platform::mock::{MockI2c, MockSpi};

    #[tokio::test]
    async fn test_check_id_i2c() {
        let i2c = MockI2c::new();
        i2c.set_read_data(&[WHO_AM_I_VALUE]);
        let mut gyro = Gyro3::new_i2c(i2c.clone(), I2C_ADDRESS_SDO_LOW, Gyro3Config::default());

        gyro.check_id().await.unwrap();
        assert_eq!(i2c.written(), vec![vec![WHO_AM_I]]);

        i2c.set_read_data(&[0xD4]);
        assert_eq!(
            gyro.check_id().await,
            Err(Error::DeviceIdMismatch {
                expected: 0xD3,
                found: 0xD4
            })
        );
    }

    #[tokio::test]
    async fn test_default_config_is_repeatable() {
        let i2c = MockI2c::new();
        let config = Gyro3Config {
            data_rate: DataRate::Hz400,
            full_scale: FullScale::Dps500,
        };
        let mut gyro = Gyro3::new_i2c(i2c.clone(), I2C_ADDRESS_SDO_HIGH, config);

        gyro.default_config().await.unwrap();
        let first = i2c.written();
        i2c.clear_transactions();
        gyro.default_config().await.unwrap();

        assert_eq!(i2c.written(), first);
        assert_eq!(first.last(), Some(&vec![CTRL_REG1, 0x8F]));
        assert!(first.contains(&vec![CTRL_REG4, 0x10]));
    }

    #[tokio::test]
    async fn test_read_angular_rate_i2c_auto_increment() {
        let i2c = MockI2c::new();
        // X = 1000, Y = -1000, Z = 0
        i2c.set_read_data(&[0xE8, 0x03, 0x18, 0xFC, 0x00, 0x00]);
        let mut gyro = Gyro3::new_i2c(i2c.clone(), I2C_ADDRESS_SDO_LOW, Gyro3Config::default());

        let rate = gyro.read_angular_rate().await.unwrap();

        assert_eq!(i2c.written(), vec![vec![OUT_X_L | 0x80]]);
        assert!((rate.x - 8.75).abs() < 1e-4);
        assert!((rate.y + 8.75).abs() < 1e-4);
        assert_eq!(rate.z, 0.0);
    }

    #[tokio::test]
    async fn test_read_raw_spi_framing() {
        let spi = MockSpi::new();
        spi.set_read_data(&[0x01, 0x00, 0x02, 0x00, 0x03, 0x00]);
        let mut gyro = Gyro3::new_spi(spi.clone(), Gyro3Config::default());

        assert_eq!(gyro.read_raw().await.unwrap(), [1, 2, 3]);
        assert_eq!(spi.written_frames(), vec![vec![OUT_X_L | 0xC0]]);
    }

    #[tokio::test]
    async fn test_set_full_scale_updates_sensitivity() {
        let i2c = MockI2c::new();
        i2c.set_read_data(&[0x00]);
        let mut gyro = Gyro3::new_i2c(i2c.clone(), I2C_ADDRESS_SDO_LOW, Gyro3Config::default());

        gyro.set_full_scale(FullScale::Dps2000).await.unwrap();

        assert_eq!(gyro.full_scale(), FullScale::Dps2000);
        assert_eq!(i2c.written().last(), Some(&vec![CTRL_REG4, 0x20]));
    }

    #[tokio::test]
    async fn test_data_ready() {
        let i2c = MockI2c::new();
        i2c.set_read_data(&[STATUS_ZYXDA, 0x00]);
        let mut gyro = Gyro3::new_i2c(i2c, I2C_ADDRESS_SDO_LOW, Gyro3Config::default());

        assert!(gyro.data_ready().await.unwrap());
        assert!(!gyro.data_ready().await.unwrap());
    }

    #[tokio::test]
    async fn test_configure_interrupt() {
        let i2c = MockI2c::new();
        i2c.set_read_data(&[0x08]);
        let mut gyro = Gyro3::new_i2c(i2c.clone(), I2C_ADDRESS_SDO_LOW, Gyro3Config::default());

        let config = InterruptConfig {
            enable: InterruptEnable::X_HIGH | InterruptEnable::LATCH,
            threshold: [0x1234, 0, 0x7FFF],
            duration: 5,
            wait: true,
        };
        gyro.configure_interrupt(&config).await.unwrap();

        let written = i2c.written();
        assert_eq!(
            written[0],
            vec![INT1_THS_XH | 0x80, 0x12, 0x34, 0x00, 0x00, 0x7F, 0xFF]
        );
        assert_eq!(written[1], vec![INT1_DURATION, 0x85]);
        assert_eq!(written[2], vec![INT1_CFG, 0x42]);
        assert_eq!(written.last(), Some(&vec![CTRL_REG3, 0x88]));
    }

    #[tokio::test]
    async fn test_configure_interrupt_rejects_out_of_range() {
        let i2c = MockI2c::new();
        let mut gyro = Gyro3::new_i2c(i2c.clone(), I2C_ADDRESS_SDO_LOW, Gyro3Config::default());

        let config = InterruptConfig {
            enable: InterruptEnable::X_HIGH,
            threshold: [0x8000, 0, 0],
            duration: 0,
            wait: false,
        };
        assert_eq!(gyro.configure_interrupt(&config).await, Err(Error::InvalidArgument));
        assert!(i2c.transactions().is_empty());
    }

    #[tokio::test]
    async fn test_read_interrupt_source() {
        let i2c = MockI2c::new();
        i2c.set_read_data(&[0x42]);
        let mut gyro = Gyro3::new_i2c(i2c, I2C_ADDRESS_SDO_LOW, Gyro3Config::default());

        assert_eq!(
            gyro.read_interrupt_source().await.unwrap(),
            InterruptSource::ACTIVE | InterruptSource::X_HIGH
        );
    }
}
