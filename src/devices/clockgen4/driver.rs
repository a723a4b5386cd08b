//! CDCE6214 driver

use super::interface::ClockInterface;
use super::registers::*;
use super::{
    compute_dividers, Channel, ClockGen4Config, OutputFormat, PllDividers, ReferenceInput,
    OUT_DIV_MAX, REF_DIV_MAX,
};
use crate::bus::{sequence, Step};
use crate::core::time::delay_ms;
use crate::platform::{Error, Result};

/// Clock Gen 4 Click driver
pub struct ClockGen4<IF> {
    iface: IF,
    config: ClockGen4Config,
    pll: Option<PllDividers>,
}

impl<IF> ClockGen4<IF>
where
    IF: ClockInterface,
{
    pub fn new(iface: IF, config: ClockGen4Config) -> Self {
        Self {
            iface,
            config,
            pll: None,
        }
    }

    pub fn release(self) -> IF {
        self.iface
    }

    /// Dividers last written with `set_pll`
    pub fn pll(&self) -> Option<PllDividers> {
        self.pll
    }

    fn pfd_hz(&self) -> u32 {
        self.config.reference_hz / u32::from(self.config.ref_divider.max(1))
    }

    pub async fn check_id(&mut self) -> Result<()> {
        let id = self.iface.read_reg(DEVICE_ID).await?;
        if id != DEVICE_ID_VALUE {
            crate::log_error!("CDCE6214 ID mismatch: {:#06x}", id);
            return Err(Error::DeviceIdMismatch {
                expected: u32::from(DEVICE_ID_VALUE),
                found: u32::from(id),
            });
        }
        Ok(())
    }

    pub async fn soft_reset(&mut self) -> Result<()> {
        self.iface
            .update_reg(DEVICE_CONTROL, CTRL_SOFT_RESET, CTRL_SOFT_RESET)
            .await?;
        delay_ms(10).await;
        self.pll = None;
        Ok(())
    }

    /// Reference path from the config, every output off
    pub async fn default_config(&mut self) -> Result<()> {
        let ref_value = self.config.input.bits()
            | ((u16::from(self.config.ref_divider) << REF_DIV_SHIFT) & REF_DIV_MASK);
        let steps = [
            Step::Update {
                reg: REF_CONFIG,
                mask: REF_INPUT_MASK | REF_DIV_MASK,
                value: ref_value,
            },
            Step::Write(out_format(0), 0),
            Step::Write(out_format(1), 0),
            Step::Write(out_format(2), 0),
            Step::Write(out_format(3), 0),
        ];
        sequence::apply(&mut self.iface, &steps).await
    }

    /// Select the reference input and its divider (1..=7)
    pub async fn set_reference(&mut self, input: ReferenceInput, divider: u8) -> Result<()> {
        if divider == 0 || divider > REF_DIV_MAX {
            return Err(Error::InvalidArgument);
        }
        let value = input.bits() | (u16::from(divider) << REF_DIV_SHIFT);
        self.iface
            .update_reg(REF_CONFIG, REF_INPUT_MASK | REF_DIV_MASK, value)
            .await?;
        self.config.input = input;
        self.config.ref_divider = divider;
        Ok(())
    }

    /// Program the feedback divider and prescaler
    pub async fn set_pll(&mut self, dividers: &PllDividers) -> Result<()> {
        self.iface.write_reg(PLL_NDIV_INT, dividers.n_int).await?;
        self.iface
            .write_reg(PLL_NDIV_FRAC_LO, (dividers.n_frac & 0xFFFF) as u16)
            .await?;
        self.iface
            .write_reg(PLL_NDIV_FRAC_HI, ((dividers.n_frac >> 16) & 0xFF) as u16)
            .await?;
        self.iface
            .write_reg(PLL_PRESCALER, u16::from(dividers.prescaler))
            .await?;
        self.pll = Some(*dividers);
        Ok(())
    }

    pub async fn set_output_divider(&mut self, channel: Channel, divider: u16) -> Result<()> {
        if divider == 0 || divider > OUT_DIV_MAX {
            return Err(Error::InvalidArgument);
        }
        self.iface.write_reg(out_div(channel.index()), divider).await
    }

    /// Drive `channel` at `hz`
    ///
    /// The first call sizes the PLL and recalibrates it; later calls must
    /// divide the running VCO exactly.
    pub async fn set_frequency(&mut self, channel: Channel, hz: u32) -> Result<()> {
        if hz == 0 {
            return Err(Error::InvalidArgument);
        }
        let divider = match self.pll {
            Some(pll) => {
                let step = u64::from(pll.prescaler) * u64::from(hz);
                if pll.vco_hz % step != 0 {
                    crate::log_warn!("CDCE6214: {} Hz not reachable from current VCO", hz);
                    return Err(Error::InvalidArgument);
                }
                u16::try_from(pll.vco_hz / step).map_err(|_| Error::InvalidArgument)?
            }
            None => {
                let dividers = compute_dividers(self.pfd_hz(), hz)?;
                self.set_pll(&dividers).await?;
                self.calibrate().await?;
                dividers.out_div
            }
        };
        self.set_output_divider(channel, divider).await
    }

    pub async fn enable_output(&mut self, channel: Channel, format: OutputFormat) -> Result<()> {
        let value = (format.bits() << OUT_FORMAT_SHIFT) | OUT_ENABLE;
        self.iface
            .update_reg(out_format(channel.index()), OUT_FORMAT_MASK | OUT_ENABLE, value)
            .await
    }

    pub async fn disable_output(&mut self, channel: Channel) -> Result<()> {
        self.iface
            .update_reg(out_format(channel.index()), OUT_ENABLE, 0)
            .await
    }

    /// Recalibrate the VCO and wait for lock
    pub async fn calibrate(&mut self) -> Result<()> {
        self.iface
            .update_reg(DEVICE_CONTROL, CTRL_RECAL, CTRL_RECAL)
            .await?;
        self.iface.update_reg(DEVICE_CONTROL, CTRL_RECAL, 0).await?;

        for _ in 0..self.config.lock_timeout_ms {
            if self.is_pll_locked().await? {
                return Ok(());
            }
            delay_ms(1).await;
        }
        crate::log_warn!("CDCE6214: PLL did not lock");
        Err(Error::Timeout)
    }

    pub async fn is_pll_locked(&mut self) -> Result<bool> {
        Ok(self.iface.read_reg(DEVICE_STATUS).await? & STATUS_PLL_LOCK != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::clockgen4::interface::{ClockI2c, I2C_ADDRESS};
    use crate::platform::mock::MockI2c;

    fn driver(i2c: &MockI2c) -> ClockGen4<ClockI2c<MockI2c>> {
        ClockGen4::new(
            ClockI2c::new(i2c.clone(), I2C_ADDRESS),
            ClockGen4Config::default(),
        )
    }

    #[tokio::test]
    async fn test_check_id() {
        let i2c = MockI2c::new();
        i2c.set_read_data(&[0x62, 0x14, 0x00, 0x01]);
        let mut clk = driver(&i2c);

        clk.check_id().await.unwrap();
        assert!(matches!(
            clk.check_id().await,
            Err(Error::DeviceIdMismatch { found: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_default_config_is_repeatable() {
        let i2c = MockI2c::new();
        let mut clk = driver(&i2c);

        // REF_CONFIG reads back zero first, then the programmed value
        i2c.set_read_data(&[0x00, 0x00]);
        clk.default_config().await.unwrap();
        let first = i2c.written();
        assert!(first.contains(&vec![0x00, 0x19, 0x00, 0x04]));

        i2c.clear_transactions();
        i2c.set_read_data(&[0x00, 0x04]);
        clk.default_config().await.unwrap();
        let second = i2c.written();

        assert_eq!(second.len(), first.len() - 1);
        assert_eq!(first[2..], second[1..]);
    }

    #[tokio::test]
    async fn test_set_frequency_programs_pll_and_divider() {
        let i2c = MockI2c::new();
        // DEVICE_CONTROL twice for RECAL set/clear, then a locked status
        i2c.set_read_data(&[0x00, 0x00, 0x00, 0x10, 0x00, 0x08]);
        let mut clk = driver(&i2c);

        clk.set_frequency(Channel::Out2, 100_000_000).await.unwrap();

        let written = i2c.written();
        assert_eq!(written[0], vec![0x00, 0x1E, 0x00, 96]);
        assert_eq!(written[3], vec![0x00, 0x30, 0x00, 4]);
        assert_eq!(written.last(), Some(&vec![0x00, 0x3E, 0x00, 6]));

        // Same VCO, half the frequency on another channel
        i2c.clear_transactions();
        clk.set_frequency(Channel::Out1, 50_000_000).await.unwrap();
        assert_eq!(i2c.written(), vec![vec![0x00, 0x38, 0x00, 12]]);

        // 2.4 GHz / 4 is not a multiple of 7 MHz
        assert_eq!(
            clk.set_frequency(Channel::Out1, 7_000_000).await,
            Err(Error::InvalidArgument)
        );
    }

    #[tokio::test]
    async fn test_calibrate_timeout() {
        let i2c = MockI2c::new();
        let mut clk = driver(&i2c);

        assert_eq!(clk.calibrate().await, Err(Error::Timeout));
    }

    #[tokio::test]
    async fn test_enable_and_disable_output() {
        let i2c = MockI2c::new();
        i2c.set_read_data(&[0x00, 0x00, 0x00, 0x05]);
        let mut clk = driver(&i2c);

        clk.enable_output(Channel::Out3, OutputFormat::Hcsl).await.unwrap();
        clk.disable_output(Channel::Out3).await.unwrap();

        let written = i2c.written();
        assert_eq!(written[1], vec![0x00, 0x45, 0x00, 0x03]);
        assert_eq!(written[3], vec![0x00, 0x45, 0x00, 0x04]);
    }

    #[tokio::test]
    async fn test_set_reference_bounds() {
        let i2c = MockI2c::new();
        let mut clk = driver(&i2c);

        assert_eq!(
            clk.set_reference(ReferenceInput::Lvcmos, 0).await,
            Err(Error::InvalidArgument)
        );
        assert_eq!(
            clk.set_reference(ReferenceInput::Lvcmos, 8).await,
            Err(Error::InvalidArgument)
        );
        assert!(i2c.transactions().is_empty());
    }
}
