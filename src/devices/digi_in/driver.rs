//! MAX22190 SPI driver

use super::registers::*;
use super::{DigiInConfig, Fault1, Fault2, FilterConfig, FrameStatus};
use crate::bus::sequence::{self, ConfigureTarget, Step};
use crate::communication::crc::crc5;
use crate::platform::{Error, Result};
use embedded_hal_async::spi::{Operation, SpiDevice};

/// All inputs on, 1.6 ms filter with wire-break detection
const DEFAULT_SEQUENCE: &[Step] = &[
    Step::Write(IN_EN, 0xFF),
    Step::Write(filter_register(0), 0x14),
    Step::Write(filter_register(1), 0x14),
    Step::Write(filter_register(2), 0x14),
    Step::Write(filter_register(3), 0x14),
    Step::Write(filter_register(4), 0x14),
    Step::Write(filter_register(5), 0x14),
    Step::Write(filter_register(6), 0x14),
    Step::Write(filter_register(7), 0x14),
    Step::Write(FAULT1EN, 0x3F),
];

/// DIGI IN Click driver
pub struct DigiIn<SPI> {
    spi: SPI,
    config: DigiInConfig,
    /// Input states from the first byte of the last frame
    inputs: u8,
    /// Status bits of the last CRC frame
    status: FrameStatus,
}

impl<SPI> DigiIn<SPI>
where
    SPI: SpiDevice,
{
    pub fn new(spi: SPI, config: DigiInConfig) -> Self {
        Self {
            spi,
            config,
            inputs: 0,
            status: FrameStatus::empty(),
        }
    }

    pub fn release(self) -> SPI {
        self.spi
    }

    /// Enable or disable CRC framing (follow the board's CRC jumper)
    pub fn set_crc_enabled(&mut self, enabled: bool) {
        self.config.crc_enabled = enabled;
    }

    /// Status bits reported with the last frame
    pub fn last_status(&self) -> FrameStatus {
        self.status
    }

    /// Input states reported with the last frame
    pub fn last_inputs(&self) -> u8 {
        self.inputs
    }

    /// One SPI frame; returns the data byte of the response
    async fn transfer(&mut self, command: u8, data: u8) -> Result<u8> {
        if self.config.crc_enabled {
            let mut frame = [command, data, 0];
            frame[2] = crc5(frame);
            self.spi
                .transaction(&mut [Operation::TransferInPlace(&mut frame)])
                .await
                .map_err(Error::spi)?;

            if crc5(frame) != frame[2] & 0x1F {
                crate::log_warn!("MAX22190: CRC mismatch on response to {:#x}", command);
                return Err(Error::Crc);
            }
            self.inputs = frame[0];
            self.status = FrameStatus::from_bits_truncate(frame[2]);
            Ok(frame[1])
        } else {
            let mut frame = [command, data];
            self.spi
                .transaction(&mut [Operation::TransferInPlace(&mut frame)])
                .await
                .map_err(Error::spi)?;
            self.inputs = frame[0];
            Ok(frame[1])
        }
    }

    /// Write one register
    pub async fn write_register(&mut self, reg: u8, value: u8) -> Result<()> {
        self.transfer(WRITE_BIT | (reg & ADDRESS_MASK), value)
            .await
            .map(|_| ())
    }

    /// Read one register
    pub async fn read_register(&mut self, reg: u8) -> Result<u8> {
        self.transfer(reg & ADDRESS_MASK, 0x00).await
    }

    /// Debounced input states, bit n = input n+1
    pub async fn get_inputs(&mut self) -> Result<u8> {
        self.read_register(DI).await
    }

    /// Wire-break flags, bit n = input n+1
    pub async fn get_wire_break(&mut self) -> Result<u8> {
        self.read_register(WB).await
    }

    /// Read (and clear) FAULT1
    pub async fn get_fault1(&mut self) -> Result<Fault1> {
        self.read_register(FAULT1)
            .await
            .map(Fault1::from_bits_truncate)
    }

    /// Read (and clear) FAULT2
    pub async fn get_fault2(&mut self) -> Result<Fault2> {
        self.read_register(FAULT2)
            .await
            .map(Fault2::from_bits_truncate)
    }

    /// Clear both fault registers
    pub async fn clear_faults(&mut self) -> Result<()> {
        self.get_fault1().await?;
        self.get_fault2().await?;
        Ok(())
    }

    /// Enable the inputs selected by `mask`, disabling the rest
    pub async fn enable_inputs(&mut self, mask: u8) -> Result<()> {
        self.write_register(IN_EN, mask).await
    }

    /// Configure the filter of `channel` (0..=7)
    pub async fn set_filter(&mut self, channel: u8, filter: FilterConfig) -> Result<()> {
        if channel >= CHANNEL_COUNT {
            return Err(Error::InvalidArgument);
        }
        self.write_register(filter_register(channel), filter.register_value())
            .await
    }

    /// All inputs enabled, 1.6 ms filters, wire-break detection on
    pub async fn default_config(&mut self) -> Result<()> {
        sequence::apply(self, DEFAULT_SEQUENCE).await
    }
}

impl<SPI> ConfigureTarget<u8, u8> for DigiIn<SPI>
where
    SPI: SpiDevice,
{
    async fn write_step(&mut self, reg: u8, value: u8) -> Result<()> {
        self.write_register(reg, value).await
    }

    async fn update_step(&mut self, reg: u8, mask: u8, value: u8) -> Result<()> {
        let current = self.read_register(reg).await?;
        self.write_register(reg, (current & !mask) | (value & mask))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockSpi;

    /// Response frame with a valid CRC
    fn response(inputs: u8, data: u8, status: u8) -> [u8; 3] {
        let mut frame = [inputs, data, status & 0xE0];
        frame[2] |= crc5(frame);
        frame
    }

    #[tokio::test]
    async fn test_write_frame_carries_crc() {
        let spi = MockSpi::new();
        spi.set_read_data(&response(0, 0, 0));
        let mut digi = DigiIn::new(spi.clone(), DigiInConfig::default());

        digi.write_register(IN_EN, 0x0F).await.unwrap();

        let frame = &spi.written_frames()[0];
        assert_eq!(frame[0], 0x80 | IN_EN);
        assert_eq!(frame[1], 0x0F);
        assert_eq!(frame[2], crc5([0x80 | IN_EN, 0x0F, 0]));
    }

    #[tokio::test]
    async fn test_read_inputs_and_status() {
        let spi = MockSpi::new();
        spi.set_read_data(&response(0xA5, 0xA5, 0x80));
        let mut digi = DigiIn::new(spi.clone(), DigiInConfig::default());

        assert_eq!(digi.get_inputs().await.unwrap(), 0xA5);
        assert_eq!(digi.last_inputs(), 0xA5);
        assert!(digi.last_status().contains(FrameStatus::WIRE_BREAK));
    }

    #[tokio::test]
    async fn test_response_crc_error() {
        let spi = MockSpi::new();
        let mut frame = response(0x01, 0x02, 0x00);
        frame[1] ^= 0x10;
        spi.set_read_data(&frame);
        let mut digi = DigiIn::new(spi, DigiInConfig::default());

        assert_eq!(digi.read_register(DI).await, Err(Error::Crc));
    }

    #[tokio::test]
    async fn test_without_crc_two_byte_frames() {
        let spi = MockSpi::new();
        spi.set_read_data(&[0x00, 0x3C]);
        let mut digi = DigiIn::new(spi.clone(), DigiInConfig { crc_enabled: false });

        assert_eq!(digi.get_wire_break().await.unwrap(), 0x3C);
        assert_eq!(spi.written_frames(), vec![vec![WB, 0x00]]);
    }

    #[tokio::test]
    async fn test_faults_decode() {
        let spi = MockSpi::new();
        spi.set_read_data(&response(0, 0x41, 0));
        spi.push_read_data(&response(0, 0x10, 0));
        let mut digi = DigiIn::new(spi, DigiInConfig::default());

        assert_eq!(
            digi.get_fault1().await.unwrap(),
            Fault1::WIRE_BREAK | Fault1::POWER_ON_RESET
        );
        assert_eq!(digi.get_fault2().await.unwrap(), Fault2::OVERTEMPERATURE);
    }

    #[tokio::test]
    async fn test_set_filter_channel_bounds() {
        let spi = MockSpi::new();
        let mut digi = DigiIn::new(spi.clone(), DigiInConfig { crc_enabled: false });

        assert_eq!(
            digi.set_filter(8, FilterConfig::default()).await,
            Err(Error::InvalidArgument)
        );
        digi.set_filter(7, FilterConfig::default()).await.unwrap();
        assert_eq!(spi.written_frames(), vec![vec![0x80 | 0x14, 0x04]]);
    }

    #[tokio::test]
    async fn test_default_config_idempotent() {
        let spi = MockSpi::new();
        let mut digi = DigiIn::new(spi.clone(), DigiInConfig { crc_enabled: false });

        digi.default_config().await.unwrap();
        let first = spi.written_frames();
        spi.clear_transactions();
        digi.default_config().await.unwrap();

        assert_eq!(first.len(), DEFAULT_SEQUENCE.len());
        assert_eq!(spi.written_frames(), first);
    }

    #[tokio::test]
    async fn test_default_config_stops_on_crc_error() {
        let spi = MockSpi::new();
        // First response is all zero: CRC field 0 never matches
        let mut digi = DigiIn::new(spi.clone(), DigiInConfig::default());

        assert_eq!(digi.default_config().await, Err(Error::Crc));
        assert_eq!(spi.transactions().len(), 1);
    }
}
