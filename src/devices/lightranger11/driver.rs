//! VL53L7CX driver

use super::registers::*;
use super::*;
use crate::bus::{sequence, ConfigureTarget};
use crate::core::time::delay_ms;
use crate::platform::{Error, Result};
use embedded_hal_async::i2c::{I2c, Operation};

/// Largest DCI payload handled
const DCI_MAX: usize = 64;
/// DCI header and footer around the payload
const DCI_OVERHEAD: usize = 12;

/// Mailbox answer: status byte 1 reads 0x03 when the command completed
const CMD_DONE: u8 = 0x03;

/// LightRanger 11 Click driver
pub struct LightRanger11<I2C> {
    i2c: I2C,
    config: LightRanger11Config,
    resolution: Resolution,
    /// Last frame counter seen by `check_data_ready`
    stream_count: u8,
    /// Firmware downloaded and running
    booted: bool,
}

impl<I2C> LightRanger11<I2C>
where
    I2C: I2c,
{
    pub fn new(i2c: I2C, config: LightRanger11Config) -> Self {
        Self {
            i2c,
            config,
            resolution: Resolution::default(),
            stream_count: 0xFF,
            booted: false,
        }
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    // =========================================================================
    // Register access
    // =========================================================================

    pub async fn write_multi(&mut self, reg: u16, data: &[u8]) -> Result<()> {
        self.i2c
            .transaction(
                self.config.address,
                &mut [Operation::Write(&reg.to_be_bytes()), Operation::Write(data)],
            )
            .await
            .map_err(Error::i2c)
    }

    pub async fn read_multi(&mut self, reg: u16, buf: &mut [u8]) -> Result<()> {
        self.i2c
            .write_read(self.config.address, &reg.to_be_bytes(), buf)
            .await
            .map_err(Error::i2c)
    }

    pub async fn write_byte(&mut self, reg: u16, value: u8) -> Result<()> {
        self.write_multi(reg, &[value]).await
    }

    pub async fn read_byte(&mut self, reg: u16) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_multi(reg, &mut buf).await?;
        Ok(buf[0])
    }

    fn ensure_booted(&self) -> Result<()> {
        if self.booted {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }

    async fn set_page(&mut self, page: u8) -> Result<()> {
        self.write_byte(PAGE_SELECT, page).await
    }

    /// Poll `reg` until `(byte[pos] & mask) == expected`
    async fn poll_for_answer(
        &mut self,
        size: usize,
        pos: usize,
        reg: u16,
        mask: u8,
        expected: u8,
    ) -> Result<()> {
        let mut buf = [0u8; 4];
        let buf = buf.get_mut(..size).ok_or(Error::InvalidArgument)?;
        for _ in 0..self.config.timeout_ms {
            self.read_multi(reg, buf).await?;
            if size >= 4 && buf[2] >= 0x7F {
                crate::log_error!("VL53L7CX: MCU error {:#x}", buf[2]);
                return Err(Error::Status(u16::from(buf[2])));
            }
            if buf[pos] & mask == expected {
                return Ok(());
            }
            delay_ms(1).await;
        }
        crate::log_warn!("VL53L7CX: no answer at {:#x}", reg);
        Err(Error::Timeout)
    }

    // =========================================================================
    // DCI
    // =========================================================================

    /// Read `data.len()` bytes of the firmware setting at `index`
    pub async fn dci_read(&mut self, index: u16, data: &mut [u8]) -> Result<()> {
        self.ensure_booted()?;
        let size = data.len();
        if size > DCI_MAX || size % 4 != 0 {
            return Err(Error::InvalidArgument);
        }
        let [i1, i0] = index.to_be_bytes();
        let cmd = [
            i1,
            i0,
            ((size & 0xFF0) >> 4) as u8,
            ((size & 0x0F) << 4) as u8,
            0x00,
            0x00,
            0x00,
            0x0F,
            0x00,
            0x02,
            0x00,
            0x08,
        ];
        self.write_multi(UI_CMD_END - 11, &cmd).await?;
        self.poll_for_answer(4, 1, UI_CMD_STATUS, 0xFF, CMD_DONE)
            .await?;

        let mut buf = [0u8; DCI_MAX + DCI_OVERHEAD];
        let buf = &mut buf[..size + DCI_OVERHEAD];
        self.read_multi(UI_CMD_START, buf).await?;
        swap_words(buf);
        data.copy_from_slice(&buf[4..4 + size]);
        Ok(())
    }

    /// Write `data` to the firmware setting at `index`
    pub async fn dci_write(&mut self, index: u16, data: &[u8]) -> Result<()> {
        self.ensure_booted()?;
        let size = data.len();
        if size > DCI_MAX || size % 4 != 0 {
            return Err(Error::InvalidArgument);
        }
        let [i1, i0] = index.to_be_bytes();
        let [s1, s0] = ((size + 8) as u16).to_be_bytes();

        let mut buf = [0u8; DCI_MAX + DCI_OVERHEAD];
        let buf = &mut buf[..size + DCI_OVERHEAD];
        buf[0] = i1;
        buf[1] = i0;
        buf[2] = ((size & 0xFF0) >> 4) as u8;
        buf[3] = ((size & 0x0F) << 4) as u8;
        buf[4..4 + size].copy_from_slice(data);
        swap_words(&mut buf[4..4 + size]);
        buf[4 + size..].copy_from_slice(&[0x00, 0x00, 0x00, 0x0F, 0x05, 0x01, s1, s0]);

        let address = UI_CMD_END - (size + DCI_OVERHEAD) as u16 + 1;
        self.write_multi(address, buf).await?;
        self.poll_for_answer(4, 1, UI_CMD_STATUS, 0xFF, CMD_DONE)
            .await
    }

    /// Read a setting, overwrite `value` at byte `pos`, write it back
    async fn dci_replace(&mut self, index: u16, size: usize, value: &[u8], pos: usize) -> Result<()> {
        let mut buf = [0u8; DCI_MAX];
        let setting = buf.get_mut(..size).ok_or(Error::InvalidArgument)?;
        self.dci_read(index, setting).await?;
        setting
            .get_mut(pos..pos + value.len())
            .ok_or(Error::InvalidArgument)?
            .copy_from_slice(value);
        self.dci_write(index, setting).await
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Verify device and revision ID
    pub async fn check_id(&mut self) -> Result<()> {
        self.set_page(0x00).await?;
        let device = self.read_byte(DEVICE_ID).await?;
        let revision = self.read_byte(REVISION_ID).await?;
        self.set_page(0x02).await?;

        if device != DEVICE_ID_VALUE || revision != REVISION_ID_VALUE {
            crate::log_error!("VL53L7CX: unexpected ID {:#x} rev {:#x}", device, revision);
            return Err(Error::DeviceIdMismatch {
                expected: u32::from_be_bytes([0, 0, DEVICE_ID_VALUE, REVISION_ID_VALUE]),
                found: u32::from_be_bytes([0, 0, device, revision]),
            });
        }
        crate::log_info!("VL53L7CX detected");
        Ok(())
    }

    /// Reboot the sensor, download `firmware` and wait for it to boot
    pub async fn init(&mut self, firmware: &[u8]) -> Result<()> {
        if firmware.is_empty() || firmware.len() > FW_PAGES.len() * FW_PAGE_SIZE {
            return Err(Error::InvalidArgument);
        }
        self.booted = false;

        sequence::apply(self, BOOT_SEQUENCE).await?;
        self.set_page(0x00).await?;
        self.poll_for_answer(1, 0, GO2_STATUS0, 0xFF, 0x01).await?;
        self.write_byte(0x000E, 0x01).await?;
        self.set_page(0x02).await?;

        // Firmware access
        self.write_byte(0x0003, 0x0D).await?;
        self.set_page(0x01).await?;
        self.poll_for_answer(1, 0, FW_STATUS, 0x10, 0x10).await?;

        sequence::apply(self, WAKE_SEQUENCE).await?;

        let chunk = self.config.chunk_size.clamp(1, FW_PAGE_SIZE);
        for (&page, image) in FW_PAGES.iter().zip(firmware.chunks(FW_PAGE_SIZE)) {
            self.set_page(page).await?;
            for (n, part) in image.chunks(chunk).enumerate() {
                self.write_multi((n * chunk) as u16, part).await?;
            }
        }
        crate::log_info!("VL53L7CX: {} bytes of firmware loaded", firmware.len());

        // Check the download
        self.set_page(0x02).await?;
        self.write_byte(0x0003, 0x0D).await?;
        self.set_page(0x01).await?;
        self.poll_for_answer(1, 0, FW_STATUS, 0x10, 0x10).await?;

        sequence::apply(self, MCU_RESET_SEQUENCE).await?;
        self.poll_for_answer(1, 0, GO2_STATUS0, 0x01, 0x01).await?;
        self.set_page(0x02).await?;

        self.resolution = Resolution::default();
        self.stream_count = 0xFF;
        self.booted = true;
        Ok(())
    }

    pub async fn set_resolution(&mut self, resolution: Resolution) -> Result<()> {
        let (dss_zones, dss_step, layout, zone_size) = match resolution {
            Resolution::Zones4x4 => (64, 4, 4, 8),
            Resolution::Zones8x8 => (16, 1, 8, 4),
        };

        let mut dss = [0u8; 16];
        self.dci_read(DCI_DSS_CONFIG, &mut dss).await?;
        dss[0x04] = dss_zones;
        dss[0x06] = dss_zones;
        dss[0x09] = dss_step;
        self.dci_write(DCI_DSS_CONFIG, &dss).await?;

        let mut zone = [0u8; 8];
        self.dci_read(DCI_ZONE_CONFIG, &mut zone).await?;
        zone[0x00] = layout;
        zone[0x01] = layout;
        zone[0x04] = zone_size;
        zone[0x05] = zone_size;
        self.dci_write(DCI_ZONE_CONFIG, &zone).await?;

        self.resolution = resolution;
        Ok(())
    }

    pub async fn get_resolution(&mut self) -> Result<Resolution> {
        let mut zone = [0u8; 8];
        self.dci_read(DCI_ZONE_CONFIG, &mut zone).await?;
        let resolution = Resolution::from_zones(u16::from(zone[0]) * u16::from(zone[1]))?;
        self.resolution = resolution;
        Ok(resolution)
    }

    /// 1..=60 Hz at 4x4, 1..=15 Hz at 8x8
    pub async fn set_ranging_frequency_hz(&mut self, hz: u8) -> Result<()> {
        if hz == 0 || hz > self.resolution.max_frequency_hz() {
            return Err(Error::InvalidArgument);
        }
        self.dci_replace(DCI_FREQ_HZ, 4, &[hz], 0x01).await
    }

    /// 2..=1000 ms
    pub async fn set_integration_time_ms(&mut self, ms: u32) -> Result<()> {
        if !(2..=1000).contains(&ms) {
            return Err(Error::InvalidArgument);
        }
        let us = ms * 1000;
        self.dci_replace(DCI_INT_TIME, 20, &us.to_le_bytes(), 0x00)
            .await
    }

    /// Program the output blocks and start streaming frames
    pub async fn start_ranging(&mut self) -> Result<()> {
        let list = output_list(self.resolution);
        let read_size = frame_len(self.resolution) as u32;

        let mut header = [0u8; 8];
        header[..4].copy_from_slice(&read_size.to_le_bytes());
        header[4..].copy_from_slice(&(list.len() as u32).to_le_bytes());
        self.dci_write(DCI_OUTPUT_CONFIG, &header).await?;

        let mut list_bytes = [0u8; OUTPUT_LIST.len() * 4];
        for (out, word) in list_bytes.chunks_exact_mut(4).zip(list.iter()) {
            out.copy_from_slice(&word.to_le_bytes());
        }
        self.dci_write(DCI_OUTPUT_LIST, &list_bytes).await?;

        let mut enables = [0u8; 16];
        let mask: u32 = (1 << list.len()) - 1;
        enables[..4].copy_from_slice(&mask.to_le_bytes());
        self.dci_write(DCI_OUTPUT_ENABLES, &enables).await?;

        self.stream_count = 0xFF;
        self.write_multi(UI_CMD_END - 3, &[0x00, 0x03, 0x00, 0x00])
            .await?;
        self.poll_for_answer(4, 1, UI_CMD_STATUS, 0xFF, CMD_DONE)
            .await
    }

    pub async fn stop_ranging(&mut self) -> Result<()> {
        self.ensure_booted()?;
        let mut flag = [0u8; 4];
        self.read_multi(AUTO_STOP_FLAG, &mut flag).await?;

        if u32::from_be_bytes(flag) != AUTO_STOP_VALUE {
            sequence::apply(self, STOP_SEQUENCE).await?;
            self.poll_for_answer(1, 0, GO2_STATUS0, 0x80, 0x80).await?;
        }
        sequence::apply(self, UNDO_STOP_SEQUENCE).await
    }

    /// True when a frame newer than the last one read is available
    pub async fn check_data_ready(&mut self) -> Result<bool> {
        self.ensure_booted()?;
        let mut buf = [0u8; 4];
        self.read_multi(0x0000, &mut buf).await?;

        let ready = buf[0] != self.stream_count
            && buf[0] != 0xFF
            && buf[1] == 0x05
            && buf[2] & 0x05 == 0x05
            && buf[3] & 0x10 == 0x10;
        if ready {
            self.stream_count = buf[0];
        } else if buf[3] & 0x80 != 0 && buf[2] >= 0x7F {
            crate::log_error!("VL53L7CX: MCU error {:#x}", buf[2]);
            return Err(Error::Status(u16::from(buf[2])));
        }
        Ok(ready)
    }

    /// Read and decode the current frame
    pub async fn get_ranging_data(&mut self) -> Result<ResultsData> {
        self.ensure_booted()?;
        let len = frame_len(self.resolution);
        let mut frame = [0u8; MAX_FRAME_LEN];
        self.read_multi(0x0000, &mut frame[..len]).await?;
        swap_words(&mut frame[..len]);
        parse_results(&frame[..len], self.resolution)
    }
}

impl<I2C> ConfigureTarget<u16, u8> for LightRanger11<I2C>
where
    I2C: I2c,
{
    async fn write_step(&mut self, reg: u16, value: u8) -> Result<()> {
        self.write_byte(reg, value).await
    }

    async fn update_step(&mut self, reg: u16, mask: u8, value: u8) -> Result<()> {
        let current = self.read_byte(reg).await?;
        let updated = (current & !mask) | (value & mask);
        if updated != current {
            self.write_byte(reg, updated).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::{I2cTransaction, MockI2c};

    const DONE: [u8; 4] = [0x00, CMD_DONE, 0x00, 0x00];

    /// A sensor that already runs its firmware
    fn sensor(i2c: &MockI2c) -> LightRanger11<MockI2c> {
        let mut tof = LightRanger11::new(i2c.clone(), LightRanger11Config::default());
        tof.booted = true;
        tof
    }

    /// A DCI read answer as it appears on the wire
    fn dci_answer(data: &[u8]) -> Vec<u8> {
        let mut buf = vec![0u8; data.len() + DCI_OVERHEAD];
        buf[4..4 + data.len()].copy_from_slice(data);
        swap_words(&mut buf);
        buf
    }

    #[tokio::test]
    async fn test_check_id() {
        let i2c = MockI2c::new();
        i2c.set_read_data(&[0xF0, 0x02]);
        let mut tof = sensor(&i2c);

        tof.check_id().await.unwrap();
        assert_eq!(
            i2c.written(),
            vec![
                vec![0x7F, 0xFF, 0x00],
                vec![0x00, 0x00],
                vec![0x00, 0x01],
                vec![0x7F, 0xFF, 0x02],
            ]
        );

        i2c.set_read_data(&[0xF0, 0x01]);
        assert!(matches!(
            tof.check_id().await,
            Err(Error::DeviceIdMismatch { found: 0xF001, .. })
        ));
    }

    #[tokio::test]
    async fn test_dci_write_framing() {
        let i2c = MockI2c::new();
        i2c.set_read_data(&DONE);
        let mut tof = sensor(&i2c);

        tof.dci_write(DCI_FREQ_HZ, &[0x0A, 0x0B, 0x0C, 0x0D]).await.unwrap();

        let written = i2c.written();
        // 16 bytes end at UI_CMD_END: start address 0x2FF0
        assert_eq!(
            written[0],
            vec![
                0x2F, 0xF0, 0x54, 0x58, 0x00, 0x40, 0x0D, 0x0C, 0x0B, 0x0A, 0x00, 0x00, 0x00,
                0x0F, 0x05, 0x01, 0x00, 0x0C
            ]
        );
        assert_eq!(written[1], vec![0x2C, 0x00]);
    }

    #[tokio::test]
    async fn test_dci_mcu_error() {
        let i2c = MockI2c::new();
        i2c.set_read_data(&[0x00, 0x00, 0x80, 0x00]);
        let mut tof = sensor(&i2c);

        assert_eq!(
            tof.dci_write(DCI_FREQ_HZ, &[0; 4]).await,
            Err(Error::Status(0x80))
        );
    }

    #[tokio::test]
    async fn test_dci_size_checks() {
        let i2c = MockI2c::new();
        let mut tof = sensor(&i2c);

        assert_eq!(tof.dci_write(DCI_FREQ_HZ, &[0; 3]).await, Err(Error::InvalidArgument));
        let mut big = [0u8; 68];
        assert_eq!(tof.dci_read(DCI_FREQ_HZ, &mut big).await, Err(Error::InvalidArgument));
        assert!(i2c.transactions().is_empty());
    }

    #[tokio::test]
    async fn test_set_ranging_frequency() {
        let i2c = MockI2c::new();
        i2c.set_read_data(&DONE);
        i2c.push_read_data(&dci_answer(&[0x00, 0x01, 0x00, 0x00]));
        i2c.push_read_data(&DONE);
        let mut tof = sensor(&i2c);

        tof.set_ranging_frequency_hz(30).await.unwrap();

        let written = i2c.written();
        let write = written.last().unwrap();
        // Payload word swapped back to wire order, byte 1 replaced
        assert_eq!(&written[written.len() - 2][6..10], &[0x00, 0x00, 30, 0x00]);
        assert_eq!(write, &vec![0x2C, 0x00]);

        assert_eq!(tof.set_ranging_frequency_hz(61).await, Err(Error::InvalidArgument));
        assert_eq!(tof.set_ranging_frequency_hz(0).await, Err(Error::InvalidArgument));
    }

    #[tokio::test]
    async fn test_get_resolution() {
        let i2c = MockI2c::new();
        i2c.set_read_data(&DONE);
        i2c.push_read_data(&dci_answer(&[8, 8, 0, 0, 4, 4, 0, 0]));
        let mut tof = sensor(&i2c);

        assert_eq!(tof.get_resolution().await.unwrap(), Resolution::Zones8x8);
        // 8x8 lowers the frequency ceiling
        assert_eq!(tof.set_ranging_frequency_hz(16).await, Err(Error::InvalidArgument));
    }

    #[tokio::test]
    async fn test_integration_time_bounds() {
        let i2c = MockI2c::new();
        let mut tof = sensor(&i2c);

        assert_eq!(tof.set_integration_time_ms(1).await, Err(Error::InvalidArgument));
        assert_eq!(tof.set_integration_time_ms(1001).await, Err(Error::InvalidArgument));
    }

    #[tokio::test]
    async fn test_check_data_ready_tracks_stream_count() {
        let i2c = MockI2c::new();
        i2c.set_read_data(&[0x07, 0x05, 0x05, 0x10]);
        i2c.push_read_data(&[0x07, 0x05, 0x05, 0x10]);
        i2c.push_read_data(&[0x08, 0x05, 0x05, 0x10]);
        let mut tof = sensor(&i2c);

        assert!(tof.check_data_ready().await.unwrap());
        assert!(!tof.check_data_ready().await.unwrap());
        assert!(tof.check_data_ready().await.unwrap());
    }

    fn frame_4x4() -> Vec<u8> {
        let len = frame_len(Resolution::Zones4x4);
        let mut frame = vec![0u8; len];
        frame[8] = 0x12;
        frame[9] = 0x34;
        frame[len - 4] = 0x12;
        frame[len - 3] = 0x34;

        let mut i = FRAME_HEADER_LEN;
        for word in output_list(Resolution::Zones4x4) {
            frame[i..i + 4].copy_from_slice(&word.to_le_bytes());
            let bh = BlockHeader::from_word(word);
            let data = &mut frame[i + 4..i + 4 + bh.payload_len()];
            match bh.idx {
                METADATA_IDX => data[8] = 0xFB,
                NB_TARGET_DETECTED_IDX => data.fill(1),
                DISTANCE_IDX => {
                    for (zone, raw) in data.chunks_exact_mut(2).enumerate() {
                        let value = if zone == 15 { -8i16 } else { (zone as i16 + 1) * 400 };
                        raw.copy_from_slice(&value.to_le_bytes());
                    }
                }
                TARGET_STATUS_IDX => data.fill(5),
                _ => {}
            }
            i += 4 + bh.payload_len();
        }
        swap_words(&mut frame);
        frame
    }

    #[tokio::test]
    async fn test_get_ranging_data() {
        let i2c = MockI2c::new();
        i2c.set_read_data(&frame_4x4());
        let mut tof = sensor(&i2c);

        let results = tof.get_ranging_data().await.unwrap();

        assert_eq!(results.zones, 16);
        assert_eq!(results.silicon_temp_degc, -5);
        assert_eq!(results.distance_mm[0], 100);
        assert_eq!(results.distance_mm[14], 1500);
        assert_eq!(results.distance_mm[15], 0);
        assert_eq!(results.distance_mm[16], 0);
        assert!(results.nb_target_detected[..16].iter().all(|&n| n == 1));
        assert!(results.target_status[..16].iter().all(|&s| s == 5));
        assert_eq!(
            i2c.transactions(),
            vec![I2cTransaction::WriteRead {
                addr: 0x29,
                write_data: vec![0x00, 0x00],
                read_len: 124
            }]
        );
    }

    #[tokio::test]
    async fn test_start_ranging_writes_output_config() {
        let i2c = MockI2c::new();
        for _ in 0..4 {
            i2c.push_read_data(&DONE);
        }
        let mut tof = sensor(&i2c);

        tof.start_ranging().await.unwrap();

        let written = i2c.written();
        // Output config: read size 124, 5 blocks (words swapped to wire order)
        assert_eq!(&written[0][2..4], &[0xCD, 0x60]);
        assert_eq!(&written[0][6..14], &[0, 0, 0, 124, 0, 0, 0, 5]);
        // Start command lands on the last mailbox word
        assert_eq!(written[6], vec![0x2F, 0xFC, 0x00, 0x03, 0x00, 0x00]);
    }

    #[tokio::test]
    async fn test_firmware_required() {
        let i2c = MockI2c::new();
        let mut tof = LightRanger11::new(i2c.clone(), LightRanger11Config::default());

        assert_eq!(tof.start_ranging().await, Err(Error::NotInitialized));
        assert_eq!(tof.check_data_ready().await, Err(Error::NotInitialized));
        assert!(i2c.transactions().is_empty());
    }

    #[tokio::test]
    async fn test_init_rejects_bad_firmware_size() {
        let i2c = MockI2c::new();
        let mut tof = sensor(&i2c);
        let oversized = vec![0u8; FW_PAGES.len() * FW_PAGE_SIZE + 1];

        assert_eq!(tof.init(&[]).await, Err(Error::InvalidArgument));
        assert_eq!(tof.init(&oversized).await, Err(Error::InvalidArgument));
        assert!(i2c.transactions().is_empty());
    }

    #[tokio::test]
    async fn test_init_downloads_firmware_in_pages() {
        let i2c = MockI2c::new();
        // GO2 boot, FW access, FW check, MCU boot
        i2c.set_read_data(&[0x01, 0x10, 0x10, 0x01]);
        let config = LightRanger11Config {
            chunk_size: 0x4000,
            ..Default::default()
        };
        let mut tof = LightRanger11::new(i2c.clone(), config);
        let firmware = vec![0xA5u8; FW_PAGE_SIZE + 0x100];

        tof.init(&firmware).await.unwrap();
        assert!(tof.booted);

        let written = i2c.written();
        let large: Vec<_> = written.iter().filter(|w| w.len() > 16).collect();
        assert_eq!(large.len(), 3);
        assert_eq!(&large[0][..2], &[0x00, 0x00]);
        assert_eq!(large[0].len(), 2 + 0x4000);
        assert_eq!(&large[1][..2], &[0x40, 0x00]);
        assert_eq!(large[2].len(), 2 + 0x100);
        assert!(written.contains(&vec![0x7F, 0xFF, 0x0A]));
        assert!(!written.contains(&vec![0x7F, 0xFF, 0x0B]));
        assert_eq!(written.last(), Some(&vec![0x7F, 0xFF, 0x02]));
    }
}
