//! MM5D91 UART driver

use super::frame::{self, HEADER_COMMAND, HEADER_EVENT, MAX_FRAME_LEN, MAX_PAYLOAD_LEN, PREFIX_LEN};
use super::*;
use crate::core::time::{delay_ms, timestamp_ms};
use crate::platform::{Error, Result};
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_io_async::{Read, ReadReady, Write};
use heapless::Deque;

/// Radar Click driver
///
/// # Type Parameters
///
/// * `UART` - `embedded_io_async` serial port at 115200 baud
/// * `RST` - reset line (`NoPin` when not wired)
/// * `GPIO0` - detection output of the module (`NoPin` when not wired)
pub struct Radar<UART, RST, GPIO0> {
    uart: UART,
    rst: RST,
    gpio0: GPIO0,
    config: RadarConfig,
    rx: [u8; MAX_FRAME_LEN],
    events: Deque<RadarEvent, EVENT_QUEUE_DEPTH>,
}

/// Header and payload length of the frame in `rx`
struct Received {
    header: u8,
    code: u8,
    len: usize,
}

impl<UART, RST, GPIO0> Radar<UART, RST, GPIO0>
where
    UART: Read + Write + ReadReady,
    RST: OutputPin,
    GPIO0: InputPin,
{
    /// Create the driver; no bus traffic
    pub fn new(uart: UART, rst: RST, gpio0: GPIO0, config: RadarConfig) -> Self {
        Self {
            uart,
            rst,
            gpio0,
            config,
            rx: [0u8; MAX_FRAME_LEN],
            events: Deque::new(),
        }
    }

    /// Give the UART and pins back
    pub fn release(self) -> (UART, RST, GPIO0) {
        (self.uart, self.rst, self.gpio0)
    }

    /// Pulse RST and wait for the module to boot
    pub async fn hardware_reset(&mut self) -> Result<()> {
        self.rst.set_low().map_err(Error::gpio)?;
        delay_ms(self.config.reset_pulse_ms).await;
        self.rst.set_high().map_err(Error::gpio)?;
        delay_ms(self.config.boot_time_ms).await;
        self.events.clear();
        Ok(())
    }

    /// Level of the GPIO0 detection output
    pub fn get_gpio0_pin(&mut self) -> Result<bool> {
        self.gpio0.is_high().map_err(Error::gpio)
    }

    // =========================================================================
    // Framing
    // =========================================================================

    /// Send a command frame
    pub async fn send_command(&mut self, code: u8, payload: &[u8]) -> Result<()> {
        let mut buf = [0u8; MAX_FRAME_LEN];
        let len = frame::encode_frame(HEADER_COMMAND, code, payload, &mut buf)?;
        self.uart
            .write_all(&buf[..len])
            .await
            .map_err(Error::uart)?;
        self.uart.flush().await.map_err(Error::uart)
    }

    async fn read_byte(&mut self, budget_ms: &mut u32) -> Result<u8> {
        loop {
            if self.uart.read_ready().map_err(Error::uart)? {
                let mut byte = [0u8; 1];
                if self.uart.read(&mut byte).await.map_err(Error::uart)? == 1 {
                    return Ok(byte[0]);
                }
            }
            if *budget_ms == 0 {
                return Err(Error::Timeout);
            }
            *budget_ms -= 1;
            delay_ms(1).await;
        }
    }

    async fn read_exact(&mut self, start: usize, end: usize, budget_ms: &mut u32) -> Result<()> {
        for i in start..end {
            self.rx[i] = self.read_byte(budget_ms).await?;
        }
        Ok(())
    }

    async fn receive(&mut self) -> Result<Received> {
        let mut budget = self.config.timeout_ms;

        // Sync on a header byte
        let header = loop {
            let byte = self.read_byte(&mut budget).await?;
            if byte == HEADER_COMMAND || byte == HEADER_EVENT {
                break byte;
            }
            crate::log_trace!("Radar: skipping {:#x}", byte);
        };
        self.rx[0] = header;
        self.read_exact(1, PREFIX_LEN, &mut budget).await?;

        let len = usize::from(u16::from_le_bytes([self.rx[2], self.rx[3]]));
        if len > MAX_PAYLOAD_LEN {
            crate::log_warn!("Radar: frame length {} out of range", len);
            return Err(Error::InvalidResponse);
        }
        let total = PREFIX_LEN + len + frame::CRC_LEN;
        self.read_exact(PREFIX_LEN, total, &mut budget).await?;
        frame::check_crc(&self.rx[..total])?;

        Ok(Received {
            header,
            code: self.rx[1],
            len,
        })
    }

    fn payload(&self, len: usize) -> &[u8] {
        &self.rx[PREFIX_LEN..PREFIX_LEN + len]
    }

    fn queue_event(&mut self, code: u8, len: usize) {
        let mut payload = heapless::Vec::new();
        // Bounded by MAX_PAYLOAD_LEN in `receive`
        let _ = payload.extend_from_slice(self.payload(len));
        let event = RadarEvent {
            code,
            payload,
            timestamp_ms: timestamp_ms(),
        };
        if self.events.is_full() {
            crate::log_warn!("Radar: event queue full, dropping oldest");
            self.events.pop_front();
        }
        let _ = self.events.push_back(event);
    }

    /// Read one frame of either kind
    ///
    /// Returns `(header, code, payload length)`; the payload stays in the
    /// receive buffer until the next read.
    pub async fn read_frame(&mut self) -> Result<(u8, u8, usize)> {
        let frame = self.receive().await?;
        Ok((frame.header, frame.code, frame.len))
    }

    /// Next detection or heartbeat event
    ///
    /// Returns queued events first. Otherwise reads a frame only when the
    /// UART has data, so the call does not block on an idle module.
    pub async fn get_event(&mut self) -> Result<Option<RadarEvent>> {
        if let Some(event) = self.events.pop_front() {
            return Ok(Some(event));
        }
        while self.uart.read_ready().map_err(Error::uart)? {
            let frame = self.receive().await?;
            if frame.header == HEADER_EVENT {
                self.queue_event(frame.code, frame.len);
                return Ok(self.events.pop_front());
            }
            crate::log_debug!("Radar: unsolicited response {:#x} dropped", frame.code);
        }
        Ok(None)
    }

    /// Send a command and wait for its response
    ///
    /// Copies the response payload (status byte removed) into `out` and
    /// returns its length. Events received meanwhile are queued.
    pub async fn command(&mut self, code: u8, payload: &[u8], out: &mut [u8]) -> Result<usize> {
        self.send_command(code, payload).await?;

        loop {
            let frame = self.receive().await?;
            if frame.header == HEADER_EVENT {
                self.queue_event(frame.code, frame.len);
                continue;
            }
            if frame.code != code {
                crate::log_debug!("Radar: response {:#x} while waiting for {:#x}", frame.code, code);
                continue;
            }

            let (status, data) = self
                .payload(frame.len)
                .split_first()
                .ok_or(Error::InvalidResponse)?;
            if *status != 0 {
                crate::log_warn!("Radar: command {:#x} failed with status {}", code, status);
                return Err(Error::Status(u16::from(*status)));
            }
            let dest = out.get_mut(..data.len()).ok_or(Error::BufferTooSmall)?;
            dest.copy_from_slice(data);
            return Ok(data.len());
        }
    }

    async fn command_exact<const N: usize>(&mut self, code: u8, payload: &[u8]) -> Result<[u8; N]> {
        let mut out = [0u8; MAX_PAYLOAD_LEN];
        let len = self.command(code, payload, &mut out).await?;
        if len < N {
            return Err(Error::InvalidResponse);
        }
        let mut value = [0u8; N];
        value.copy_from_slice(&out[..N]);
        Ok(value)
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Software reset of the module
    pub async fn reset(&mut self) -> Result<()> {
        self.command(CMD_RESET, &[], &mut []).await?;
        self.events.clear();
        Ok(())
    }

    /// Firmware version string
    pub async fn get_firmware_version(&mut self) -> Result<heapless::String<MAX_PAYLOAD_LEN>> {
        let mut out = [0u8; MAX_PAYLOAD_LEN];
        let len = self.command(CMD_GET_FW_VERSION, &[], &mut out).await?;
        let text = core::str::from_utf8(&out[..len]).map_err(|_| Error::InvalidResponse)?;
        let mut version = heapless::String::new();
        version
            .push_str(text.trim_end_matches('\0'))
            .map_err(|_| Error::BufferTooSmall)?;
        Ok(version)
    }

    /// Set the detection window in meters
    pub async fn set_detection_range(&mut self, min_m: f32, max_m: f32) -> Result<()> {
        if !(RANGE_MIN_M..=RANGE_MAX_M).contains(&min_m)
            || !(RANGE_MIN_M..=RANGE_MAX_M).contains(&max_m)
            || min_m >= max_m
        {
            return Err(Error::InvalidArgument);
        }
        let mut payload = [0u8; 8];
        payload[..4].copy_from_slice(&min_m.to_le_bytes());
        payload[4..].copy_from_slice(&max_m.to_le_bytes());
        self.command(CMD_SET_DETECTION_RANGE, &payload, &mut []).await?;
        Ok(())
    }

    /// Detection window in meters `(min, max)`
    pub async fn get_detection_range(&mut self) -> Result<(f32, f32)> {
        let raw: [u8; 8] = self.command_exact(CMD_GET_DETECTION_RANGE, &[]).await?;
        Ok((
            f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
            f32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]),
        ))
    }

    /// Set detection sensitivity (1 = least, 9 = most sensitive)
    pub async fn set_sensitivity(&mut self, level: u8) -> Result<()> {
        if !(SENSITIVITY_MIN..=SENSITIVITY_MAX).contains(&level) {
            return Err(Error::InvalidArgument);
        }
        self.command(CMD_SET_SENSITIVITY, &[level], &mut []).await?;
        Ok(())
    }

    /// Detection sensitivity
    pub async fn get_sensitivity(&mut self) -> Result<u8> {
        let [level] = self.command_exact::<1>(CMD_GET_SENSITIVITY, &[]).await?;
        Ok(level)
    }

    /// Time the detection output is held after the target leaves
    pub async fn set_hold_time(&mut self, ms: u32) -> Result<()> {
        self.command(CMD_SET_HOLD_TIME, &ms.to_le_bytes(), &mut [])
            .await?;
        Ok(())
    }

    /// Detection hold time in milliseconds
    pub async fn get_hold_time(&mut self) -> Result<u32> {
        let raw = self.command_exact::<4>(CMD_GET_HOLD_TIME, &[]).await?;
        Ok(u32::from_le_bytes(raw))
    }

    /// Polarity of the GPIO0 detection output
    pub async fn set_output_polarity(&mut self, polarity: OutputPolarity) -> Result<()> {
        self.command(CMD_SET_OUTPUT_POLARITY, &[polarity.value()], &mut [])
            .await?;
        Ok(())
    }

    /// Module temperature in °C
    pub async fn get_temperature(&mut self) -> Result<f32> {
        let raw = self.command_exact::<4>(CMD_GET_TEMPERATURE, &[]).await?;
        Ok(f32::from_le_bytes(raw))
    }

    /// Current presence detection state
    pub async fn get_detection_status(&mut self) -> Result<DetectionStatus> {
        let raw = self.command_exact::<5>(CMD_GET_DETECTION_STATUS, &[]).await?;
        DetectionStatus::parse(&raw).ok_or(Error::InvalidResponse)
    }
}
