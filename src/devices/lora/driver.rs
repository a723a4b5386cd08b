//! RN2483 UART driver

use super::{parse_event, JoinMode, LoraConfig, LoraEvent, MAX_LINE};
use crate::core::time::delay_ms;
use crate::platform::{Error, Result};
use core::fmt::Write as _;
use embedded_hal::digital::OutputPin;
use embedded_io_async::{Read, ReadReady, Write};
use heapless::{String, Vec};

/// LoRa Click driver
pub struct Lora<UART, RST> {
    uart: UART,
    rst: RST,
    config: LoraConfig,
    /// Partial line carried across `process` calls
    line: Vec<u8, MAX_LINE>,
}

impl<UART, RST> Lora<UART, RST>
where
    UART: Read + Write + ReadReady,
    RST: OutputPin,
{
    pub fn new(uart: UART, rst: RST, config: LoraConfig) -> Self {
        Self {
            uart,
            rst,
            config,
            line: Vec::new(),
        }
    }

    pub fn release(self) -> (UART, RST) {
        (self.uart, self.rst)
    }

    // =========================================================================
    // Line I/O
    // =========================================================================

    async fn poll_byte(&mut self) -> Result<Option<u8>> {
        if !self.uart.read_ready().map_err(Error::uart)? {
            return Ok(None);
        }
        let mut byte = [0u8; 1];
        match self.uart.read(&mut byte).await.map_err(Error::uart)? {
            1 => Ok(Some(byte[0])),
            _ => Ok(None),
        }
    }

    /// Append a byte; true when it completed a line
    fn accept(&mut self, byte: u8) -> Result<bool> {
        match byte {
            b'\n' => Ok(true),
            b'\r' => Ok(false),
            _ => self.line.push(byte).map(|_| false).map_err(|_| {
                crate::log_warn!("RN2483: line overflow");
                self.line.clear();
                Error::BufferTooSmall
            }),
        }
    }

    fn take_line(&mut self) -> Result<String<MAX_LINE>> {
        let text = core::str::from_utf8(&self.line).map_err(|_| Error::InvalidResponse);
        let mut line = String::new();
        let result = match text {
            Ok(text) => line.push_str(text).map_err(|_| Error::BufferTooSmall),
            Err(e) => Err(e),
        };
        self.line.clear();
        result.map(|_| line)
    }

    async fn read_line(&mut self, timeout_ms: u32) -> Result<String<MAX_LINE>> {
        let mut budget = timeout_ms;
        loop {
            match self.poll_byte().await? {
                Some(byte) => {
                    if self.accept(byte)? {
                        let line = self.take_line()?;
                        crate::log_trace!("RN2483 < {}", line.as_str());
                        return Ok(line);
                    }
                }
                None => {
                    if budget == 0 {
                        crate::log_warn!("RN2483: reply timeout");
                        return Err(Error::Timeout);
                    }
                    budget -= 1;
                    delay_ms(1).await;
                }
            }
        }
    }

    async fn write_line(&mut self, cmd: &str) -> Result<()> {
        crate::log_trace!("RN2483 > {}", cmd);
        self.uart
            .write_all(cmd.as_bytes())
            .await
            .map_err(Error::uart)?;
        self.uart.write_all(b"\r\n").await.map_err(Error::uart)?;
        self.uart.flush().await.map_err(Error::uart)
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Send a command line and return the reply line
    pub async fn send_command(&mut self, cmd: &str) -> Result<String<MAX_LINE>> {
        self.write_line(cmd).await?;
        self.read_line(self.config.timeout_ms).await
    }

    /// Send a command and require an exact reply
    pub async fn expect(&mut self, cmd: &str, reply: &str) -> Result<()> {
        let line = self.send_command(cmd).await?;
        if line.as_str() != reply {
            crate::log_warn!("RN2483: '{}' answered '{}'", cmd, line.as_str());
            return Err(Error::InvalidResponse);
        }
        Ok(())
    }

    /// Pulse RST and return the boot banner (firmware version)
    pub async fn hardware_reset(&mut self) -> Result<String<MAX_LINE>> {
        self.rst.set_low().map_err(Error::gpio)?;
        delay_ms(self.config.reset_pulse_ms).await;
        self.rst.set_high().map_err(Error::gpio)?;
        self.line.clear();
        delay_ms(self.config.boot_time_ms).await;
        self.read_line(self.config.timeout_ms).await
    }

    /// Reboot the module; returns the firmware version line
    pub async fn sys_reset(&mut self) -> Result<String<MAX_LINE>> {
        self.send_command("sys reset").await
    }

    /// Preprogrammed EUI-64
    pub async fn get_hweui(&mut self) -> Result<u64> {
        let line = self.send_command("sys get hweui").await?;
        if line.len() != 16 {
            return Err(Error::InvalidResponse);
        }
        u64::from_str_radix(line.as_str(), 16).map_err(|_| Error::InvalidResponse)
    }

    /// `mac set <param> <value>`
    pub async fn mac_set(&mut self, param: &str, value: &str) -> Result<()> {
        let mut cmd: String<MAX_LINE> = String::new();
        write!(cmd, "mac set {} {}", param, value).map_err(|_| Error::InvalidArgument)?;
        self.expect(&cmd, "ok").await
    }

    /// Join the network; `Ok(false)` when the server denied the join
    pub async fn mac_join(&mut self, mode: JoinMode) -> Result<bool> {
        let mut cmd: String<32> = String::new();
        write!(cmd, "mac join {}", mode.keyword()).map_err(|_| Error::InvalidArgument)?;
        self.expect(&cmd, "ok").await?;

        let verdict = self.read_line(self.config.join_timeout_ms).await?;
        match verdict.as_str() {
            "accepted" => {
                crate::log_info!("RN2483: joined");
                Ok(true)
            }
            "denied" => Ok(false),
            _ => Err(Error::InvalidResponse),
        }
    }

    /// Queue an uplink; the outcome arrives through `process`
    pub async fn mac_tx(&mut self, confirmed: bool, port: u8, payload: &[u8]) -> Result<()> {
        if !(1..=223).contains(&port) {
            return Err(Error::InvalidArgument);
        }
        let kind = if confirmed { "cnf" } else { "uncnf" };
        let mut cmd: String<MAX_LINE> = String::new();
        write!(cmd, "mac tx {} {} ", kind, port).map_err(|_| Error::InvalidArgument)?;
        push_hex(&mut cmd, payload)?;
        self.expect(&cmd, "ok").await
    }

    /// Suspend the LoRaWAN stack for raw radio use; returns the pause length in ms
    pub async fn mac_pause(&mut self) -> Result<u32> {
        let line = self.send_command("mac pause").await?;
        line.as_str().parse().map_err(|_| Error::InvalidResponse)
    }

    /// Transmit a raw radio packet; completion arrives through `process`
    pub async fn radio_tx(&mut self, payload: &[u8]) -> Result<()> {
        let mut cmd: String<MAX_LINE> = String::new();
        cmd.push_str("radio tx ").map_err(|_| Error::BufferTooSmall)?;
        push_hex(&mut cmd, payload)?;
        self.expect(&cmd, "ok").await
    }

    /// Open a receive window (`0` = continuous); data arrives through `process`
    pub async fn radio_rx(&mut self, window: u16) -> Result<()> {
        let mut cmd: String<32> = String::new();
        write!(cmd, "radio rx {}", window).map_err(|_| Error::InvalidArgument)?;
        self.expect(&cmd, "ok").await
    }

    /// Dispatch every complete line already received
    ///
    /// Never waits; a partial line is kept for the next call. Returns how
    /// many events reached `handler`.
    pub async fn process<F>(&mut self, mut handler: F) -> Result<usize>
    where
        F: FnMut(&LoraEvent),
    {
        let mut count = 0;
        while let Some(byte) = self.poll_byte().await? {
            if !self.accept(byte)? {
                continue;
            }
            let line = self.take_line()?;
            if line.is_empty() {
                continue;
            }
            match parse_event(&line) {
                Ok(event) => {
                    handler(&event);
                    count += 1;
                }
                Err(_) => crate::log_warn!("RN2483: malformed line '{}'", line.as_str()),
            }
        }
        Ok(count)
    }
}

fn push_hex<const N: usize>(out: &mut String<N>, data: &[u8]) -> Result<()> {
    for byte in data {
        write!(out, "{:02X}", byte).map_err(|_| Error::BufferTooSmall)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::pins::NoPin;
    use crate::platform::mock::{MockPin, MockUart};

    fn lora(uart: &MockUart) -> Lora<MockUart, NoPin> {
        Lora::new(uart.clone(), NoPin, LoraConfig::default())
    }

    #[tokio::test]
    async fn test_hardware_reset_returns_banner() {
        let uart = MockUart::new();
        let rst = MockPin::new();
        uart.inject_rx_data(b"RN2483 1.0.5 Oct 31 2018 15:06:52\r\n");
        let mut module = Lora::new(uart, rst.clone(), LoraConfig::default());

        let banner = module.hardware_reset().await.unwrap();

        assert!(banner.starts_with("RN2483"));
        assert_eq!(rst.history(), vec![false, true]);
    }

    #[tokio::test]
    async fn test_get_hweui() {
        let uart = MockUart::new();
        uart.inject_rx_data(b"0004A30B001A2B3C\r\n");
        let mut module = lora(&uart);

        assert_eq!(module.get_hweui().await.unwrap(), 0x0004_A30B_001A_2B3C);
        assert_eq!(uart.tx_buffer(), b"sys get hweui\r\n");
    }

    #[tokio::test]
    async fn test_mac_set_rejected() {
        let uart = MockUart::new();
        uart.inject_rx_data(b"invalid_param\r\n");
        let mut module = lora(&uart);

        assert_eq!(
            module.mac_set("deveui", "0011").await,
            Err(Error::InvalidResponse)
        );
        assert_eq!(uart.tx_buffer(), b"mac set deveui 0011\r\n");
    }

    #[tokio::test]
    async fn test_mac_join() {
        let uart = MockUart::new();
        uart.inject_rx_data(b"ok\r\naccepted\r\n");
        let mut module = lora(&uart);
        assert!(module.mac_join(JoinMode::Otaa).await.unwrap());

        uart.inject_rx_data(b"ok\r\ndenied\r\n");
        assert!(!module.mac_join(JoinMode::Abp).await.unwrap());
        assert_eq!(uart.tx_buffer(), b"mac join otaa\r\nmac join abp\r\n");
    }

    #[tokio::test]
    async fn test_mac_tx_then_downlink_event() {
        let uart = MockUart::new();
        uart.inject_rx_data(b"ok\r\n");
        let mut module = lora(&uart);

        module.mac_tx(false, 1, &[0xCA, 0xFE]).await.unwrap();
        assert_eq!(uart.tx_buffer(), b"mac tx uncnf 1 CAFE\r\n");

        // Downlink split across two polls
        uart.inject_rx_data(b"mac_rx 2 AB");
        let mut events = std::vec::Vec::new();
        assert_eq!(module.process(|e| events.push(e.clone())).await.unwrap(), 0);
        uart.inject_rx_data(b"CD\r\n");
        assert_eq!(module.process(|e| events.push(e.clone())).await.unwrap(), 1);

        let LoraEvent::MacRx { port, data } = &events[0] else {
            panic!("expected mac_rx");
        };
        assert_eq!(*port, 2);
        assert_eq!(data.as_slice(), &[0xAB, 0xCD]);
    }

    #[tokio::test]
    async fn test_mac_tx_port_bounds() {
        let uart = MockUart::new();
        let mut module = lora(&uart);

        assert_eq!(module.mac_tx(true, 0, &[]).await, Err(Error::InvalidArgument));
        assert_eq!(module.mac_tx(true, 224, &[]).await, Err(Error::InvalidArgument));
        assert!(uart.tx_buffer().is_empty());
    }

    #[tokio::test]
    async fn test_radio_session() {
        let uart = MockUart::new();
        uart.inject_rx_data(b"4294967245\r\nok\r\nok\r\n");
        let mut module = lora(&uart);

        assert_eq!(module.mac_pause().await.unwrap(), 4_294_967_245);
        module.radio_tx(b"Hi").await.unwrap();
        module.radio_rx(0).await.unwrap();
        assert_eq!(
            uart.tx_buffer(),
            b"mac pause\r\nradio tx 4869\r\nradio rx 0\r\n"
        );

        uart.inject_rx_data(b"radio_tx_ok\r\nradio_rx  0102\r\nradio_err\r\n");
        let mut events = std::vec::Vec::new();
        module.process(|e| events.push(e.clone())).await.unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], LoraEvent::RadioTxOk);
        assert_eq!(events[2], LoraEvent::RadioErr);
    }

    #[tokio::test]
    async fn test_reply_timeout() {
        let uart = MockUart::new();
        let mut module = lora(&uart);

        assert_eq!(module.sys_reset().await, Err(Error::Timeout));
    }
}
