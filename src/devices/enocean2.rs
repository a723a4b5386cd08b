//! EnOcean 2 Click (EnOcean TCM 310 gateway module, ESP3 over UART 57600)
//!
//! Commands go out as ESP3 packets and are answered by a `Response` packet
//! whose first data byte is a return code. Radio telegrams and events
//! arrive unsolicited; [`EnOcean2::process`] hands them to a callback.

use crate::communication::esp3::{encode_packet, Esp3Packet, Esp3Parser, PacketType};
use crate::core::time::delay_ms;
use crate::platform::{Error, Result};
use embedded_io_async::{Read, ReadReady, Write};
use heapless::Deque;

pub const CO_WR_SLEEP: u8 = 0x01;
pub const CO_WR_RESET: u8 = 0x02;
pub const CO_RD_VERSION: u8 = 0x03;
pub const CO_RD_IDBASE: u8 = 0x08;

/// Response return codes
pub const RET_OK: u8 = 0x00;
pub const RET_ERROR: u8 = 0x01;
pub const RET_NOT_SUPPORTED: u8 = 0x02;
pub const RET_WRONG_PARAM: u8 = 0x03;
pub const RET_OPERATION_DENIED: u8 = 0x04;

/// Radio telegram types
pub const RORG_RPS: u8 = 0xF6;
pub const RORG_1BS: u8 = 0xD5;
pub const RORG_4BS: u8 = 0xA5;
pub const RORG_VLD: u8 = 0xD2;

/// Broadcast destination
pub const BROADCAST_ID: u32 = 0xFFFF_FFFF;

/// Data plus optional data the receiver accepts
pub const RX_CAPACITY: usize = 128;

/// Unsolicited packets kept while a command waits for its response
pub const PENDING_CAPACITY: usize = 4;

const TX_CAPACITY: usize = 64;
const VERSION_RESPONSE_LEN: usize = 32;

/// CO_RD_VERSION answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub app_version: [u8; 4],
    pub api_version: [u8; 4],
    pub chip_id: u32,
    pub chip_version: u32,
    pub description: heapless::String<16>,
}

impl VersionInfo {
    fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < VERSION_RESPONSE_LEN {
            return Err(Error::InvalidResponse);
        }
        let word = |at: usize| u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]);
        let mut description = heapless::String::new();
        for &b in data[16..32].iter().take_while(|&&b| b != 0) {
            let c = if b.is_ascii() { b as char } else { '?' };
            // 16 bytes into a 16-byte string cannot overflow
            let _ = description.push(c);
        }
        Ok(Self {
            app_version: [data[0], data[1], data[2], data[3]],
            api_version: [data[4], data[5], data[6], data[7]],
            chip_id: word(8),
            chip_version: word(12),
            description,
        })
    }
}

/// CO_RD_IDBASE answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IdBase {
    pub base_id: u32,
    /// Base ID changes left, when the module reports it
    pub remaining_writes: Option<u8>,
}

/// Copy of a packet that arrived during a command exchange
#[derive(Debug, Clone)]
struct PendingPacket {
    packet_type: PacketType,
    body: heapless::Vec<u8, RX_CAPACITY>,
    data_len: usize,
}

impl PendingPacket {
    fn capture(packet: &Esp3Packet<'_>) -> Self {
        let mut body = heapless::Vec::new();
        // The parser bounds data plus optional data by RX_CAPACITY
        let _ = body.extend_from_slice(packet.data);
        let _ = body.extend_from_slice(packet.optional);
        Self {
            packet_type: packet.packet_type,
            body,
            data_len: packet.data.len(),
        }
    }

    fn packet(&self) -> Esp3Packet<'_> {
        Esp3Packet {
            packet_type: self.packet_type,
            data: &self.body[..self.data_len],
            optional: &self.body[self.data_len..],
        }
    }
}

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnOcean2Config {
    /// Wait for a command response
    pub timeout_ms: u32,
    /// Module restart time after CO_WR_RESET
    pub reset_time_ms: u32,
}

impl Default for EnOcean2Config {
    fn default() -> Self {
        Self {
            timeout_ms: 500,
            reset_time_ms: 100,
        }
    }
}

/// EnOcean 2 Click driver
pub struct EnOcean2<UART> {
    uart: UART,
    config: EnOcean2Config,
    parser: Esp3Parser<RX_CAPACITY>,
    pending: Deque<PendingPacket, PENDING_CAPACITY>,
}

impl<UART> EnOcean2<UART>
where
    UART: Read + Write + ReadReady,
{
    pub fn new(uart: UART, config: EnOcean2Config) -> Self {
        Self {
            uart,
            config,
            parser: Esp3Parser::new(),
            pending: Deque::new(),
        }
    }

    pub fn release(self) -> UART {
        self.uart
    }

    /// Frame and transmit one packet
    pub async fn send_packet(
        &mut self,
        packet_type: PacketType,
        data: &[u8],
        optional: &[u8],
    ) -> Result<()> {
        let mut buf = [0u8; TX_CAPACITY];
        let len = encode_packet(packet_type, data, optional, &mut buf)?;
        self.uart
            .write_all(&buf[..len])
            .await
            .map_err(Error::uart)?;
        self.uart.flush().await.map_err(Error::uart)
    }

    async fn next_byte(&mut self) -> Result<Option<u8>> {
        if !self.uart.read_ready().map_err(Error::uart)? {
            return Ok(None);
        }
        let mut byte = [0u8; 1];
        match self.uart.read(&mut byte).await.map_err(Error::uart)? {
            1 => Ok(Some(byte[0])),
            _ => Ok(None),
        }
    }

    /// Feed one byte; CRC failures are logged by the parser and skipped
    fn feed(&mut self, byte: u8) -> bool {
        match self.parser.push(byte) {
            Ok(done) => done,
            Err(_) => false,
        }
    }

    /// Wait for the `Response` packet and copy its data (return code removed)
    async fn wait_response(&mut self, out: &mut [u8]) -> Result<usize> {
        let mut budget = self.config.timeout_ms;
        loop {
            let Some(byte) = self.next_byte().await? else {
                if budget == 0 {
                    crate::log_warn!("ESP3: response timeout");
                    return Err(Error::Timeout);
                }
                budget -= 1;
                delay_ms(1).await;
                continue;
            };
            if !self.feed(byte) {
                continue;
            }
            let Some(packet) = self.parser.packet() else {
                continue;
            };
            if packet.packet_type != PacketType::Response {
                let pending = PendingPacket::capture(&packet);
                if self.pending.is_full() {
                    crate::log_warn!("ESP3: pending queue full, dropping oldest");
                    self.pending.pop_front();
                }
                let _ = self.pending.push_back(pending);
                continue;
            }
            let (&code, data) = packet.data.split_first().ok_or(Error::InvalidResponse)?;
            if code != RET_OK {
                crate::log_warn!("ESP3: command failed with return code {}", code);
                return Err(Error::Status(u16::from(code)));
            }
            let dest = out.get_mut(..data.len()).ok_or(Error::BufferTooSmall)?;
            dest.copy_from_slice(data);
            return Ok(data.len());
        }
    }

    /// Run a common command and return the response data length
    pub async fn send_common_command(&mut self, code: u8, args: &[u8], out: &mut [u8]) -> Result<usize> {
        let mut data = [0u8; TX_CAPACITY];
        let len = args.len() + 1;
        let frame = data.get_mut(..len).ok_or(Error::InvalidArgument)?;
        frame[0] = code;
        frame[1..].copy_from_slice(args);
        self.send_packet(PacketType::CommonCommand, &data[..len], &[])
            .await?;
        self.wait_response(out).await
    }

    /// Dispatch every complete packet already received
    ///
    /// Packets that arrived during a command exchange come first. Never
    /// waits for data; returns how many packets reached `handler`.
    pub async fn process<F>(&mut self, mut handler: F) -> Result<usize>
    where
        F: FnMut(&Esp3Packet<'_>),
    {
        let mut count = 0;
        while let Some(pending) = self.pending.pop_front() {
            handler(&pending.packet());
            count += 1;
        }
        while let Some(byte) = self.next_byte().await? {
            if self.feed(byte) {
                if let Some(packet) = self.parser.packet() {
                    handler(&packet);
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    /// Restart the module firmware
    pub async fn reset(&mut self) -> Result<()> {
        self.send_common_command(CO_WR_RESET, &[], &mut []).await?;
        delay_ms(self.config.reset_time_ms).await;
        self.parser.reset();
        Ok(())
    }

    pub async fn read_version(&mut self) -> Result<VersionInfo> {
        let mut out = [0u8; VERSION_RESPONSE_LEN];
        let len = self.send_common_command(CO_RD_VERSION, &[], &mut out).await?;
        VersionInfo::parse(&out[..len])
    }

    pub async fn read_id_base(&mut self) -> Result<IdBase> {
        // The remaining-writes count travels as optional data and is not
        // copied by `wait_response`, so read the packet here.
        self.send_packet(PacketType::CommonCommand, &[CO_RD_IDBASE], &[])
            .await?;
        let mut out = [0u8; 4];
        let len = self.wait_response(&mut out).await?;
        if len < 4 {
            return Err(Error::InvalidResponse);
        }
        let remaining_writes = self
            .parser
            .packet()
            .and_then(|p| p.optional.first().copied());
        Ok(IdBase {
            base_id: u32::from_be_bytes(out),
            remaining_writes,
        })
    }

    /// Transmit an ERP1 radio telegram
    ///
    /// `sender_id` must lie in the module's base ID range or be its chip ID.
    pub async fn send_radio_telegram(
        &mut self,
        rorg: u8,
        payload: &[u8],
        sender_id: u32,
        status: u8,
        destination: u32,
    ) -> Result<()> {
        let mut data = [0u8; TX_CAPACITY];
        let len = 1 + payload.len() + 4 + 1;
        let frame = data.get_mut(..len).ok_or(Error::InvalidArgument)?;
        frame[0] = rorg;
        frame[1..1 + payload.len()].copy_from_slice(payload);
        frame[1 + payload.len()..len - 1].copy_from_slice(&sender_id.to_be_bytes());
        frame[len - 1] = status;

        // SubTelNum 3, destination, dBm 0xFF (send), no security
        let [d3, d2, d1, d0] = destination.to_be_bytes();
        let optional = [0x03, d3, d2, d1, d0, 0xFF, 0x00];

        self.send_packet(PacketType::RadioErp1, &data[..len], &optional)
            .await?;
        self.wait_response(&mut []).await?;
        Ok(())
    }
}
