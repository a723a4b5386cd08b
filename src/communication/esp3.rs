//! EnOcean Serial Protocol 3 (ESP3)
//!
//! ```text
//! 0x55 | data len (BE u16) | opt len | type | CRC8 hdr | data | opt | CRC8 data
//! ```
//!
//! Header CRC covers the four bytes after the sync byte; data CRC covers
//! data and optional data together.

use crate::communication::crc::crc8;
use crate::platform::{Error, Result};
use heapless::Vec;

/// Sync byte starting every packet
pub const SYNC_BYTE: u8 = 0x55;

/// Sync, four header bytes, header CRC
pub const HEADER_LEN: usize = 6;

/// Packet type byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketType {
    RadioErp1,
    Response,
    RadioSubTel,
    Event,
    CommonCommand,
    SmartAckCommand,
    RemoteManCommand,
    RadioMessage,
    RadioErp2,
    Other(u8),
}

impl PacketType {
    pub fn value(self) -> u8 {
        match self {
            PacketType::RadioErp1 => 0x01,
            PacketType::Response => 0x02,
            PacketType::RadioSubTel => 0x03,
            PacketType::Event => 0x04,
            PacketType::CommonCommand => 0x05,
            PacketType::SmartAckCommand => 0x06,
            PacketType::RemoteManCommand => 0x07,
            PacketType::RadioMessage => 0x09,
            PacketType::RadioErp2 => 0x0A,
            PacketType::Other(v) => v,
        }
    }
}

impl From<u8> for PacketType {
    fn from(value: u8) -> Self {
        match value {
            0x01 => PacketType::RadioErp1,
            0x02 => PacketType::Response,
            0x03 => PacketType::RadioSubTel,
            0x04 => PacketType::Event,
            0x05 => PacketType::CommonCommand,
            0x06 => PacketType::SmartAckCommand,
            0x07 => PacketType::RemoteManCommand,
            0x09 => PacketType::RadioMessage,
            0x0A => PacketType::RadioErp2,
            other => PacketType::Other(other),
        }
    }
}

/// A received packet, borrowed from the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Esp3Packet<'a> {
    pub packet_type: PacketType,
    pub data: &'a [u8],
    pub optional: &'a [u8],
}

/// Serialize a packet into `out`, returning its length
pub fn encode_packet(
    packet_type: PacketType,
    data: &[u8],
    optional: &[u8],
    out: &mut [u8],
) -> Result<usize> {
    let data_len = u16::try_from(data.len()).map_err(|_| Error::InvalidArgument)?;
    let opt_len = u8::try_from(optional.len()).map_err(|_| Error::InvalidArgument)?;
    let body_end = HEADER_LEN + data.len() + optional.len();
    let total = body_end + 1;
    if out.len() < total {
        return Err(Error::BufferTooSmall);
    }

    out[0] = SYNC_BYTE;
    out[1..3].copy_from_slice(&data_len.to_be_bytes());
    out[3] = opt_len;
    out[4] = packet_type.value();
    out[5] = crc8(&out[1..5]);
    out[HEADER_LEN..HEADER_LEN + data.len()].copy_from_slice(data);
    out[HEADER_LEN + data.len()..body_end].copy_from_slice(optional);
    out[body_end] = crc8(&out[HEADER_LEN..body_end]);

    Ok(total)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Sync,
    Header,
    Body,
    DataCrc,
}

/// Incremental ESP3 receiver
///
/// Feed bytes one at a time with `push`. A header CRC failure resynchronises
/// on the next sync byte inside the rejected header; a data CRC failure drops
/// the packet. `N` bounds data plus optional data.
pub struct Esp3Parser<const N: usize> {
    state: State,
    header: [u8; 5],
    header_filled: usize,
    body: Vec<u8, N>,
    data_len: usize,
    opt_len: usize,
    packet_type: PacketType,
    ready: bool,
}

impl<const N: usize> Default for Esp3Parser<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Esp3Parser<N> {
    pub fn new() -> Self {
        Self {
            state: State::Sync,
            header: [0u8; 5],
            header_filled: 0,
            body: Vec::new(),
            data_len: 0,
            opt_len: 0,
            packet_type: PacketType::Other(0),
            ready: false,
        }
    }

    /// Drop any partial packet
    pub fn reset(&mut self) {
        self.state = State::Sync;
        self.header_filled = 0;
        self.body.clear();
        self.ready = false;
    }

    /// Feed one byte
    ///
    /// Returns `Ok(true)` when a complete packet is available from
    /// `packet()`, `Err(Error::Crc)` when a packet was rejected and
    /// `Err(Error::BufferTooSmall)` when the announced length exceeds `N`.
    pub fn push(&mut self, byte: u8) -> Result<bool> {
        if self.ready {
            self.reset();
        }

        match self.state {
            State::Sync => {
                if byte == SYNC_BYTE {
                    self.header_filled = 0;
                    self.state = State::Header;
                }
                Ok(false)
            }
            State::Header => {
                self.header[self.header_filled] = byte;
                self.header_filled += 1;
                if self.header_filled < self.header.len() {
                    return Ok(false);
                }
                self.finish_header()
            }
            State::Body => {
                // Capacity was checked against the header
                let _ = self.body.push(byte);
                if self.body.len() == self.data_len + self.opt_len {
                    self.state = State::DataCrc;
                }
                Ok(false)
            }
            State::DataCrc => {
                if crc8(&self.body) != byte {
                    crate::log_warn!("ESP3: data CRC mismatch");
                    self.reset();
                    return Err(Error::Crc);
                }
                self.state = State::Sync;
                self.ready = true;
                Ok(true)
            }
        }
    }

    fn finish_header(&mut self) -> Result<bool> {
        if crc8(&self.header[..4]) != self.header[4] {
            crate::log_warn!("ESP3: header CRC mismatch");
            let rejected = self.header;
            self.reset();
            // Look for a sync byte inside the rejected header
            if let Some(pos) = rejected.iter().position(|&b| b == SYNC_BYTE) {
                for &b in &rejected[pos..] {
                    let _ = self.push(b);
                }
            }
            return Err(Error::Crc);
        }

        self.data_len = usize::from(u16::from_be_bytes([self.header[0], self.header[1]]));
        self.opt_len = usize::from(self.header[2]);
        self.packet_type = PacketType::from(self.header[3]);
        self.body.clear();

        if self.data_len + self.opt_len > N {
            crate::log_warn!("ESP3: packet of {} bytes dropped", self.data_len + self.opt_len);
            self.reset();
            return Err(Error::BufferTooSmall);
        }

        self.state = if self.data_len + self.opt_len == 0 {
            State::DataCrc
        } else {
            State::Body
        };
        Ok(false)
    }

    /// The packet completed by the last `push`
    pub fn packet(&self) -> Option<Esp3Packet<'_>> {
        if !self.ready {
            return None;
        }
        Some(Esp3Packet {
            packet_type: self.packet_type,
            data: &self.body[..self.data_len],
            optional: &self.body[self.data_len..],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(packet_type: PacketType, data: &[u8], optional: &[u8]) -> std::vec::Vec<u8> {
        let mut buf = [0u8; 64];
        let len = encode_packet(packet_type, data, optional, &mut buf).unwrap();
        buf[..len].to_vec()
    }

    fn feed<const N: usize>(parser: &mut Esp3Parser<N>, bytes: &[u8]) -> usize {
        bytes
            .iter()
            .filter(|&&b| matches!(parser.push(b), Ok(true)))
            .count()
    }

    #[test]
    fn test_read_version_command_bytes() {
        // CO_RD_VERSION
        assert_eq!(
            encode(PacketType::CommonCommand, &[0x03], &[]),
            vec![0x55, 0x00, 0x01, 0x00, 0x05, 0x70, 0x03, 0x09]
        );
    }

    #[test]
    fn test_parse_packet_with_optional_data() {
        let bytes = encode(PacketType::RadioErp1, &[0xF6, 0x50, 1, 2, 3, 4, 0x30], &[0x01, 0xFF]);
        let mut parser: Esp3Parser<32> = Esp3Parser::new();

        let mut completed = false;
        for &b in &bytes {
            completed = parser.push(b).unwrap();
        }

        assert!(completed);
        let packet = parser.packet().unwrap();
        assert_eq!(packet.packet_type, PacketType::RadioErp1);
        assert_eq!(packet.data, &[0xF6, 0x50, 1, 2, 3, 4, 0x30]);
        assert_eq!(packet.optional, &[0x01, 0xFF]);
    }

    #[test]
    fn test_garbage_before_sync_is_skipped() {
        let mut bytes = vec![0x00, 0x12, 0xFF];
        bytes.extend(encode(PacketType::Response, &[0x00], &[]));
        let mut parser: Esp3Parser<16> = Esp3Parser::new();

        assert_eq!(feed(&mut parser, &bytes), 1);
    }

    #[test]
    fn test_data_crc_error() {
        let mut bytes = encode(PacketType::Response, &[0x00, 0x01], &[]);
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let mut parser: Esp3Parser<16> = Esp3Parser::new();

        let results: std::vec::Vec<_> = bytes.iter().map(|&b| parser.push(b)).collect();
        assert_eq!(results.last(), Some(&Err(Error::Crc)));
        assert!(parser.packet().is_none());
    }

    #[test]
    fn test_resync_inside_bad_header() {
        // A stray 0x55 followed by a real packet: the first "header" fails its
        // CRC and the parser recovers on the real sync byte.
        let packet = encode(PacketType::Response, &[0x00], &[]);
        let mut bytes = vec![0x55, 0x00];
        bytes.extend(&packet);
        let mut parser: Esp3Parser<16> = Esp3Parser::new();

        assert_eq!(feed(&mut parser, &bytes), 1);
        assert_eq!(parser.packet().unwrap().data, &[0x00]);
    }

    #[test]
    fn test_oversized_packet_rejected() {
        let bytes = encode(PacketType::RadioErp1, &[0u8; 20], &[]);
        let mut parser: Esp3Parser<8> = Esp3Parser::new();

        let errors = bytes
            .iter()
            .filter(|&&b| parser.push(b) == Err(Error::BufferTooSmall))
            .count();
        assert_eq!(errors, 1);
    }

    #[test]
    fn test_packet_type_round_trip() {
        for value in 0u8..=0x0B {
            assert_eq!(PacketType::from(value).value(), value);
        }
    }
}
