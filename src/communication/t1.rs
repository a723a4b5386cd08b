//! T=1 block transport over I2C (SE05x secure elements)
//!
//! ## Block format
//!
//! ```text
//! +-----+-----+-----+----------------+--------+--------+
//! | NAD | PCB | LEN | INF (LEN bytes)| CRC hi | CRC lo |
//! +-----+-----+-----+----------------+--------+--------+
//! ```
//!
//! - NAD: `0x5A` host to SE, `0xA5` SE to host
//! - LEN: 0..=254 (IFSC)
//! - CRC: CRC-16/X-25 over NAD..INF, high byte first
//!
//! ## PCB
//!
//! - I-block `0 N(S) M 0 0000`: information, sequence bit, chaining bit
//! - R-block `1 0 0 N(R) 00 EE`: acknowledge / error report
//! - S-block `1 1 R 0 CCCC`: supervisory, R set on responses
//!
//! The SE NACKs its address while it is still processing, so reading the
//! block header is retried with a short delay.

use crate::communication::crc::crc16_x25;
use crate::core::time::delay_ms;
use crate::platform::{Error, Result};
use embedded_hal_async::i2c::I2c;

/// Node address of blocks sent to the SE
pub const NAD_HOST_TO_SE: u8 = 0x5A;

/// Node address of blocks sent by the SE
pub const NAD_SE_TO_HOST: u8 = 0xA5;

/// Maximum information field size
pub const MAX_INFO_LEN: usize = 254;

/// NAD, PCB, LEN
pub const HEADER_LEN: usize = 3;

/// CRC trailer length
pub const CRC_LEN: usize = 2;

/// Largest block on the wire
pub const MAX_FRAME_LEN: usize = HEADER_LEN + MAX_INFO_LEN + CRC_LEN;

/// R-block error code: checksum error
const R_ERROR_CRC: u8 = 0x01;

/// R-block error code: other error
const R_ERROR_OTHER: u8 = 0x02;

/// Supervisory block kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SBlock {
    /// Reset sequence counters
    Resync,
    /// Information field size negotiation
    Ifs,
    /// Abort a chain
    Abort,
    /// Waiting time extension
    Wtx,
    /// Close the APDU session
    EndApduSession,
    /// Cold reset of the chip
    ChipReset,
    /// Read the answer-to-reset
    GetAtr,
    /// Reset the T=1 interface
    SoftReset,
}

impl SBlock {
    fn code(self) -> u8 {
        match self {
            SBlock::Resync => 0x00,
            SBlock::Ifs => 0x01,
            SBlock::Abort => 0x02,
            SBlock::Wtx => 0x03,
            SBlock::EndApduSession => 0x05,
            SBlock::ChipReset => 0x06,
            SBlock::GetAtr => 0x07,
            SBlock::SoftReset => 0x0F,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(SBlock::Resync),
            0x01 => Some(SBlock::Ifs),
            0x02 => Some(SBlock::Abort),
            0x03 => Some(SBlock::Wtx),
            0x05 => Some(SBlock::EndApduSession),
            0x06 => Some(SBlock::ChipReset),
            0x07 => Some(SBlock::GetAtr),
            0x0F => Some(SBlock::SoftReset),
            _ => None,
        }
    }
}

/// Protocol control byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pcb {
    /// Information block
    Information { ns: bool, more: bool },
    /// Receive-ready block (`error` is the 2-bit error code)
    Receive { nr: bool, error: u8 },
    /// Supervisory block
    Supervisory { block: SBlock, response: bool },
}

impl Pcb {
    /// Wire value
    pub fn encode(self) -> u8 {
        match self {
            Pcb::Information { ns, more } => (u8::from(ns) << 6) | (u8::from(more) << 5),
            Pcb::Receive { nr, error } => 0x80 | (u8::from(nr) << 4) | (error & 0x03),
            Pcb::Supervisory { block, response } => {
                0xC0 | (u8::from(response) << 5) | block.code()
            }
        }
    }

    /// Parse a wire value
    pub fn decode(byte: u8) -> Result<Self> {
        match byte & 0xC0 {
            0x00 | 0x40 => Ok(Pcb::Information {
                ns: byte & 0x40 != 0,
                more: byte & 0x20 != 0,
            }),
            0x80 => Ok(Pcb::Receive {
                nr: byte & 0x10 != 0,
                error: byte & 0x03,
            }),
            _ => SBlock::from_code(byte & 0x0F)
                .map(|block| Pcb::Supervisory {
                    block,
                    response: byte & 0x20 != 0,
                })
                .ok_or(Error::InvalidResponse),
        }
    }
}

/// A parsed block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub nad: u8,
    pub pcb: Pcb,
    pub info: &'a [u8],
}

/// Build a block into `out`, returning its length
pub fn encode_frame(nad: u8, pcb: Pcb, info: &[u8], out: &mut [u8]) -> Result<usize> {
    if info.len() > MAX_INFO_LEN {
        return Err(Error::InvalidArgument);
    }
    let body_end = HEADER_LEN + info.len();
    let total = body_end + CRC_LEN;
    if out.len() < total {
        return Err(Error::BufferTooSmall);
    }

    out[0] = nad;
    out[1] = pcb.encode();
    out[2] = info.len() as u8;
    out[HEADER_LEN..body_end].copy_from_slice(info);
    let crc = crc16_x25(&out[..body_end]);
    out[body_end..total].copy_from_slice(&crc.to_be_bytes());

    Ok(total)
}

/// Parse and verify a block received from the SE
pub fn decode_frame(data: &[u8]) -> Result<Frame<'_>> {
    if data.len() < HEADER_LEN + CRC_LEN {
        return Err(Error::InvalidResponse);
    }
    if data[0] != NAD_SE_TO_HOST {
        crate::log_warn!("T=1: unexpected NAD {:#x}", data[0]);
        return Err(Error::InvalidResponse);
    }

    let len = usize::from(data[2]);
    let body_end = HEADER_LEN + len;
    if len > MAX_INFO_LEN || data.len() != body_end + CRC_LEN {
        return Err(Error::InvalidResponse);
    }

    let expected = crc16_x25(&data[..body_end]);
    let received = u16::from_be_bytes([data[body_end], data[body_end + 1]]);
    if expected != received {
        crate::log_warn!(
            "T=1: CRC mismatch (expected {:#x}, received {:#x})",
            expected,
            received
        );
        return Err(Error::Crc);
    }

    Ok(Frame {
        nad: data[0],
        pcb: Pcb::decode(data[1])?,
        info: &data[HEADER_LEN..body_end],
    })
}

/// Transport configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct T1Config {
    /// 7-bit I2C address of the SE
    pub address: u8,
    /// Header read attempts while the SE NACKs
    pub max_read_retries: u32,
    /// Delay between header read attempts
    pub retry_delay_ms: u32,
}

impl Default for T1Config {
    fn default() -> Self {
        Self {
            address: 0x48,
            max_read_retries: 100,
            retry_delay_ms: 2,
        }
    }
}

/// T=1 session with one SE
///
/// Owns the block buffer and the sequence counters of both directions.
pub struct T1Transport<I2C> {
    i2c: I2C,
    config: T1Config,
    /// N(S) of the next I-block we send
    send_seq: bool,
    /// N(S) expected on the next I-block from the SE
    recv_seq: bool,
    ifsc: usize,
    frame: [u8; MAX_FRAME_LEN],
}

impl<I2C> T1Transport<I2C>
where
    I2C: I2c,
{
    /// Create a transport; no bus traffic
    pub fn new(i2c: I2C, config: T1Config) -> Self {
        Self {
            i2c,
            config,
            send_seq: false,
            recv_seq: false,
            ifsc: MAX_INFO_LEN,
            frame: [0u8; MAX_FRAME_LEN],
        }
    }

    /// Give the bus back
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Current information field size used for chaining
    pub fn ifsc(&self) -> usize {
        self.ifsc
    }

    fn reset_sequence(&mut self) {
        self.send_seq = false;
        self.recv_seq = false;
    }

    /// Send one block and receive the answer
    ///
    /// Returns the answer's PCB and information length; the information is
    /// left in the internal frame buffer (`received_info`).
    pub async fn transceive_frame(&mut self, pcb: Pcb, info: &[u8]) -> Result<(Pcb, usize)> {
        let len = encode_frame(NAD_HOST_TO_SE, pcb, info, &mut self.frame)?;
        crate::log_trace!("T=1 TX pcb={:#x} len={}", self.frame[1], info.len());
        self.i2c
            .write(self.config.address, &self.frame[..len])
            .await
            .map_err(Error::i2c)?;

        self.read_header().await?;

        let info_len = usize::from(self.frame[2]);
        if info_len > MAX_INFO_LEN {
            return Err(Error::InvalidResponse);
        }
        let total = HEADER_LEN + info_len + CRC_LEN;
        self.i2c
            .read(self.config.address, &mut self.frame[HEADER_LEN..total])
            .await
            .map_err(Error::i2c)?;

        let frame = decode_frame(&self.frame[..total])?;
        crate::log_trace!("T=1 RX pcb={:#x} len={}", self.frame[1], info_len);
        Ok((frame.pcb, info_len))
    }

    /// Information field of the last received block
    pub fn received_info(&self, len: usize) -> &[u8] {
        &self.frame[HEADER_LEN..HEADER_LEN + len]
    }

    async fn read_header(&mut self) -> Result<()> {
        let mut attempt = 0;
        loop {
            match self
                .i2c
                .read(self.config.address, &mut self.frame[..HEADER_LEN])
                .await
            {
                Ok(()) => return Ok(()),
                Err(_) if attempt < self.config.max_read_retries => {
                    attempt += 1;
                    delay_ms(self.config.retry_delay_ms).await;
                }
                Err(_) => {
                    crate::log_warn!("T=1: no answer after {} retries", attempt);
                    return Err(Error::Timeout);
                }
            }
        }
    }

    /// Exchange a block, answering waiting-time-extension requests
    async fn exchange_block(&mut self, pcb: Pcb, info: &[u8]) -> Result<(Pcb, usize)> {
        let mut answer = self.transceive_frame(pcb, info).await;
        loop {
            match answer {
                Ok((
                    Pcb::Supervisory {
                        block: SBlock::Wtx,
                        response: false,
                    },
                    len,
                )) => {
                    let mut multiplier = [0u8; 1];
                    if len >= 1 {
                        multiplier[0] = self.frame[HEADER_LEN];
                    }
                    crate::log_debug!("T=1: WTX request x{}", multiplier[0]);
                    let echo = Pcb::Supervisory {
                        block: SBlock::Wtx,
                        response: true,
                    };
                    answer = self.transceive_frame(echo, &multiplier[..len.min(1)]).await;
                }
                Err(Error::Crc) => {
                    self.report_error(R_ERROR_CRC).await?;
                    return Err(Error::Crc);
                }
                other => return other,
            }
        }
    }

    /// Tell the SE the last block was not accepted
    async fn report_error(&mut self, code: u8) -> Result<()> {
        let pcb = Pcb::Receive {
            nr: self.recv_seq,
            error: code,
        };
        let len = encode_frame(NAD_HOST_TO_SE, pcb, &[], &mut self.frame)?;
        self.i2c
            .write(self.config.address, &self.frame[..len])
            .await
            .map_err(Error::i2c)
    }

    /// Exchange an APDU, chaining in both directions as needed
    ///
    /// Returns the response length written to `response` (data and status
    /// word).
    pub async fn transceive(&mut self, apdu: &[u8], response: &mut [u8]) -> Result<usize> {
        if apdu.is_empty() {
            return Err(Error::InvalidArgument);
        }

        // Command chain
        let mut offset = 0;
        let (mut pcb, mut len) = loop {
            let chunk = (apdu.len() - offset).min(self.ifsc);
            let more = offset + chunk < apdu.len();
            let block = Pcb::Information {
                ns: self.send_seq,
                more,
            };
            let answer = self
                .exchange_block(block, &apdu[offset..offset + chunk])
                .await?;
            self.send_seq = !self.send_seq;
            offset += chunk;

            if !more {
                break answer;
            }
            match answer.0 {
                Pcb::Receive { nr, error: 0 } if nr == self.send_seq => {}
                _ => {
                    crate::log_warn!("T=1: chained block not acknowledged");
                    return Err(Error::InvalidResponse);
                }
            }
        };

        // Response chain
        let mut written = 0;
        loop {
            let more = match pcb {
                Pcb::Information { ns, more } if ns == self.recv_seq => more,
                _ => {
                    crate::log_warn!("T=1: unexpected block {:#x}", pcb.encode());
                    return Err(Error::InvalidResponse);
                }
            };

            let end = written + len;
            if end > response.len() {
                return Err(Error::BufferTooSmall);
            }
            response[written..end].copy_from_slice(&self.frame[HEADER_LEN..HEADER_LEN + len]);
            written = end;
            self.recv_seq = !self.recv_seq;

            if !more {
                return Ok(written);
            }

            let ack = Pcb::Receive {
                nr: self.recv_seq,
                error: 0,
            };
            (pcb, len) = self.exchange_block(ack, &[]).await?;
        }
    }

    /// Send an S-block request and check the matching response
    async fn supervisory(&mut self, block: SBlock, info: &[u8]) -> Result<usize> {
        let request = Pcb::Supervisory {
            block,
            response: false,
        };
        let (pcb, len) = self.exchange_block(request, info).await?;
        if pcb
            != (Pcb::Supervisory {
                block,
                response: true,
            })
        {
            crate::log_warn!("T=1: S-block {:#x} answered with {:#x}", request.encode(), pcb.encode());
            return Err(Error::InvalidResponse);
        }
        Ok(len)
    }

    /// Read the answer-to-reset into `out`
    pub async fn get_atr(&mut self, out: &mut [u8]) -> Result<usize> {
        let len = self.supervisory(SBlock::GetAtr, &[]).await?;
        let atr = out.get_mut(..len).ok_or(Error::BufferTooSmall)?;
        atr.copy_from_slice(&self.frame[HEADER_LEN..HEADER_LEN + len]);
        Ok(len)
    }

    /// Reset the T=1 interface; sequence counters restart
    pub async fn soft_reset(&mut self) -> Result<()> {
        self.supervisory(SBlock::SoftReset, &[]).await?;
        self.reset_sequence();
        Ok(())
    }

    /// Cold-reset the SE; sequence counters restart
    pub async fn chip_reset(&mut self) -> Result<()> {
        self.supervisory(SBlock::ChipReset, &[]).await?;
        self.reset_sequence();
        Ok(())
    }

    /// Close the APDU session
    pub async fn end_session(&mut self) -> Result<()> {
        self.supervisory(SBlock::EndApduSession, &[]).await?;
        Ok(())
    }

    /// Resynchronise sequence counters with the SE
    pub async fn resync(&mut self) -> Result<()> {
        self.supervisory(SBlock::Resync, &[]).await?;
        self.reset_sequence();
        Ok(())
    }

    /// Negotiate the information field size the SE accepts from us
    pub async fn negotiate_ifsc(&mut self, size: u8) -> Result<()> {
        if size == 0 || usize::from(size) > MAX_INFO_LEN {
            return Err(Error::InvalidArgument);
        }
        let len = self.supervisory(SBlock::Ifs, &[size]).await?;
        if len != 1 {
            return Err(Error::InvalidResponse);
        }
        let accepted = usize::from(self.frame[HEADER_LEN]);
        if !(1..=MAX_INFO_LEN).contains(&accepted) {
            crate::log_warn!("T=1: SE answered IFS {}, keeping {}", accepted, self.ifsc);
            return Err(Error::InvalidResponse);
        }
        self.ifsc = accepted;
        Ok(())
    }

    /// Abort a chain in progress
    pub async fn abort(&mut self) -> Result<()> {
        self.supervisory(SBlock::Abort, &[]).await?;
        Ok(())
    }

    /// Report a non-CRC protocol error on the last block
    pub async fn reject_last_block(&mut self) -> Result<()> {
        self.report_error(R_ERROR_OTHER).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::platform::mock::{I2cTransaction, MockI2c};

    /// Block as sent by the SE
    pub(crate) fn se_frame(pcb: Pcb, info: &[u8]) -> Vec<u8> {
        let mut buf = [0u8; MAX_FRAME_LEN];
        let len = encode_frame(NAD_SE_TO_HOST, pcb, info, &mut buf).unwrap();
        buf[..len].to_vec()
    }

    fn i_block(ns: bool, more: bool) -> Pcb {
        Pcb::Information { ns, more }
    }

    #[test]
    fn test_pcb_values() {
        assert_eq!(i_block(false, false).encode(), 0x00);
        assert_eq!(i_block(true, true).encode(), 0x60);
        assert_eq!(Pcb::Receive { nr: true, error: 0 }.encode(), 0x90);
        assert_eq!(Pcb::Receive { nr: false, error: 1 }.encode(), 0x81);

        let pairs = [
            (SBlock::Resync, 0xC0, 0xE0),
            (SBlock::Ifs, 0xC1, 0xE1),
            (SBlock::Abort, 0xC2, 0xE2),
            (SBlock::Wtx, 0xC3, 0xE3),
            (SBlock::EndApduSession, 0xC5, 0xE5),
            (SBlock::ChipReset, 0xC6, 0xE6),
            (SBlock::GetAtr, 0xC7, 0xE7),
            (SBlock::SoftReset, 0xCF, 0xEF),
        ];
        for (block, request, response) in pairs {
            let req = Pcb::Supervisory {
                block,
                response: false,
            };
            let rsp = Pcb::Supervisory {
                block,
                response: true,
            };
            assert_eq!(req.encode(), request);
            assert_eq!(rsp.encode(), response);
            assert_eq!(Pcb::decode(response).unwrap(), rsp);
        }
    }

    #[test]
    fn test_decode_rejects_unknown_s_block() {
        assert_eq!(Pcb::decode(0xC4), Err(Error::InvalidResponse));
    }

    #[test]
    fn test_encode_frame_layout() {
        let mut buf = [0u8; 16];
        let len = encode_frame(NAD_HOST_TO_SE, i_block(false, false), &[0x01, 0x02], &mut buf)
            .unwrap();

        assert_eq!(len, 7);
        assert_eq!(&buf[..5], &[0x5A, 0x00, 0x02, 0x01, 0x02]);
        let crc = crc16_x25(&buf[..5]);
        assert_eq!(buf[5], (crc >> 8) as u8);
        assert_eq!(buf[6], crc as u8);
    }

    #[test]
    fn test_decode_frame_checks() {
        let frame = se_frame(i_block(false, false), &[0x90, 0x00]);
        let parsed = decode_frame(&frame).unwrap();
        assert_eq!(parsed.info, &[0x90, 0x00]);

        let mut corrupted = frame.clone();
        corrupted[3] ^= 0x01;
        assert_eq!(decode_frame(&corrupted), Err(Error::Crc));

        let mut wrong_nad = frame.clone();
        wrong_nad[0] = NAD_HOST_TO_SE;
        assert_eq!(decode_frame(&wrong_nad), Err(Error::InvalidResponse));

        assert_eq!(decode_frame(&frame[..frame.len() - 1]), Err(Error::InvalidResponse));
    }

    #[test]
    fn test_encode_rejects_oversized_info() {
        let mut buf = [0u8; MAX_FRAME_LEN + 8];
        let info = [0u8; MAX_INFO_LEN + 1];
        assert_eq!(
            encode_frame(NAD_HOST_TO_SE, i_block(false, false), &info, &mut buf),
            Err(Error::InvalidArgument)
        );
    }

    #[tokio::test]
    async fn test_simple_apdu_exchange() {
        let i2c = MockI2c::new();
        i2c.set_read_data(&se_frame(i_block(false, false), &[0xAB, 0x90, 0x00]));
        let mut t1 = T1Transport::new(i2c.clone(), T1Config::default());

        let mut response = [0u8; 8];
        let len = t1.transceive(&[0x80, 0x04, 0x00, 0x20], &mut response).await.unwrap();

        assert_eq!(&response[..len], &[0xAB, 0x90, 0x00]);
        let tx = &i2c.written()[0];
        assert_eq!(&tx[..3], &[0x5A, 0x00, 0x04]);
        assert_eq!(
            i2c.transactions()[1],
            I2cTransaction::Read {
                addr: 0x48,
                len: HEADER_LEN
            }
        );
    }

    #[tokio::test]
    async fn test_sequence_numbers_toggle() {
        let i2c = MockI2c::new();
        i2c.set_read_data(&se_frame(i_block(false, false), &[0x90, 0x00]));
        i2c.push_read_data(&se_frame(i_block(true, false), &[0x90, 0x00]));
        let mut t1 = T1Transport::new(i2c.clone(), T1Config::default());

        let mut response = [0u8; 4];
        t1.transceive(&[0x00], &mut response).await.unwrap();
        t1.transceive(&[0x00], &mut response).await.unwrap();

        let written = i2c.written();
        assert_eq!(written[0][1], 0x00);
        assert_eq!(written[1][1], 0x40);
    }

    #[tokio::test]
    async fn test_header_read_retries_while_busy() {
        let i2c = MockI2c::new();
        i2c.set_read_data(&se_frame(i_block(false, false), &[0x90, 0x00]));
        i2c.nack_next_reads(3);
        let mut t1 = T1Transport::new(i2c.clone(), T1Config::default());

        let mut response = [0u8; 4];
        assert_eq!(t1.transceive(&[0x00], &mut response).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_header_read_gives_up() {
        let i2c = MockI2c::new();
        i2c.nack_next_reads(10);
        let config = T1Config {
            max_read_retries: 4,
            ..T1Config::default()
        };
        let mut t1 = T1Transport::new(i2c, config);

        let mut response = [0u8; 4];
        assert_eq!(
            t1.transceive(&[0x00], &mut response).await,
            Err(Error::Timeout)
        );
    }

    #[tokio::test]
    async fn test_command_chaining() {
        let i2c = MockI2c::new();
        i2c.set_read_data(&se_frame(Pcb::Receive { nr: true, error: 0 }, &[]));
        i2c.push_read_data(&se_frame(i_block(false, false), &[0x90, 0x00]));
        let mut t1 = T1Transport::new(i2c.clone(), T1Config::default());

        let apdu = vec![0x11u8; 300];
        let mut response = [0u8; 4];
        t1.transceive(&apdu, &mut response).await.unwrap();

        let written = i2c.written();
        assert_eq!(written.len(), 2);
        assert_eq!(&written[0][..3], &[0x5A, 0x20, 254]);
        assert_eq!(&written[1][..3], &[0x5A, 0x40, 46]);
    }

    #[tokio::test]
    async fn test_response_chaining() {
        let i2c = MockI2c::new();
        i2c.set_read_data(&se_frame(i_block(false, true), &[1, 2, 3]));
        i2c.push_read_data(&se_frame(i_block(true, false), &[4, 0x90, 0x00]));
        let mut t1 = T1Transport::new(i2c.clone(), T1Config::default());

        let mut response = [0u8; 8];
        let len = t1.transceive(&[0x00], &mut response).await.unwrap();

        assert_eq!(&response[..len], &[1, 2, 3, 4, 0x90, 0x00]);
        // Second write is the R-block acknowledging N(S)=0
        assert_eq!(&i2c.written()[1][..3], &[0x5A, 0x90, 0x00]);
    }

    #[tokio::test]
    async fn test_wtx_request_is_echoed() {
        let wtx = Pcb::Supervisory {
            block: SBlock::Wtx,
            response: false,
        };
        let i2c = MockI2c::new();
        i2c.set_read_data(&se_frame(wtx, &[0x02]));
        i2c.push_read_data(&se_frame(i_block(false, false), &[0x90, 0x00]));
        let mut t1 = T1Transport::new(i2c.clone(), T1Config::default());

        let mut response = [0u8; 4];
        t1.transceive(&[0x00], &mut response).await.unwrap();

        assert_eq!(&i2c.written()[1][..4], &[0x5A, 0xE3, 0x01, 0x02]);
    }

    #[tokio::test]
    async fn test_crc_error_is_reported_not_retried() {
        let i2c = MockI2c::new();
        let mut frame = se_frame(i_block(false, false), &[0x90, 0x00]);
        let last = frame.len() - 1;
        frame[last] ^= 0xFF;
        i2c.set_read_data(&frame);
        let mut t1 = T1Transport::new(i2c.clone(), T1Config::default());

        let mut response = [0u8; 4];
        assert_eq!(t1.transceive(&[0x00], &mut response).await, Err(Error::Crc));

        let written = i2c.written();
        assert_eq!(written.len(), 2);
        assert_eq!(&written[1][..3], &[0x5A, 0x81, 0x00]);
    }

    #[tokio::test]
    async fn test_get_atr_and_soft_reset() {
        let atr_rsp = Pcb::Supervisory {
            block: SBlock::GetAtr,
            response: true,
        };
        let reset_rsp = Pcb::Supervisory {
            block: SBlock::SoftReset,
            response: true,
        };
        let i2c = MockI2c::new();
        i2c.set_read_data(&se_frame(atr_rsp, &[0x00, 0xA0, 0x00]));
        i2c.push_read_data(&se_frame(reset_rsp, &[]));
        let mut t1 = T1Transport::new(i2c.clone(), T1Config::default());

        let mut atr = [0u8; 8];
        let len = t1.get_atr(&mut atr).await.unwrap();
        t1.soft_reset().await.unwrap();

        assert_eq!(&atr[..len], &[0x00, 0xA0, 0x00]);
        let written = i2c.written();
        assert_eq!(written[0][1], 0xC7);
        assert_eq!(written[1][1], 0xCF);
    }

    #[tokio::test]
    async fn test_supervisory_mismatch() {
        let i2c = MockI2c::new();
        i2c.set_read_data(&se_frame(i_block(false, false), &[]));
        let mut t1 = T1Transport::new(i2c, T1Config::default());

        assert_eq!(t1.end_session().await, Err(Error::InvalidResponse));
    }

    #[tokio::test]
    async fn test_negotiate_ifsc() {
        let ifs_rsp = Pcb::Supervisory {
            block: SBlock::Ifs,
            response: true,
        };
        let i2c = MockI2c::new();
        i2c.set_read_data(&se_frame(ifs_rsp, &[0x80]));
        let mut t1 = T1Transport::new(i2c, T1Config::default());

        t1.negotiate_ifsc(0x80).await.unwrap();
        assert_eq!(t1.ifsc(), 0x80);
        assert_eq!(t1.negotiate_ifsc(0).await, Err(Error::InvalidArgument));
    }

    #[tokio::test]
    async fn test_negotiate_ifsc_rejects_unusable_answer() {
        let ifs_rsp = Pcb::Supervisory {
            block: SBlock::Ifs,
            response: true,
        };
        let i2c = MockI2c::new();
        i2c.set_read_data(&se_frame(ifs_rsp, &[0x80]));
        i2c.push_read_data(&se_frame(ifs_rsp, &[0x00]));
        i2c.push_read_data(&se_frame(ifs_rsp, &[0xFF]));
        let mut t1 = T1Transport::new(i2c, T1Config::default());

        t1.negotiate_ifsc(0x80).await.unwrap();
        assert_eq!(t1.negotiate_ifsc(0x40).await, Err(Error::InvalidResponse));
        assert_eq!(t1.ifsc(), 0x80);
        assert_eq!(t1.negotiate_ifsc(0xFE).await, Err(Error::InvalidResponse));
        assert_eq!(t1.ifsc(), 0x80);
    }
}
