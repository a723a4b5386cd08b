//! TLV codec for SE05x APDU payloads
//!
//! Every field is `tag, length, value`. Lengths follow the BER short/long
//! forms used by the applet:
//!
//! - `0x00..=0x7F`: one byte
//! - `0x80..=0xFF`: `0x81 LL`
//! - `0x100..=0xFFFF`: `0x82 HH LL`
//!
//! Integers are big-endian.

use crate::platform::{Error, Result};

/// Long-form length marker, one length byte follows
const LENGTH_ONE_BYTE: u8 = 0x81;

/// Long-form length marker, two length bytes follow
const LENGTH_TWO_BYTES: u8 = 0x82;

/// Number of bytes the length field of a `len`-byte value takes
pub fn length_field_size(len: usize) -> usize {
    match len {
        0..=0x7F => 1,
        0x80..=0xFF => 2,
        _ => 3,
    }
}

/// Encode `len` into `out`, returning the bytes written
pub fn encode_length(len: usize, out: &mut [u8]) -> Result<usize> {
    if len > 0xFFFF {
        return Err(Error::InvalidArgument);
    }
    let size = length_field_size(len);
    if out.len() < size {
        return Err(Error::BufferTooSmall);
    }
    match size {
        1 => out[0] = len as u8,
        2 => {
            out[0] = LENGTH_ONE_BYTE;
            out[1] = len as u8;
        }
        _ => {
            out[0] = LENGTH_TWO_BYTES;
            out[1..3].copy_from_slice(&(len as u16).to_be_bytes());
        }
    }
    Ok(size)
}

/// Decode a length field, returning `(length, bytes consumed)`
pub fn decode_length(data: &[u8]) -> Result<(usize, usize)> {
    match data {
        [LENGTH_ONE_BYTE, len, ..] => Ok((usize::from(*len), 2)),
        [LENGTH_TWO_BYTES, hi, lo, ..] => Ok((usize::from(u16::from_be_bytes([*hi, *lo])), 3)),
        [len, ..] if *len < 0x80 => Ok((usize::from(*len), 1)),
        _ => Err(Error::InvalidResponse),
    }
}

/// Appends TLV fields to a caller-provided buffer
pub struct TlvWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> TlvWriter<'a> {
    /// Start writing at the beginning of `buf`
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.pos
    }

    /// Nothing written yet
    pub fn is_empty(&self) -> bool {
        self.pos == 0
    }

    /// Encoded bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    /// Append bytes without a TLV header
    pub fn put_raw(&mut self, data: &[u8]) -> Result<()> {
        let end = self.pos + data.len();
        if end > self.buf.len() {
            return Err(Error::BufferTooSmall);
        }
        self.buf[self.pos..end].copy_from_slice(data);
        self.pos = end;
        Ok(())
    }

    fn put_header(&mut self, tag: u8, len: usize) -> Result<()> {
        self.put_raw(&[tag])?;
        let written = encode_length(len, &mut self.buf[self.pos..])?;
        self.pos += written;
        Ok(())
    }

    /// Append a one-byte field
    pub fn put_u8(&mut self, tag: u8, value: u8) -> Result<()> {
        self.put_bytes(tag, &[value])
    }

    /// Append a two-byte big-endian field
    pub fn put_u16(&mut self, tag: u8, value: u16) -> Result<()> {
        self.put_bytes(tag, &value.to_be_bytes())
    }

    /// Append a four-byte big-endian field
    pub fn put_u32(&mut self, tag: u8, value: u32) -> Result<()> {
        self.put_bytes(tag, &value.to_be_bytes())
    }

    /// Append a variable-length field
    pub fn put_bytes(&mut self, tag: u8, value: &[u8]) -> Result<()> {
        let start = self.pos;
        let result = self
            .put_header(tag, value.len())
            .and_then(|_| self.put_raw(value));
        if result.is_err() {
            self.pos = start;
        }
        result
    }
}

/// Walks the TLV fields of a response payload
pub struct TlvReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> TlvReader<'a> {
    /// Start reading at the beginning of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not consumed yet
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Tag of the next field
    pub fn peek_tag(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn next_field(&mut self) -> Result<(u8, &'a [u8])> {
        let rest = &self.data[self.pos..];
        let (&tag, after_tag) = rest.split_first().ok_or(Error::InvalidResponse)?;
        let (len, len_size) = decode_length(after_tag)?;
        let start = 1 + len_size;
        let value = rest
            .get(start..start + len)
            .ok_or(Error::InvalidResponse)?;
        self.pos += start + len;
        Ok((tag, value))
    }

    /// Read the next field, which must carry `tag`
    pub fn get_bytes(&mut self, tag: u8) -> Result<&'a [u8]> {
        let saved = self.pos;
        let (found, value) = self.next_field()?;
        if found != tag {
            crate::log_debug!("TLV tag mismatch: expected {:#x}, got {:#x}", tag, found);
            self.pos = saved;
            return Err(Error::InvalidResponse);
        }
        Ok(value)
    }

    fn get_array<const N: usize>(&mut self, tag: u8) -> Result<[u8; N]> {
        let saved = self.pos;
        let value = self.get_bytes(tag)?;
        value.try_into().map_err(|_| {
            self.pos = saved;
            Error::InvalidResponse
        })
    }

    /// Read a one-byte field
    pub fn get_u8(&mut self, tag: u8) -> Result<u8> {
        self.get_array::<1>(tag).map(|b| b[0])
    }

    /// Read a two-byte big-endian field
    pub fn get_u16(&mut self, tag: u8) -> Result<u16> {
        self.get_array(tag).map(u16::from_be_bytes)
    }

    /// Read a four-byte big-endian field
    pub fn get_u32(&mut self, tag: u8) -> Result<u32> {
        self.get_array(tag).map(u32::from_be_bytes)
    }

    /// Skip the next field, returning its tag
    pub fn skip(&mut self) -> Result<u8> {
        self.next_field().map(|(tag, _)| tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_fields() {
        let mut buf = [0u8; 32];
        let mut writer = TlvWriter::new(&mut buf);
        writer.put_u8(0x41, 0x7E).unwrap();
        writer.put_u16(0x42, 0x1234).unwrap();
        writer.put_u32(0x43, 0xDEAD_BEEF).unwrap();

        assert_eq!(
            writer.as_slice(),
            &[0x41, 0x01, 0x7E, 0x42, 0x02, 0x12, 0x34, 0x43, 0x04, 0xDE, 0xAD, 0xBE, 0xEF]
        );

        let len = writer.len();
        let mut reader = TlvReader::new(&buf[..len]);
        assert_eq!(reader.get_u8(0x41).unwrap(), 0x7E);
        assert_eq!(reader.get_u16(0x42).unwrap(), 0x1234);
        assert_eq!(reader.get_u32(0x43).unwrap(), 0xDEAD_BEEF);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_length_boundaries() {
        for (len, header) in [
            (0x7F_usize, vec![0x44u8, 0x7F]),
            (0x80, vec![0x44, 0x81, 0x80]),
            (0xFF, vec![0x44, 0x81, 0xFF]),
            (0x100, vec![0x44, 0x82, 0x01, 0x00]),
            (0xFFFF, vec![0x44, 0x82, 0xFF, 0xFF]),
        ] {
            let value: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let mut buf = vec![0u8; len + 4];
            let mut writer = TlvWriter::new(&mut buf);
            writer.put_bytes(0x44, &value).unwrap();
            let written = writer.len();

            assert_eq!(written, header.len() + len);
            assert_eq!(&buf[..header.len()], header.as_slice());

            let mut reader = TlvReader::new(&buf[..written]);
            assert_eq!(reader.get_bytes(0x44).unwrap(), value.as_slice());
        }
    }

    #[test]
    fn test_writer_overflow_leaves_buffer_untouched() {
        let mut buf = [0u8; 4];
        let mut writer = TlvWriter::new(&mut buf);
        writer.put_u8(0x41, 1).unwrap();

        assert_eq!(writer.put_u16(0x42, 2), Err(Error::BufferTooSmall));
        assert_eq!(writer.len(), 3);
    }

    #[test]
    fn test_value_too_long() {
        let mut out = [0u8; 4];
        assert_eq!(encode_length(0x1_0000, &mut out), Err(Error::InvalidArgument));
    }

    #[test]
    fn test_reader_rejects_wrong_tag_without_consuming() {
        let data = [0x41, 0x01, 0x05];
        let mut reader = TlvReader::new(&data);

        assert_eq!(reader.get_u8(0x42), Err(Error::InvalidResponse));
        assert_eq!(reader.peek_tag(), Some(0x41));
        assert_eq!(reader.get_u8(0x41), Ok(5));
    }

    #[test]
    fn test_reader_rejects_truncated_and_wrong_width() {
        let truncated = [0x41, 0x04, 0x00, 0x01];
        assert_eq!(TlvReader::new(&truncated).get_bytes(0x41), Err(Error::InvalidResponse));

        let wide = [0x41, 0x02, 0x00, 0x01];
        assert_eq!(TlvReader::new(&wide).get_u8(0x41), Err(Error::InvalidResponse));
    }

    #[test]
    fn test_skip() {
        let data = [0x41, 0x81, 0x80];
        let mut payload = data.to_vec();
        payload.extend(vec![0u8; 0x80]);
        payload.extend([0x42, 0x01, 0x09]);

        let mut reader = TlvReader::new(&payload);
        assert_eq!(reader.skip().unwrap(), 0x41);
        assert_eq!(reader.get_u8(0x42).unwrap(), 9);
    }
}
