//! SE05x command layer

use super::apdu::{self, *};
use super::{AppletVersion, MemoryType, ObjectListPage, PlugNTrustConfig};
use crate::communication::t1::T1Transport;
use crate::communication::tlv::{TlvReader, TlvWriter};
use crate::platform::{Error, Result};
use embedded_hal_async::i2c::I2c;

/// Plug-n-Trust Click driver
///
/// Owns the T=1 session plus one command and one response buffer.
pub struct PlugNTrust<I2C> {
    t1: T1Transport<I2C>,
    command: [u8; MAX_APDU_LEN],
    response: [u8; MAX_APDU_LEN],
    version: Option<AppletVersion>,
}

impl<I2C> PlugNTrust<I2C>
where
    I2C: I2c,
{
    /// Create the driver; no bus traffic
    pub fn new(i2c: I2C, config: PlugNTrustConfig) -> Self {
        Self {
            t1: T1Transport::new(i2c, config.into()),
            command: [0u8; MAX_APDU_LEN],
            response: [0u8; MAX_APDU_LEN],
            version: None,
        }
    }

    /// Give the bus back
    pub fn release(self) -> I2C {
        self.t1.release()
    }

    /// Applet version reported by the last `select_applet`
    pub fn applet_version(&self) -> Option<AppletVersion> {
        self.version
    }

    /// Send one APDU; `fill` writes the command data
    ///
    /// Returns the response data length (status word stripped).
    async fn command<F>(&mut self, header: [u8; 4], fill: F) -> Result<usize>
    where
        F: FnOnce(&mut TlvWriter<'_>) -> Result<()>,
    {
        let data_len = {
            let mut writer = TlvWriter::new(&mut self.command[DATA_OFFSET..MAX_APDU_LEN - 2]);
            fill(&mut writer)?;
            writer.len()
        };
        let len = apdu::frame_apdu(&mut self.command, header, data_len)?;

        let rsp_len = self
            .t1
            .transceive(&self.command[..len], &mut self.response)
            .await?;
        apdu::check_status(&self.response[..rsp_len])
    }

    fn reader(&self, len: usize) -> TlvReader<'_> {
        TlvReader::new(&self.response[..len])
    }

    // =========================================================================
    // Applet
    // =========================================================================

    /// Select the IoT applet and read its version
    pub async fn select_applet(&mut self) -> Result<AppletVersion> {
        let header = [CLA_ISO7816, INS_SELECT, P1_SELECT_BY_NAME, 0x00];
        let len = self.command(header, |w| w.put_raw(&APPLET_AID)).await?;

        let version = AppletVersion::parse(&self.response[..len]).ok_or_else(|| {
            crate::log_error!("SE05x: unexpected SELECT response length {}", len);
            Error::InvalidResponse
        })?;
        crate::log_info!(
            "SE05x applet {}.{}.{} selected",
            version.major,
            version.minor,
            version.patch
        );
        self.version = Some(version);
        Ok(version)
    }

    /// Read the applet version through the management command
    pub async fn get_version(&mut self) -> Result<AppletVersion> {
        let header = [CLA_SE05X, INS_MGMT, P1_DEFAULT, P2_VERSION];
        let len = self.command(header, |_| Ok(())).await?;
        let bytes = self.reader(len).get_bytes(TAG_1)?;
        AppletVersion::parse(bytes).ok_or(Error::InvalidResponse)
    }

    /// Fill `buf` from the SE's random number generator
    pub async fn get_random(&mut self, buf: &mut [u8]) -> Result<()> {
        let size = u16::try_from(buf.len()).map_err(|_| Error::InvalidArgument)?;
        let header = [CLA_SE05X, INS_MGMT, P1_DEFAULT, P2_RANDOM];
        let len = self.command(header, |w| w.put_u16(TAG_1, size)).await?;

        let random = self.reader(len).get_bytes(TAG_1)?;
        if random.len() != buf.len() {
            return Err(Error::InvalidResponse);
        }
        buf.copy_from_slice(random);
        Ok(())
    }

    /// Bytes free in the given memory pool
    pub async fn get_free_memory(&mut self, memory: MemoryType) -> Result<u16> {
        let header = [CLA_SE05X, INS_MGMT, P1_DEFAULT, P2_MEMORY];
        let len = self
            .command(header, |w| w.put_u8(TAG_1, memory.value()))
            .await?;
        self.reader(len).get_u16(TAG_1)
    }

    // =========================================================================
    // Secure Objects
    // =========================================================================

    /// Read one page of object ids
    ///
    /// `filter` is a secure object type, or `OBJECT_TYPE_ALL`.
    pub async fn read_id_list(&mut self, offset: u16, filter: u8) -> Result<ObjectListPage> {
        let header = [CLA_SE05X, INS_READ, P1_DEFAULT, P2_LIST];
        let len = self
            .command(header, |w| {
                w.put_u16(TAG_1, offset)?;
                w.put_u8(TAG_2, filter)
            })
            .await?;

        let mut reader = self.reader(len);
        let more = reader.get_u8(TAG_1)? == 0x01;
        let list = reader.get_bytes(TAG_2)?;
        if list.len() % 4 != 0 {
            return Err(Error::InvalidResponse);
        }

        let mut page = ObjectListPage {
            more,
            ..ObjectListPage::default()
        };
        for chunk in list.chunks_exact(4) {
            let id = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            page.ids.push(id).map_err(|_| Error::BufferTooSmall)?;
        }
        Ok(page)
    }

    /// Whether a secure object with `id` exists
    pub async fn check_object_exists(&mut self, id: u32) -> Result<bool> {
        let header = [CLA_SE05X, INS_MGMT, P1_DEFAULT, P2_EXIST];
        let len = self.command(header, |w| w.put_u32(TAG_1, id)).await?;
        Ok(self.reader(len).get_u8(TAG_1)? == RESULT_SUCCESS)
    }

    /// Size in bytes of the object `id`
    pub async fn read_size(&mut self, id: u32) -> Result<u16> {
        let header = [CLA_SE05X, INS_READ, P1_DEFAULT, P2_SIZE];
        let len = self.command(header, |w| w.put_u32(TAG_1, id)).await?;
        self.reader(len).get_u16(TAG_1)
    }

    /// Read `length` bytes at `offset` of object `id` into `out`
    ///
    /// A `length` of 0 reads the whole object. Returns the bytes copied.
    pub async fn read_object(
        &mut self,
        id: u32,
        offset: u16,
        length: u16,
        out: &mut [u8],
    ) -> Result<usize> {
        let header = [CLA_SE05X, INS_READ, P1_DEFAULT, P2_DEFAULT];
        let len = self
            .command(header, |w| {
                w.put_u32(TAG_1, id)?;
                if offset != 0 {
                    w.put_u16(TAG_2, offset)?;
                }
                if length != 0 {
                    w.put_u16(TAG_3, length)?;
                }
                Ok(())
            })
            .await?;

        let data = self.reader(len).get_bytes(TAG_1)?;
        let dest = out.get_mut(..data.len()).ok_or(Error::BufferTooSmall)?;
        dest.copy_from_slice(data);
        Ok(data.len())
    }

    /// Write `data` at `offset` into binary file `id`
    ///
    /// `file_size` is sent when non-zero and creates the file with that
    /// size; pass 0 to update an existing file.
    pub async fn write_binary(
        &mut self,
        id: u32,
        offset: u16,
        data: &[u8],
        file_size: u16,
    ) -> Result<()> {
        let header = [CLA_SE05X, INS_WRITE, P1_BINARY, P2_DEFAULT];
        self.command(header, |w| {
            w.put_u32(TAG_1, id)?;
            w.put_u16(TAG_2, offset)?;
            if file_size != 0 {
                w.put_u16(TAG_3, file_size)?;
            }
            w.put_bytes(TAG_4, data)
        })
        .await?;
        Ok(())
    }

    /// Delete object `id`
    pub async fn delete_object(&mut self, id: u32) -> Result<()> {
        let header = [CLA_SE05X, INS_MGMT, P1_DEFAULT, P2_DELETE_OBJECT];
        self.command(header, |w| w.put_u32(TAG_1, id)).await?;
        Ok(())
    }

    // =========================================================================
    // Session Control
    // =========================================================================

    /// Read the answer-to-reset
    pub async fn get_atr(&mut self, out: &mut [u8]) -> Result<usize> {
        self.t1.get_atr(out).await
    }

    /// Reset the T=1 interface
    pub async fn soft_reset(&mut self) -> Result<()> {
        self.t1.soft_reset().await?;
        self.version = None;
        Ok(())
    }

    /// Cold-reset the chip
    pub async fn chip_reset(&mut self) -> Result<()> {
        self.t1.chip_reset().await?;
        self.version = None;
        Ok(())
    }

    /// Close the applet session
    pub async fn end_session(&mut self) -> Result<()> {
        self.t1.end_session().await
    }

    /// Resynchronise the T=1 sequence counters
    pub async fn resync(&mut self) -> Result<()> {
        self.t1.resync().await
    }
}
