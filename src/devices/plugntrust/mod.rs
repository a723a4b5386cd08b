//! Plug-n-Trust Click (NXP SE050 secure element)
//!
//! Drives the SE05x IoT applet over T=1-over-I2C. Commands are APDUs with
//! TLV payloads; see `communication::t1` for the block transport and
//! `communication::tlv` for the payload codec.
//!
//! ## Usage
//!
//! ```ignore
//! use click_drivers::devices::plugntrust::{PlugNTrust, PlugNTrustConfig};
//!
//! let mut se = PlugNTrust::new(i2c, PlugNTrustConfig::default());
//! let version = se.select_applet().await?;
//! let mut random = [0u8; 16];
//! se.get_random(&mut random).await?;
//! ```

pub mod apdu;
mod driver;

pub use driver::PlugNTrust;

use crate::communication::t1::T1Config;

/// Object ids per `read_id_list` page
pub const MAX_IDS_PER_PAGE: usize = 64;

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlugNTrustConfig {
    /// 7-bit I2C address
    pub i2c_address: u8,
    /// Response polling attempts while the SE is busy
    pub max_read_retries: u32,
    /// Delay between polling attempts
    pub retry_delay_ms: u32,
}

impl Default for PlugNTrustConfig {
    fn default() -> Self {
        Self {
            i2c_address: 0x48,
            max_read_retries: 100,
            retry_delay_ms: 2,
        }
    }
}

impl From<PlugNTrustConfig> for T1Config {
    fn from(config: PlugNTrustConfig) -> Self {
        T1Config {
            address: config.i2c_address,
            max_read_retries: config.max_read_retries,
            retry_delay_ms: config.retry_delay_ms,
        }
    }
}

/// Applet version record (7 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AppletVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
    /// Bitmap of enabled applet features
    pub applet_config: u16,
    pub secure_box: u16,
}

impl AppletVersion {
    /// Parse the 7-byte version record
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [major, minor, patch, c0, c1, s0, s1] => Some(Self {
                major: *major,
                minor: *minor,
                patch: *patch,
                applet_config: u16::from_be_bytes([*c0, *c1]),
                secure_box: u16::from_be_bytes([*s0, *s1]),
            }),
            _ => None,
        }
    }
}

/// Memory pool queried by `get_free_memory`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MemoryType {
    Persistent,
    TransientReset,
    TransientDeselect,
}

impl MemoryType {
    pub fn value(self) -> u8 {
        match self {
            MemoryType::Persistent => 0x01,
            MemoryType::TransientReset => 0x02,
            MemoryType::TransientDeselect => 0x03,
        }
    }
}

/// One page of the secure object list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectListPage {
    pub ids: heapless::Vec<u32, MAX_IDS_PER_PAGE>,
    /// More ids follow; request the next page at `offset + ids.len()`
    pub more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applet_version_parse() {
        let version = AppletVersion::parse(&[3, 1, 0, 0x6F, 0xFF, 0x01, 0x0B]).unwrap();
        assert_eq!((version.major, version.minor, version.patch), (3, 1, 0));
        assert_eq!(version.applet_config, 0x6FFF);
        assert_eq!(version.secure_box, 0x010B);
        assert!(AppletVersion::parse(&[3, 1, 0]).is_none());
    }

    #[test]
    fn test_config_maps_to_transport() {
        let t1: T1Config = PlugNTrustConfig::default().into();
        assert_eq!(t1.address, 0x48);
    }
}
