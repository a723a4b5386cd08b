//! Wire codecs
//!
//! Framing shared by the drivers that speak a packet protocol rather than
//! plain register access.
//!
//! # Protocols
//!
//! - **T=1 over I2C**: block transport of the SE05x secure element
//!   (Plug-n-Trust Click)
//! - **TLV**: tag-length-value payloads inside SE05x APDUs
//! - **ESP3**: EnOcean serial protocol (EnOcean 2 Click)
//! - **CRC**: the checksums used by the above and by the radar and
//!   MAX22190 framings

pub mod crc;
pub mod esp3;
pub mod t1;
pub mod tlv;
