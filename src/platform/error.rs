//! Driver error types
//!
//! This module defines the single error type shared by every Click driver.
//! Bus failures keep the HAL's `ErrorKind` so the caller can still tell a
//! NACK from an overrun; everything above the bus is a protocol error.

use core::fmt;

/// Result type for driver operations
pub type Result<T> = core::result::Result<T, Error>;

/// Driver-level errors
///
/// All drivers map their bus-specific errors to these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// I2C transaction failed
    I2c(embedded_hal::i2c::ErrorKind),
    /// SPI transaction failed
    Spi(embedded_hal::spi::ErrorKind),
    /// UART read or write failed
    Uart(embedded_io_async::ErrorKind),
    /// GPIO pin operation failed
    Gpio(embedded_hal::digital::ErrorKind),
    /// Checksum of a received frame did not match
    Crc,
    /// Device did not answer within the polling budget
    Timeout,
    /// Frame or payload did not follow the device protocol
    InvalidResponse,
    /// Argument outside the range the device accepts
    InvalidArgument,
    /// Identification register returned an unexpected value
    DeviceIdMismatch {
        /// Value documented for the device
        expected: u32,
        /// Value read back
        found: u32,
    },
    /// Caller buffer (or internal frame buffer) too small
    BufferTooSmall,
    /// Data not available yet
    NotReady,
    /// Operation requires a completed `init()`
    NotInitialized,
    /// Device reported a non-success status code
    Status(u16),
}

impl Error {
    /// Map an I2C bus error
    pub fn i2c<E: embedded_hal::i2c::Error>(error: E) -> Self {
        Error::I2c(error.kind())
    }

    /// Map an SPI bus error
    pub fn spi<E: embedded_hal::spi::Error>(error: E) -> Self {
        Error::Spi(error.kind())
    }

    /// Map a UART (embedded-io) error
    pub fn uart<E: embedded_io_async::Error>(error: E) -> Self {
        Error::Uart(error.kind())
    }

    /// Map a GPIO error
    pub fn gpio<E: embedded_hal::digital::Error>(error: E) -> Self {
        Error::Gpio(error.kind())
    }

    /// Check whether this error came from the bus layer
    pub fn is_bus_error(&self) -> bool {
        matches!(
            self,
            Error::I2c(_) | Error::Spi(_) | Error::Uart(_) | Error::Gpio(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::I2c(e) => write!(f, "I2C error: {:?}", e),
            Error::Spi(e) => write!(f, "SPI error: {:?}", e),
            Error::Uart(e) => write!(f, "UART error: {:?}", e),
            Error::Gpio(e) => write!(f, "GPIO error: {:?}", e),
            Error::Crc => write!(f, "CRC mismatch"),
            Error::Timeout => write!(f, "Device timeout"),
            Error::InvalidResponse => write!(f, "Invalid response frame"),
            Error::InvalidArgument => write!(f, "Invalid argument"),
            Error::DeviceIdMismatch { expected, found } => write!(
                f,
                "Device ID mismatch: expected {:#x}, found {:#x}",
                expected, found
            ),
            Error::BufferTooSmall => write!(f, "Buffer too small"),
            Error::NotReady => write!(f, "Data not ready"),
            Error::NotInitialized => write!(f, "Driver not initialized"),
            Error::Status(sw) => write!(f, "Device status {:#06x}", sw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorKind as I2cErrorKind, NoAcknowledgeSource};

    #[test]
    fn test_i2c_error_keeps_kind() {
        let err = Error::i2c(I2cErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        assert_eq!(
            err,
            Error::I2c(I2cErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))
        );
        assert!(err.is_bus_error());
    }

    #[test]
    fn test_protocol_errors_are_not_bus_errors() {
        assert!(!Error::Crc.is_bus_error());
        assert!(!Error::Status(0x6A82).is_bus_error());
    }

    #[test]
    fn test_display() {
        let err = Error::DeviceIdMismatch {
            expected: 0xD3,
            found: 0x00,
        };
        assert_eq!(
            format!("{}", err),
            "Device ID mismatch: expected 0xd3, found 0x0"
        );
        assert_eq!(format!("{}", Error::Status(0x6985)), "Device status 0x6985");
    }
}
