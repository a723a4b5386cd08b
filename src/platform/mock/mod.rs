//! Mock bus implementations for testing
//!
//! This module provides mock implementations of the `embedded-hal-async`,
//! `embedded-hal` and `embedded-io-async` traits so drivers can be unit
//! tested without hardware.
//!
//! Every mock is a cheap handle onto shared state: clone it, hand one clone
//! to the driver, and keep the other to script read data and inspect the
//! recorded traffic.
//!
//! # Feature Gate
//!
//! This module is available in two contexts:
//! - During test builds (`#[cfg(test)]`)
//! - When the `mock` feature is enabled
//!
//! # Example
//!
//! ```ignore
//! use click_drivers::platform::mock::MockI2c;
//!
//! let i2c = MockI2c::new();
//! i2c.set_read_data(&[0x10]);
//! let mut driver = Compass7::new(i2c.clone(), Compass7Config::default());
//! driver.check_id().await?;
//! assert_eq!(i2c.transactions().len(), 1);
//! ```

#![cfg(any(test, feature = "mock"))]

mod gpio;
mod i2c;
mod spi;
mod uart;

pub use gpio::MockPin;
pub use i2c::{I2cTransaction, MockI2c};
pub use spi::{MockSpi, SpiOperation};
pub use uart::MockUart;
