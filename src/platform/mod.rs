//! Platform boundary
//!
//! Drivers talk to hardware only through the `embedded-hal`,
//! `embedded-hal-async` and `embedded-io-async` traits. This module holds the
//! error type every driver returns and, for host builds, mock bus
//! implementations of those traits.

pub mod error;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export commonly used types
pub use error::{Error, Result};
