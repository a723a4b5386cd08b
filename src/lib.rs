#![cfg_attr(not(any(test, feature = "mock")), no_std)]

//! click_drivers - Async drivers for mikroBUS Click boards
//!
//! This library provides one self-contained driver per Click board, all built
//! on the `embedded-hal-async` / `embedded-io-async` traits, plus the shared
//! register-transaction layer and the wire codecs (T=1, TLV, ESP3, CRC) they
//! are framed with.

// Error types and host-side bus mocks
pub mod platform;

// Logging macros and time helpers
pub mod core;

// Register transaction primitives and configure sequences
pub mod bus;

// Wire codecs shared by the drivers
pub mod communication;

// Click board drivers
pub mod devices;

pub use platform::{Error, Result};
