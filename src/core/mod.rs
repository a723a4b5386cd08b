//! Core infrastructure
//!
//! Logging macros and time helpers used by every driver.

pub mod logging;
pub mod time;
