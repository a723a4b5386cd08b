//! Time abstraction helpers
//!
//! Uses `embassy_time` when the `embassy` feature is enabled.
//! On host builds without embassy, delays complete immediately and the
//! timestamp stays at zero, so polling loops run their full iteration budget
//! without sleeping.

/// Async delay in milliseconds
#[cfg(feature = "embassy")]
pub async fn delay_ms(ms: u32) {
    embassy_time::Timer::after_millis(u64::from(ms)).await;
}

#[cfg(not(feature = "embassy"))]
pub async fn delay_ms(_ms: u32) {
    // No-op for host tests
}

/// Async delay in microseconds
#[cfg(feature = "embassy")]
pub async fn delay_us(us: u32) {
    embassy_time::Timer::after_micros(u64::from(us)).await;
}

#[cfg(not(feature = "embassy"))]
pub async fn delay_us(_us: u32) {
    // No-op for host tests
}

/// Get current timestamp in milliseconds
#[cfg(feature = "embassy")]
pub fn timestamp_ms() -> u64 {
    embassy_time::Instant::now().as_millis()
}

#[cfg(not(feature = "embassy"))]
pub fn timestamp_ms() -> u64 {
    0 // Host test stub
}
