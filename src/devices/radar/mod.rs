//! Radar Click (Jorjin MM5D91-00, 60 GHz presence radar, UART 115200 8N1)
//!
//! The module answers every command with a response frame that echoes the
//! command code and starts with a status byte. Detection events arrive
//! unsolicited at any time, including while a command is waiting for its
//! response; those are queued and handed out by `get_event()`.
//!
//! The GPIO0 output of the module mirrors the detection state and can be
//! read without any UART traffic.

mod driver;
pub mod frame;

pub use driver::Radar;

use frame::MAX_PAYLOAD_LEN;

// =============================================================================
// Command Codes
// =============================================================================

pub const CMD_GET_FW_VERSION: u8 = 0x00;
pub const CMD_RESET: u8 = 0x01;
pub const CMD_SET_DETECTION_RANGE: u8 = 0x02;
pub const CMD_GET_DETECTION_RANGE: u8 = 0x03;
pub const CMD_SET_SENSITIVITY: u8 = 0x04;
pub const CMD_GET_SENSITIVITY: u8 = 0x05;
pub const CMD_SET_HOLD_TIME: u8 = 0x06;
pub const CMD_GET_HOLD_TIME: u8 = 0x07;
pub const CMD_SET_OUTPUT_POLARITY: u8 = 0x08;
pub const CMD_GET_TEMPERATURE: u8 = 0x0B;
pub const CMD_GET_DETECTION_STATUS: u8 = 0x0D;

// =============================================================================
// Event Codes
// =============================================================================

/// Detection state changed: `[detected, distance f32 LE]`
pub const EVT_DETECTION: u8 = 0x01;

/// Periodic heartbeat, no payload
pub const EVT_HEARTBEAT: u8 = 0x02;

/// Events held while a command waits for its response
pub const EVENT_QUEUE_DEPTH: usize = 4;

/// Sensitivity range accepted by the module
pub const SENSITIVITY_MIN: u8 = 1;
pub const SENSITIVITY_MAX: u8 = 9;

/// Detection range limits in meters
pub const RANGE_MIN_M: f32 = 0.2;
pub const RANGE_MAX_M: f32 = 10.0;

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadarConfig {
    /// Budget for receiving one frame
    pub timeout_ms: u32,
    /// RST low time for a hardware reset
    pub reset_pulse_ms: u32,
    /// Boot time after releasing RST
    pub boot_time_ms: u32,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 3000,
            reset_pulse_ms: 100,
            boot_time_ms: 1000,
        }
    }
}

/// Polarity of the GPIO0 detection output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputPolarity {
    ActiveLow,
    ActiveHigh,
}

impl OutputPolarity {
    pub fn value(self) -> u8 {
        match self {
            OutputPolarity::ActiveLow => 0x00,
            OutputPolarity::ActiveHigh => 0x01,
        }
    }
}

/// Presence detection result
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DetectionStatus {
    pub detected: bool,
    /// Distance of the detected target in meters
    pub distance_m: f32,
}

impl DetectionStatus {
    /// Parse `[detected, distance f32 LE]`
    pub fn parse(payload: &[u8]) -> Option<Self> {
        match payload {
            [detected, d0, d1, d2, d3, ..] => Some(Self {
                detected: *detected != 0,
                distance_m: f32::from_le_bytes([*d0, *d1, *d2, *d3]),
            }),
            _ => None,
        }
    }
}

/// Unsolicited frame from the module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadarEvent {
    pub code: u8,
    pub payload: heapless::Vec<u8, MAX_PAYLOAD_LEN>,
    /// `core::time::timestamp_ms()` when the frame was received
    pub timestamp_ms: u64,
}

impl RadarEvent {
    /// Decode a detection event
    pub fn detection(&self) -> Option<DetectionStatus> {
        if self.code == EVT_DETECTION {
            DetectionStatus::parse(&self.payload)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_status_parse() {
        let mut payload = [0u8; 5];
        payload[0] = 1;
        payload[1..].copy_from_slice(&1.5f32.to_le_bytes());

        let status = DetectionStatus::parse(&payload).unwrap();
        assert!(status.detected);
        assert_eq!(status.distance_m, 1.5);
        assert!(DetectionStatus::parse(&payload[..3]).is_none());
    }

    #[test]
    fn test_event_detection_only_for_detection_code() {
        let mut payload = heapless::Vec::new();
        payload.extend_from_slice(&[0, 0, 0, 0, 0]).unwrap();
        let event = RadarEvent {
            code: EVT_HEARTBEAT,
            payload,
            timestamp_ms: 0,
        };
        assert!(event.detection().is_none());
    }
}
