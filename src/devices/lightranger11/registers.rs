//! VL53L7CX addresses, block headers and fixed sequences

use crate::bus::Step;

/// Page select; most traffic happens on page 2
pub const PAGE_SELECT: u16 = 0x7FFF;

pub const DEVICE_ID: u16 = 0x0000;
pub const REVISION_ID: u16 = 0x0001;
pub const DEVICE_ID_VALUE: u8 = 0xF0;
pub const REVISION_ID_VALUE: u8 = 0x02;

/// Boot status on page 0
pub const GO2_STATUS0: u16 = 0x0006;
/// Firmware access status on page 1
pub const FW_STATUS: u16 = 0x0021;

/// Mailbox between host and firmware
pub const UI_CMD_STATUS: u16 = 0x2C00;
pub const UI_CMD_START: u16 = 0x2C04;
pub const UI_CMD_END: u16 = 0x2FFF;

/// Firmware sets this word once it stopped ranging by itself
pub const AUTO_STOP_FLAG: u16 = 0x2FFC;
pub const AUTO_STOP_VALUE: u32 = 0x0000_04FF;

/// Firmware pages and their size
pub const FW_PAGES: [u8; 3] = [0x09, 0x0A, 0x0B];
pub const FW_PAGE_SIZE: usize = 0x8000;

// DCI indexes
pub const DCI_ZONE_CONFIG: u16 = 0x5450;
pub const DCI_FREQ_HZ: u16 = 0x5458;
pub const DCI_INT_TIME: u16 = 0x545C;
pub const DCI_DSS_CONFIG: u16 = 0xAD38;
pub const DCI_OUTPUT_CONFIG: u16 = 0xCD60;
pub const DCI_OUTPUT_ENABLES: u16 = 0xCD68;
pub const DCI_OUTPUT_LIST: u16 = 0xCD78;

// Block headers: idx << 16 | size << 4 | type
pub const METADATA_BH: u32 = 0x54B4_00C0;
pub const COMMONDATA_BH: u32 = 0x54C0_0040;
pub const NB_TARGET_DETECTED_BH: u32 = 0xDB84_0401;
pub const DISTANCE_BH: u32 = 0xDF44_0402;
pub const TARGET_STATUS_BH: u32 = 0xE084_0401;

pub const METADATA_IDX: u16 = 0x54B4;
pub const NB_TARGET_DETECTED_IDX: u16 = 0xDB84;
pub const DISTANCE_IDX: u16 = 0xDF44;
pub const TARGET_STATUS_IDX: u16 = 0xE084;

/// Blocks requested from the firmware, in stream order
pub const OUTPUT_LIST: [u32; 5] = [
    METADATA_BH,
    COMMONDATA_BH,
    NB_TARGET_DETECTED_BH,
    DISTANCE_BH,
    TARGET_STATUS_BH,
];

/// Software reboot and MCU power-up, before the firmware download
pub const BOOT_SEQUENCE: &[Step<u16, u8>] = &[
    Step::Write(PAGE_SELECT, 0x00),
    Step::Write(0x0009, 0x04),
    Step::Write(0x000F, 0x40),
    Step::Write(0x000A, 0x03),
    Step::Write(0x000C, 0x01),
    Step::Write(0x0101, 0x00),
    Step::Write(0x0102, 0x00),
    Step::Write(0x010A, 0x01),
    Step::Write(0x4002, 0x01),
    Step::Write(0x4002, 0x00),
    Step::Write(0x010A, 0x03),
    Step::Write(0x0103, 0x01),
    Step::Write(0x000C, 0x00),
    Step::Write(0x000F, 0x43),
    Step::DelayMs(1),
    Step::Write(0x000F, 0x40),
    Step::Write(0x000A, 0x01),
    Step::DelayMs(100),
];

/// Power the MCU and open its memory to the host
pub const WAKE_SEQUENCE: &[Step<u16, u8>] = &[
    Step::Write(PAGE_SELECT, 0x00),
    Step::Write(0x000C, 0x01),
    Step::Write(0x0101, 0x00),
    Step::Write(0x0102, 0x00),
    Step::Write(0x010A, 0x01),
    Step::Write(0x4002, 0x01),
    Step::Write(0x4002, 0x00),
    Step::Write(0x010A, 0x03),
    Step::Write(0x0103, 0x01),
    Step::Write(0x400F, 0x00),
    Step::Write(0x021A, 0x43),
    Step::Write(0x021A, 0x03),
    Step::Write(0x021A, 0x01),
    Step::Write(0x021A, 0x00),
    Step::Write(0x0219, 0x00),
    Step::Write(0x021B, 0x00),
    Step::Write(0x000C, 0x00),
    Step::Write(PAGE_SELECT, 0x01),
    Step::Write(0x0020, 0x07),
    Step::Write(0x0020, 0x06),
];

/// Reset the MCU so it boots the downloaded firmware
pub const MCU_RESET_SEQUENCE: &[Step<u16, u8>] = &[
    Step::Write(PAGE_SELECT, 0x00),
    Step::Write(0x000C, 0x01),
    Step::Write(0x0114, 0x00),
    Step::Write(0x0115, 0x00),
    Step::Write(0x0116, 0x42),
    Step::Write(0x0117, 0x00),
    Step::Write(0x000B, 0x00),
    Step::Write(0x000C, 0x00),
    Step::Write(0x000B, 0x01),
];

/// Ask the MCU to stop ranging
pub const STOP_SEQUENCE: &[Step<u16, u8>] = &[
    Step::Write(PAGE_SELECT, 0x00),
    Step::Write(0x0015, 0x16),
    Step::Write(0x0014, 0x01),
];

/// Release the stop request and return to page 2
pub const UNDO_STOP_SEQUENCE: &[Step<u16, u8>] = &[
    Step::Write(PAGE_SELECT, 0x00),
    Step::Write(0x0014, 0x00),
    Step::Write(0x0015, 0x00),
    Step::Write(0x0009, 0x04),
    Step::Write(PAGE_SELECT, 0x02),
];
