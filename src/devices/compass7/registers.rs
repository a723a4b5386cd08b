//! MMC5603NJ register definitions

// =============================================================================
// I2C Address
// =============================================================================

/// Fixed 7-bit address
pub const MMC5603_ADDR: u8 = 0x30;

// =============================================================================
// Output Registers
// =============================================================================

/// X[19:12]; Y and Z follow, then the low nibbles at XOUT2
pub const XOUT0: u8 = 0x00;

/// X[3:0] in bits 7:4; Y2 and Z2 follow
pub const XOUT2: u8 = 0x06;

/// Temperature output
pub const TOUT: u8 = 0x09;

// =============================================================================
// Status / Control
// =============================================================================

pub const STATUS1: u8 = 0x18;
pub const ODR: u8 = 0x1A;
pub const INTERNAL_CONTROL_0: u8 = 0x1B;
pub const INTERNAL_CONTROL_1: u8 = 0x1C;
pub const INTERNAL_CONTROL_2: u8 = 0x1D;

/// Product ID register
pub const PRODUCT_ID: u8 = 0x39;

/// Expected product ID
pub const PRODUCT_ID_VALUE: u8 = 0x10;

// STATUS1 bits
pub const STATUS1_MEAS_M_DONE: u8 = 0x40;
pub const STATUS1_MEAS_T_DONE: u8 = 0x80;

// INTERNAL_CONTROL_0 bits
pub const CTRL0_TAKE_MEAS_M: u8 = 0x01;
pub const CTRL0_TAKE_MEAS_T: u8 = 0x02;
pub const CTRL0_DO_SET: u8 = 0x08;
pub const CTRL0_DO_RESET: u8 = 0x10;
pub const CTRL0_AUTO_SR_EN: u8 = 0x20;
pub const CTRL0_CMM_FREQ_EN: u8 = 0x80;

// INTERNAL_CONTROL_1 bits
pub const CTRL1_BW_MASK: u8 = 0x03;
pub const CTRL1_SW_RESET: u8 = 0x80;

// INTERNAL_CONTROL_2 bits
pub const CTRL2_CMM_EN: u8 = 0x10;
pub const CTRL2_HPOWER: u8 = 0x80;

// =============================================================================
// Conversion
// =============================================================================

/// Zero-field output of the 20-bit converter
pub const NULL_FIELD_OFFSET: i32 = 524_288;

/// Counts per gauss at 20-bit resolution
pub const COUNTS_PER_GAUSS: f32 = 16_384.0;

/// µT per gauss
pub const MICROTESLA_PER_GAUSS: f32 = 100.0;

/// °C per temperature LSB
pub const TEMP_SENSITIVITY: f32 = 0.8;

/// Temperature at raw 0
pub const TEMP_OFFSET: f32 = -75.0;
