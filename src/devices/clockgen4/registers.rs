//! CDCE6214 register map (16-bit addresses, 16-bit values)

pub const DEVICE_CONTROL: u16 = 0x0000;
pub const DEVICE_ID: u16 = 0x0005;
pub const DEVICE_STATUS: u16 = 0x0007;
pub const REF_CONFIG: u16 = 0x0019;
pub const PLL_NDIV_INT: u16 = 0x001E;
pub const PLL_NDIV_FRAC_LO: u16 = 0x001F;
pub const PLL_NDIV_FRAC_HI: u16 = 0x0020;
pub const PLL_PRESCALER: u16 = 0x0030;

/// First output channel register block
pub const OUT_BASE: u16 = 0x0038;
/// Register stride between output channels
pub const OUT_STRIDE: u16 = 0x0006;
/// Offset of the divider register inside a channel block
pub const OUT_DIV_OFFSET: u16 = 0x0000;
/// Offset of the format/enable register inside a channel block
pub const OUT_FORMAT_OFFSET: u16 = 0x0001;

pub const DEVICE_ID_VALUE: u16 = 0x6214;

// DEVICE_CONTROL
pub const CTRL_SOFT_RESET: u16 = 0x0008;
pub const CTRL_RECAL: u16 = 0x0010;

// DEVICE_STATUS
pub const STATUS_PLL_LOCK: u16 = 0x0008;

// REF_CONFIG
pub const REF_INPUT_MASK: u16 = 0x0003;
pub const REF_DIV_SHIFT: u16 = 2;
pub const REF_DIV_MASK: u16 = 0x001C;

// OUT_FORMAT
pub const OUT_ENABLE: u16 = 0x0001;
pub const OUT_FORMAT_SHIFT: u16 = 1;
pub const OUT_FORMAT_MASK: u16 = 0x0006;

/// Divider register of `channel` (0-based)
pub const fn out_div(channel: u8) -> u16 {
    OUT_BASE + channel as u16 * OUT_STRIDE + OUT_DIV_OFFSET
}

/// Format/enable register of `channel` (0-based)
pub const fn out_format(channel: u8) -> u16 {
    OUT_BASE + channel as u16 * OUT_STRIDE + OUT_FORMAT_OFFSET
}
