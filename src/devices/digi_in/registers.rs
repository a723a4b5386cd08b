//! MAX22190 register map

/// Wire-break flags, one bit per input
pub const WB: u8 = 0x00;

/// Debounced input states
pub const DI: u8 = 0x02;

/// Fault register 1 (clear on read)
pub const FAULT1: u8 = 0x04;

/// Input filter of channel 1; channels follow at a stride of 2
pub const FLT1: u8 = 0x06;

/// Global configuration
pub const CFG: u8 = 0x18;

/// Input enable mask
pub const IN_EN: u8 = 0x1A;

/// Fault register 2 (clear on read)
pub const FAULT2: u8 = 0x1C;

/// Fault 2 enable mask
pub const FAULT2EN: u8 = 0x1E;

/// Fault 1 enable mask
pub const FAULT1EN: u8 = 0x24;

/// No operation
pub const NOP: u8 = 0x26;

/// Register address bits
pub const ADDRESS_MASK: u8 = 0x7F;

/// Command bit selecting a write
pub const WRITE_BIT: u8 = 0x80;

/// Number of input channels
pub const CHANNEL_COUNT: u8 = 8;

// FLTx fields
pub const FLT_DELAY_MASK: u8 = 0x07;
pub const FLT_BYPASS: u8 = 0x08;
pub const FLT_WIRE_BREAK_ENABLE: u8 = 0x10;

/// Filter register of channel `channel` (0-based)
pub const fn filter_register(channel: u8) -> u8 {
    FLT1 + 2 * channel
}
