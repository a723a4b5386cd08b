//! Expand 2 Click (Microchip MCP23017 16-bit I/O expander)
//!
//! Two 8-bit ports. Direction bits follow the chip: 1 = input, 0 = output.

mod driver;
pub mod registers;

pub use driver::Expand2;

/// One of the two 8-bit ports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    A,
    B,
}

impl Port {
    /// Register address of `base` for this port
    pub fn register(self, base: u8) -> u8 {
        match self {
            Port::A => base,
            Port::B => base + 1,
        }
    }
}

/// Interrupt-on-change setup for one port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterruptConfig {
    /// Pins that raise the interrupt
    pub enable: u8,
    /// Pins compared against `default_value` instead of their previous state
    pub compare: u8,
    pub default_value: u8,
}

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expand2Config {
    /// 0x20..=0x27
    pub address: u8,
    /// INTA and INTB both signal either port
    pub mirror_interrupts: bool,
    pub interrupt_active_high: bool,
    pub interrupt_open_drain: bool,
}

impl Default for Expand2Config {
    fn default() -> Self {
        Self {
            address: registers::BASE_ADDRESS,
            mirror_interrupts: false,
            interrupt_active_high: false,
            interrupt_open_drain: false,
        }
    }
}
