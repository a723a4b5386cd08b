//! MCP23017 register map (IOCON.BANK = 0, port B at port A + 1)

pub const IODIRA: u8 = 0x00;
pub const IPOLA: u8 = 0x02;
pub const GPINTENA: u8 = 0x04;
pub const DEFVALA: u8 = 0x06;
pub const INTCONA: u8 = 0x08;
pub const IOCON: u8 = 0x0A;
pub const GPPUA: u8 = 0x0C;
pub const INTFA: u8 = 0x0E;
pub const INTCAPA: u8 = 0x10;
pub const GPIOA: u8 = 0x12;
pub const OLATA: u8 = 0x14;

// IOCON
pub const IOCON_MIRROR: u8 = 0x40;
pub const IOCON_SEQOP: u8 = 0x20;
pub const IOCON_ODR: u8 = 0x04;
pub const IOCON_INTPOL: u8 = 0x02;

/// Base address, A2..A0 low
pub const BASE_ADDRESS: u8 = 0x20;
