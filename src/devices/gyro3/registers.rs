//! I3G4250D register map

pub const WHO_AM_I: u8 = 0x0F;
pub const WHO_AM_I_VALUE: u8 = 0xD3;

pub const CTRL_REG1: u8 = 0x20;
pub const CTRL_REG2: u8 = 0x21;
pub const CTRL_REG3: u8 = 0x22;
pub const CTRL_REG4: u8 = 0x23;
pub const CTRL_REG5: u8 = 0x24;
pub const REFERENCE: u8 = 0x25;
pub const OUT_TEMP: u8 = 0x26;
pub const STATUS_REG: u8 = 0x27;
pub const OUT_X_L: u8 = 0x28;
pub const FIFO_CTRL_REG: u8 = 0x2E;
pub const FIFO_SRC_REG: u8 = 0x2F;
pub const INT1_CFG: u8 = 0x30;
pub const INT1_SRC: u8 = 0x31;
pub const INT1_THS_XH: u8 = 0x32;
pub const INT1_DURATION: u8 = 0x38;

// CTRL_REG1
pub const CTRL1_DR_MASK: u8 = 0xC0;
pub const CTRL1_BW_MASK: u8 = 0x30;
pub const CTRL1_PD: u8 = 0x08;
pub const CTRL1_XYZ_EN: u8 = 0x07;

// CTRL_REG3
pub const CTRL3_I1_INT1: u8 = 0x80;
pub const CTRL3_I2_DRDY: u8 = 0x08;

// CTRL_REG4
pub const CTRL4_FS_MASK: u8 = 0x30;

// CTRL_REG5
pub const CTRL5_HP_EN: u8 = 0x10;
pub const CTRL5_OUT_SEL_MASK: u8 = 0x03;
pub const CTRL5_OUT_SEL_HPF: u8 = 0x01;

// STATUS_REG
pub const STATUS_ZYXDA: u8 = 0x08;

/// I2C: MSB of the sub-address enables auto-increment
pub const I2C_AUTO_INCREMENT: u8 = 0x80;

/// Address with SDO low
pub const I2C_ADDRESS_SDO_LOW: u8 = 0x68;
/// Address with SDO high
pub const I2C_ADDRESS_SDO_HIGH: u8 = 0x69;
