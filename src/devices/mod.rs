//! Click board drivers
//!
//! Each driver owns its bus handle (`I2c`, `SpiDevice` or a UART implementing
//! `embedded_io_async::{Read, Write, ReadReady}`) plus any control pins, and
//! exposes `check_id()` / `default_config()` style entry points where the chip
//! supports them.
//!
//! ## Modules
//!
//! - `plugntrust`: Plug-n-Trust Click (NXP SE05x secure element, T=1 over I2C)
//! - `radar`: Radar Click (MM5D91-00 presence radar, framed UART)
//! - `digi_in`: DIGI IN Click (MAX22190 octal digital input, SPI with CRC)
//! - `compass7`: Compass 7 Click (MMC5603NJ magnetometer)
//! - `barometer7`: Barometer 7 Click (KP264 pressure sensor)
//! - `lightranger11`: LightRanger 11 Click (VL53L7CX multizone ToF)
//! - `gyro3`: Gyro 3 Click (I3G4250D gyroscope, I2C or SPI)
//! - `clockgen4`: Clock Gen 4 Click (CDCE6214 clock generator)
//! - `current_dac`: 4-20mA T 2 Click (DAC161S997 loop DAC)
//! - `sram`: SRAM Click (23LC1024)
//! - `expand2`: Expand 2 Click (MCP23017 port expander)
//! - `char_lcd`: LCD Click (HD44780 behind a PCF8574 expander)
//! - `enocean2`: EnOcean 2 Click (TCM 310 over ESP3)
//! - `lora`: LoRa Click (RN2483 ASCII command set)
//! - `pwm`: PWM Click (PCA9685)
//! - `pins`: placeholder for unused control pins

pub mod barometer7;
pub mod char_lcd;
pub mod clockgen4;
pub mod compass7;
pub mod current_dac;
pub mod digi_in;
pub mod enocean2;
pub mod expand2;
pub mod gyro3;
pub mod lightranger11;
pub mod lora;
pub mod pins;
pub mod plugntrust;
pub mod pwm;
pub mod radar;
pub mod sram;
