//! LCD Click (HD44780 character display behind a PCF8574 I2C expander)
//!
//! The expander drives the controller's 4-bit bus:
//!
//! ```text
//! P7 P6 P5 P4 | P3        | P2 | P1 | P0
//! D7 D6 D5 D4 | backlight | EN | RW | RS
//! ```
//!
//! Every controller byte is two nibbles, each latched by an EN pulse, so one
//! byte becomes a single four-byte I2C write.

use crate::core::time::delay_ms;
use crate::platform::{Error, Result};
use embedded_hal_async::i2c::I2c;

const RS: u8 = 0x01;
const EN: u8 = 0x04;
const BACKLIGHT: u8 = 0x08;

pub const CMD_CLEAR: u8 = 0x01;
pub const CMD_HOME: u8 = 0x02;
pub const CMD_ENTRY_MODE: u8 = 0x04;
pub const CMD_DISPLAY_CONTROL: u8 = 0x08;
pub const CMD_SHIFT: u8 = 0x10;
pub const CMD_FUNCTION_SET: u8 = 0x20;
pub const CMD_SET_CGRAM: u8 = 0x40;
pub const CMD_SET_DDRAM: u8 = 0x80;

const ENTRY_INCREMENT: u8 = 0x02;
const SHIFT_DISPLAY: u8 = 0x08;
const SHIFT_RIGHT: u8 = 0x04;
const FUNCTION_TWO_LINES: u8 = 0x08;

/// DDRAM address of the first column of each row
const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

/// Display on/off control flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayControl {
    pub display: bool,
    pub cursor: bool,
    pub blink: bool,
}

impl Default for DisplayControl {
    fn default() -> Self {
        Self {
            display: true,
            cursor: false,
            blink: false,
        }
    }
}

impl DisplayControl {
    fn command(self) -> u8 {
        let mut cmd = CMD_DISPLAY_CONTROL;
        if self.display {
            cmd |= 0x04;
        }
        if self.cursor {
            cmd |= 0x02;
        }
        if self.blink {
            cmd |= 0x01;
        }
        cmd
    }
}

/// Display shift direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ShiftDirection {
    Left,
    Right,
}

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharLcdConfig {
    pub address: u8,
    pub rows: u8,
    pub columns: u8,
}

impl Default for CharLcdConfig {
    fn default() -> Self {
        Self {
            address: 0x27,
            rows: 2,
            columns: 16,
        }
    }
}

/// LCD Click driver
pub struct CharLcd<I2C> {
    i2c: I2C,
    config: CharLcdConfig,
    backlight: bool,
    control: DisplayControl,
}

impl<I2C> CharLcd<I2C>
where
    I2C: I2c,
{
    pub fn new(i2c: I2C, config: CharLcdConfig) -> Result<Self> {
        if config.rows == 0 || usize::from(config.rows) > ROW_OFFSETS.len() || config.columns == 0
        {
            return Err(Error::InvalidArgument);
        }
        Ok(Self {
            i2c,
            config,
            backlight: true,
            control: DisplayControl::default(),
        })
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    fn backlight_bit(&self) -> u8 {
        if self.backlight {
            BACKLIGHT
        } else {
            0
        }
    }

    async fn expander_write(&mut self, bytes: &[u8]) -> Result<()> {
        self.i2c
            .write(self.config.address, bytes)
            .await
            .map_err(Error::i2c)
    }

    /// Latch the high nibble of `value` (init sequence only)
    async fn write_nibble(&mut self, value: u8) -> Result<()> {
        let bits = (value & 0xF0) | self.backlight_bit();
        self.expander_write(&[bits | EN, bits]).await
    }

    async fn send(&mut self, value: u8, mode: u8) -> Result<()> {
        let flags = mode | self.backlight_bit();
        let hi = (value & 0xF0) | flags;
        let lo = (value << 4) | flags;
        self.expander_write(&[hi | EN, hi, lo | EN, lo]).await
    }

    async fn command(&mut self, cmd: u8) -> Result<()> {
        self.send(cmd, 0).await
    }

    /// Power-on sequence into 4-bit, two-line mode
    pub async fn init(&mut self) -> Result<()> {
        delay_ms(50).await;
        let idle = self.backlight_bit();
        self.expander_write(&[idle]).await?;

        // Three 8-bit function sets resynchronise the nibble phase
        self.write_nibble(0x30).await?;
        delay_ms(5).await;
        self.write_nibble(0x30).await?;
        delay_ms(1).await;
        self.write_nibble(0x30).await?;
        delay_ms(1).await;
        self.write_nibble(0x20).await?;

        let lines = if self.config.rows > 1 {
            FUNCTION_TWO_LINES
        } else {
            0
        };
        self.command(CMD_FUNCTION_SET | lines).await?;
        self.control = DisplayControl::default();
        self.command(self.control.command()).await?;
        self.clear().await?;
        self.command(CMD_ENTRY_MODE | ENTRY_INCREMENT).await
    }

    pub async fn clear(&mut self) -> Result<()> {
        self.command(CMD_CLEAR).await?;
        delay_ms(2).await;
        Ok(())
    }

    pub async fn home(&mut self) -> Result<()> {
        self.command(CMD_HOME).await?;
        delay_ms(2).await;
        Ok(())
    }

    pub async fn set_cursor(&mut self, row: u8, col: u8) -> Result<()> {
        if row >= self.config.rows || col >= self.config.columns {
            return Err(Error::InvalidArgument);
        }
        let offset = ROW_OFFSETS[usize::from(row)];
        self.command(CMD_SET_DDRAM | (offset + col)).await
    }

    pub async fn write_char(&mut self, c: u8) -> Result<()> {
        self.send(c, RS).await
    }

    /// Write ASCII text at the cursor; other characters show as `?`
    pub async fn write_str(&mut self, s: &str) -> Result<()> {
        for c in s.chars() {
            let byte = if c.is_ascii() { c as u8 } else { b'?' };
            self.write_char(byte).await?;
        }
        Ok(())
    }

    pub async fn set_backlight(&mut self, on: bool) -> Result<()> {
        self.backlight = on;
        let idle = self.backlight_bit();
        self.expander_write(&[idle]).await
    }

    pub async fn display_control(&mut self, control: DisplayControl) -> Result<()> {
        self.command(control.command()).await?;
        self.control = control;
        Ok(())
    }

    pub async fn shift_display(&mut self, direction: ShiftDirection) -> Result<()> {
        let dir = match direction {
            ShiftDirection::Left => 0,
            ShiftDirection::Right => SHIFT_RIGHT,
        };
        self.command(CMD_SHIFT | SHIFT_DISPLAY | dir).await
    }

    /// Load a 5x8 glyph into CGRAM slot `location` (0..=7)
    ///
    /// Leaves the cursor at the top-left corner.
    pub async fn create_char(&mut self, location: u8, pattern: &[u8; 8]) -> Result<()> {
        if location > 7 {
            return Err(Error::InvalidArgument);
        }
        self.command(CMD_SET_CGRAM | (location << 3)).await?;
        for &row in pattern {
            self.send(row & 0x1F, RS).await?;
        }
        self.command(CMD_SET_DDRAM).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockI2c;

    fn lcd(i2c: &MockI2c) -> CharLcd<MockI2c> {
        CharLcd::new(i2c.clone(), CharLcdConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_write_char_nibbles() {
        let i2c = MockI2c::new();
        let mut lcd = lcd(&i2c);

        lcd.write_char(b'A').await.unwrap();

        assert_eq!(i2c.written(), vec![vec![0x4D, 0x49, 0x1D, 0x19]]);
    }

    #[tokio::test]
    async fn test_init_sequence() {
        let i2c = MockI2c::new();
        let mut lcd = lcd(&i2c);

        lcd.init().await.unwrap();

        let written = i2c.written();
        assert_eq!(written[0], vec![0x08]);
        assert_eq!(written[1], vec![0x3C, 0x38]);
        assert_eq!(written[4], vec![0x2C, 0x28]);
        // Function set 0x28, display on 0x0C, clear, entry mode 0x06
        assert_eq!(written[5], vec![0x2C, 0x28, 0x8C, 0x88]);
        assert_eq!(written[6], vec![0x0C, 0x08, 0xCC, 0xC8]);
        assert_eq!(written[7], vec![0x0C, 0x08, 0x1C, 0x18]);
        assert_eq!(written[8], vec![0x0C, 0x08, 0x6C, 0x68]);
        assert_eq!(written.len(), 9);
    }

    #[tokio::test]
    async fn test_set_cursor() {
        let i2c = MockI2c::new();
        let mut lcd = lcd(&i2c);

        lcd.set_cursor(1, 3).await.unwrap();
        assert_eq!(i2c.written(), vec![vec![0xCC, 0xC8, 0x3C, 0x38]]);

        assert_eq!(lcd.set_cursor(2, 0).await, Err(Error::InvalidArgument));
        assert_eq!(lcd.set_cursor(0, 16).await, Err(Error::InvalidArgument));
    }

    #[tokio::test]
    async fn test_backlight_off_clears_bit() {
        let i2c = MockI2c::new();
        let mut lcd = lcd(&i2c);

        lcd.set_backlight(false).await.unwrap();
        lcd.write_str("é").await.unwrap();

        // '?' = 0x3F with RS only
        assert_eq!(
            i2c.written(),
            vec![vec![0x00], vec![0x35, 0x31, 0xF5, 0xF1]]
        );
    }

    #[tokio::test]
    async fn test_create_char() {
        let i2c = MockI2c::new();
        let mut lcd = lcd(&i2c);

        lcd.create_char(2, &[0x1F; 8]).await.unwrap();
        assert_eq!(lcd.create_char(8, &[0; 8]).await, Err(Error::InvalidArgument));

        let written = i2c.written();
        assert_eq!(written.len(), 10);
        // CGRAM address 0x50
        assert_eq!(written[0], vec![0x5C, 0x58, 0x0C, 0x08]);
        assert_eq!(written[9], vec![0x8C, 0x88, 0x0C, 0x08]);
    }

    #[tokio::test]
    async fn test_shift_and_display_control() {
        let i2c = MockI2c::new();
        let mut lcd = lcd(&i2c);

        lcd.shift_display(ShiftDirection::Right).await.unwrap();
        lcd.display_control(DisplayControl {
            display: true,
            cursor: true,
            blink: true,
        })
        .await
        .unwrap();

        assert_eq!(
            i2c.written(),
            vec![vec![0x1C, 0x18, 0xCC, 0xC8], vec![0x0C, 0x08, 0xFC, 0xF8]]
        );
    }

    #[test]
    fn test_invalid_geometry() {
        let config = CharLcdConfig {
            rows: 5,
            ..Default::default()
        };
        assert!(CharLcd::new(MockI2c::new(), config).is_err());
    }
}
