//! 16x2 HD44780 character LCD behind a PCF8574 I2C backpack.
//!
//! The expander pins are wired P0=RS, P1=RW, P2=EN, P3=backlight and
//! P4..P7=D4..D7, so the controller is driven in 4-bit mode, one nibble per
//! expander write pair.

use embedded_hal::{delay::DelayNs, i2c::I2c};
use tracing::{debug, error};

use crate::error::MonitorError;

pub const COLUMNS: usize = 16;

const REGISTER_SELECT: u8 = 0b0000_0001;
const ENABLE: u8 = 0b0000_0100;
const BACKLIGHT: u8 = 0b0000_1000;

const CLEAR_DISPLAY: u8 = 0x01;
const ENTRY_MODE_INCREMENT: u8 = 0x06;
const DISPLAY_ON_CURSOR_OFF: u8 = 0x0c;
const FUNCTION_4BIT_2LINE: u8 = 0x28;
const SET_DDRAM_ADDRESS: u8 = 0x80;

/// Rows of the 2-line display, top first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
    First,
    Second,
}

impl Row {
    fn ddram_offset(self) -> u8 {
        match self {
            Row::First => 0x00,
            Row::Second => 0x40,
        }
    }
}

/// A line-oriented text output.
pub trait DisplaySurface {
    /// Replaces the whole row with `text`, clipped or padded to the width.
    fn write_line(&mut self, row: Row, text: &str) -> Result<(), MonitorError>;
}

pub struct Lcd<I2C, D> {
    i2c: I2C,
    address: u8,
    delay: D,
}

impl<I2C, D> Lcd<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    pub fn new(i2c: I2C, address: u8, delay: D) -> Self {
        Self {
            i2c,
            address,
            delay,
        }
    }

    /// Runs the power-on sequence: force 8-bit mode three times, drop to
    /// 4-bit, then configure two lines, no cursor and a clean screen.
    pub fn init(&mut self) -> Result<(), MonitorError> {
        self.delay.delay_ms(50);
        self.write_nibble(0x03, 0)?;
        self.delay.delay_us(4_500);
        self.write_nibble(0x03, 0)?;
        self.delay.delay_us(4_500);
        self.write_nibble(0x03, 0)?;
        self.delay.delay_us(150);
        self.write_nibble(0x02, 0)?;

        self.command(FUNCTION_4BIT_2LINE)?;
        self.command(DISPLAY_ON_CURSOR_OFF)?;
        self.clear()?;
        self.command(ENTRY_MODE_INCREMENT)?;
        debug!("LCD at {:#04x} initialized", self.address);
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), MonitorError> {
        self.command(CLEAR_DISPLAY)?;
        self.delay.delay_ms(2);
        Ok(())
    }

    fn command(&mut self, command: u8) -> Result<(), MonitorError> {
        self.send(command, 0)
    }

    fn send(&mut self, byte: u8, mode: u8) -> Result<(), MonitorError> {
        self.write_nibble(byte >> 4, mode)?;
        self.write_nibble(byte & 0x0f, mode)
    }

    fn write_nibble(&mut self, nibble: u8, mode: u8) -> Result<(), MonitorError> {
        let data = (nibble << 4) | BACKLIGHT | mode;
        self.expander_write(data | ENABLE)?;
        self.delay.delay_us(1);
        self.expander_write(data)?;
        self.delay.delay_us(50);
        Ok(())
    }

    fn expander_write(&mut self, data: u8) -> Result<(), MonitorError> {
        self.i2c.write(self.address, &[data]).map_err(|e| {
            error!("LCD write to {:#04x} failed: {e:?}", self.address);
            MonitorError::Display(format!("{e:?}"))
        })
    }
}

impl<I2C, D> DisplaySurface for Lcd<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    fn write_line(&mut self, row: Row, text: &str) -> Result<(), MonitorError> {
        self.command(SET_DDRAM_ADDRESS | row.ddram_offset())?;
        let glyphs = text
            .chars()
            .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
            .chain(std::iter::repeat(b' '))
            .take(COLUMNS);
        for glyph in glyphs {
            self.send(glyph, REGISTER_SELECT)?;
        }
        Ok(())
    }
}
