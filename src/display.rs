//! Turns a [`Reading`] into the two text lines shown on the console and LCD.
//!
//! Values are printed with `{:.2}`: the exact binary value of the `f64` is
//! rounded to two fractional digits, with exact ties going to the even digit.

use crate::Reading;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayLines {
    pub line1: String,
    pub line2: String,
}

impl From<&Reading> for DisplayLines {
    fn from(reading: &Reading) -> Self {
        Self {
            line1: format!("T:{:.2} U:{:.2}", reading.temperature, reading.humidity),
            line2: format!("P:{:.2}", reading.pressure),
        }
    }
}
