use std::time::Duration;

use bme280::{Configuration, IIRFilter, Oversampling};

use crate::{error::MonitorError, sensor::SensorAddress};

pub const DEFAULT_I2C_BUS: u8 = 1;
pub const DEFAULT_LCD_ADDRESS: u8 = 0x27;
pub const DEFAULT_BANNER: &str = "BME280 Monitor";
/// Pause between two readings. Not configurable.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

const I2C_BUS_VAR: &str = "BME_LCD_I2C_BUS";
const SENSOR_ADDRESS_VAR: &str = "BME_LCD_SENSOR_ADDRESS";
const LCD_ADDRESS_VAR: &str = "BME_LCD_LCD_ADDRESS";
const BANNER_VAR: &str = "BME_LCD_BANNER";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub i2c_bus: u8,
    pub sensor_address: SensorAddress,
    pub lcd_address: u8,
    pub banner: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            i2c_bus: DEFAULT_I2C_BUS,
            sensor_address: SensorAddress::Primary,
            lcd_address: DEFAULT_LCD_ADDRESS,
            banner: DEFAULT_BANNER.to_string(),
        }
    }
}

impl Config {
    /// Reads the process environment, after loading `.env` if one exists.
    pub fn from_env() -> Result<Self, MonitorError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, MonitorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(bus) = lookup(I2C_BUS_VAR) {
            config.i2c_bus = parse_number(I2C_BUS_VAR, &bus)?;
        }
        if let Some(address) = lookup(SENSOR_ADDRESS_VAR) {
            let address = parse_number(SENSOR_ADDRESS_VAR, &address)?;
            config.sensor_address = SensorAddress::try_from(address)?;
        }
        if let Some(address) = lookup(LCD_ADDRESS_VAR) {
            config.lcd_address = parse_number(LCD_ADDRESS_VAR, &address)?;
        }
        if let Some(banner) = lookup(BANNER_VAR) {
            config.banner = banner;
        }
        Ok(config)
    }

    pub fn bus_path(&self) -> String {
        format!("/dev/i2c-{}", self.i2c_bus)
    }
}

/// Humidity x1, pressure x16, temperature x2 oversampling with the IIR
/// filter at coefficient 16.
pub fn sensor_settings() -> Configuration {
    Configuration::default()
        .with_humidity_oversampling(Oversampling::Oversampling1X)
        .with_pressure_oversampling(Oversampling::Oversampling16X)
        .with_temperature_oversampling(Oversampling::Oversampling2X)
        .with_iir_filter(IIRFilter::Coefficient16)
}

/// Accepts decimal or `0x` prefixed hex.
fn parse_number(key: &str, value: &str) -> Result<u8, MonitorError> {
    let value = value.trim();
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|e| MonitorError::Config(format!("{key}={value}: {e}")))
}
