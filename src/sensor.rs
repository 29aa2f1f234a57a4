use bme280::{Configuration, i2c::BME280};
use embedded_hal::{delay::DelayNs, i2c::I2c};
use tracing::{debug, info};

use crate::{Reading, error::MonitorError};

/// Anything the monitor loop can pull a [`Reading`] from.
pub trait Sensor {
    fn sample(&mut self) -> Result<Reading, MonitorError>;
}

/// The two addresses a BME280 can be strapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorAddress {
    /// SDO tied to ground, 0x76.
    Primary,
    /// SDO tied to VDDIO, 0x77.
    Secondary,
}

impl SensorAddress {
    pub fn as_u8(self) -> u8 {
        match self {
            SensorAddress::Primary => 0x76,
            SensorAddress::Secondary => 0x77,
        }
    }
}

impl TryFrom<u8> for SensorAddress {
    type Error = MonitorError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x76 => Ok(SensorAddress::Primary),
            0x77 => Ok(SensorAddress::Secondary),
            other => Err(MonitorError::Config(format!(
                "BME280 can only live at 0x76 or 0x77, got {other:#04x}"
            ))),
        }
    }
}

/// A BME280 with its calibration already loaded.
///
/// The only way to get one is [`SensorReader::initialize`], so sampling an
/// uncalibrated device cannot happen.
pub struct SensorReader<I2C, D> {
    driver: BME280<I2C>,
    delay: D,
    address: SensorAddress,
}

impl<I2C, D> SensorReader<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Loads the calibration parameters from the device and applies
    /// `settings`. No retries: a missing or silent device fails here.
    pub fn initialize(
        bus: I2C,
        address: SensorAddress,
        settings: Configuration,
        mut delay: D,
    ) -> Result<Self, MonitorError> {
        let mut driver = match address {
            SensorAddress::Primary => BME280::new_primary(bus),
            SensorAddress::Secondary => BME280::new_secondary(bus),
        };
        driver.init_with_config(&mut delay, settings).map_err(|e| {
            MonitorError::Transport(format!(
                "calibration load at {:#04x} failed: {e:?}",
                address.as_u8()
            ))
        })?;
        info!("BME280 at {:#04x} initialized", address.as_u8());
        Ok(Self {
            driver,
            delay,
            address,
        })
    }
}

impl<I2C, D> Sensor for SensorReader<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    fn sample(&mut self) -> Result<Reading, MonitorError> {
        let measurements = self.driver.measure(&mut self.delay).map_err(|e| {
            MonitorError::Transport(format!(
                "measurement at {:#04x} failed: {e:?}",
                self.address.as_u8()
            ))
        })?;
        let reading = Reading::from(measurements);
        debug!("Got reading: {reading}");
        Ok(reading)
    }
}
