use bme280::Measurements;

pub mod config;
pub mod display;
pub mod error;
pub mod lcd;
pub mod monitor;
pub mod sensor;
pub mod shutdown;

/// One snapshot of the sensor in physical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    /// Hectopascals.
    pub pressure: f64,
}

impl Reading {
    pub fn new(temperature: f64, humidity: f64, pressure: f64) -> Self {
        Self {
            temperature,
            humidity,
            pressure,
        }
    }

    /// Builds a reading from the units the BME280 driver reports, where
    /// pressure comes in pascals.
    pub fn from_sensor_units(temperature: f32, humidity: f32, pressure_pa: f32) -> Self {
        Self {
            temperature: f64::from(temperature),
            humidity: f64::from(humidity),
            pressure: f64::from(pressure_pa) / 100.0,
        }
    }
}

impl<E> From<Measurements<E>> for Reading {
    fn from(value: Measurements<E>) -> Self {
        Self::from_sensor_units(value.temperature, value.humidity, value.pressure)
    }
}

impl std::fmt::Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "temperature: {}, humidity: {}, pressure: {}",
            self.temperature, self.humidity, self.pressure
        )
    }
}
