use std::cell::RefCell;

use bme_lcd::{
    config::{Config, sensor_settings},
    error::MonitorError,
    lcd::Lcd,
    monitor::{Monitor, StdoutConsole},
    sensor::SensorReader,
    shutdown::Shutdown,
};
use embedded_hal_bus::i2c::RefCellDevice;
use linux_embedded_hal::{Delay, I2cdev};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), MonitorError> {
    // Logs go to stderr, stdout carries the readings.
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("info"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        error!("Monitor failed: {e}");
        return Err(e);
    }
    Ok(())
}

async fn run() -> Result<(), MonitorError> {
    let config = Config::from_env()?;
    let bus_path = config.bus_path();
    info!(
        "Opening {bus_path}, sensor at {:#04x}, LCD at {:#04x}",
        config.sensor_address.as_u8(),
        config.lcd_address
    );

    let bus = I2cdev::new(&bus_path)
        .map_err(|e| MonitorError::Transport(format!("opening {bus_path}: {e}")))?;
    let bus = RefCell::new(bus);

    let shutdown = Shutdown::new();
    let _interrupt = shutdown.listen_for_interrupt()?;

    let mut lcd = Lcd::new(RefCellDevice::new(&bus), config.lcd_address, Delay);
    lcd.init()?;
    let sensor = SensorReader::initialize(
        RefCellDevice::new(&bus),
        config.sensor_address,
        sensor_settings(),
        Delay,
    )?;

    Monitor::new(sensor, lcd, StdoutConsole, shutdown)
        .with_banner(config.banner)
        .run()
        .await
}
