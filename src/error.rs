#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Error communicating with sensor: {0}")]
    Transport(String),
    #[error("Error writing to display: {0}")]
    Display(String),
    #[error("Error writing to console")]
    Console(#[from] std::io::Error),
    #[error("Config parsing error: {0}")]
    Config(String),
    #[error("Unable to listen for interrupts: {0}")]
    Signal(std::io::Error),
}
