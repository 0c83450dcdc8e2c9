//! Error definitions for the button subsystem

use thiserror::Error;

/// Errors raised by pin access and the debounce state machine
#[derive(Debug, Error)]
pub enum ButtonError {
    /// Opening, configuring, reading or releasing the pin failed
    #[error("GPIO I/O error: {0}")]
    Io(String),

    /// Rejected argument, e.g. a negative debounce window
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The button task is gone or did not answer
    #[error("Channel error: {0}")]
    ChannelError(String),
}

impl From<rppal::gpio::Error> for ButtonError {
    fn from(e: rppal::gpio::Error) -> Self {
        ButtonError::Io(e.to_string())
    }
}
