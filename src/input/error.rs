//! Error definitions for the input bridge

use thiserror::Error;

use crate::button::ButtonError;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// Error from the underlying button, including pin I/O failures
    #[error("Button error: {0}")]
    Button(#[from] ButtonError),

    /// Operation not allowed in the bridge's current state
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// Creating or writing to the virtual input device failed
    #[error("Input device error: {0}")]
    Device(String),
}

impl From<std::io::Error> for BridgeError {
    fn from(e: std::io::Error) -> Self {
        BridgeError::Device(e.to_string())
    }
}
