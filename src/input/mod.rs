//! Host input side of the driver
//!
//! - [`device`] - virtual key devices (Linux uinput via `evdev`)
//! - [`bridge`] - [`InputBridge`], forwarding debounced button events as key events
//! - [`error`] - error types

pub mod bridge;
pub mod device;
pub mod error;

pub use bridge::{InputBridge, DEFAULT_DEVICE_NAME};
pub use device::{InputSubsystem, UinputSubsystem, VirtualKeyDevice};
pub use error::BridgeError;
