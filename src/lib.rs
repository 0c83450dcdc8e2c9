//! Debounced GPIO push-button exposed as a virtual key on the host input subsystem.
//!
//! # Architecture
//!
//! ```text
//! Pin ──► edge interrupt ──► LogicalButton ──► InputBridge ──► uinput device
//!                            (debounce)        (key events)
//! ```
//!
//! - [`button`] - pin access and the debounce state machine
//! - [`input`] - virtual input device and the bridge translating button events to keys
//! - [`config`] - daemon configuration file
//! - [`service`] - lifecycle of the daemon (create, start, stop, shutdown)

pub mod button;
pub mod config;
pub mod input;
pub mod service;

#[cfg(test)]
mod testing;
