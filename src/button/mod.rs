//! Push-button subsystem
//!
//! Turns a bouncing digital input into clean press/release events:
//!
//! 1. [`pin`] - GPIO access (level reads and edge interrupts)
//! 2. [`logical_button`] - trailing-edge debounce state machine
//! 3. [`error`] - error types shared by both
//!
//! # Architecture
//!
//! ```text
//! rppal interrupt thread ──┐
//!                          ├──► command queue ──► button task ──► EventListener
//! debounce timer tasks  ───┘                     (owns pin + state)
//! ```

pub mod error;
pub mod logical_button;
pub mod pin;

use serde::{Deserialize, Serialize};

pub use error::ButtonError;
pub use logical_button::{ButtonSettings, EventListener, LogicalButton, DEFAULT_DEBOUNCE_MS};
pub use pin::{ButtonPin, EdgeCallback, GpioPin, PullMode};

/// Which raw electrical level means "pressed"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

impl Polarity {
    /// Raw level (true = high) that counts as pressed
    pub fn active_level(self) -> bool {
        match self {
            Polarity::ActiveHigh => true,
            Polarity::ActiveLow => false,
        }
    }

    pub fn is_pressed(self, level_high: bool) -> bool {
        level_high == self.active_level()
    }

    /// Bias that holds the line at its released level
    pub fn default_pull(self) -> PullMode {
        match self {
            Polarity::ActiveHigh => PullMode::Down,
            Polarity::ActiveLow => PullMode::Up,
        }
    }
}
