//! GPIO access for the button
//!
//! [`ButtonPin`] is the narrow surface the debounce state machine needs from a pin:
//! sample the level, get notified on every edge, and release the line. [`GpioPin`]
//! implements it on top of `rppal` for Raspberry Pi class boards.

use rppal::gpio::{Event, Gpio, InputPin, Trigger};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::ButtonError;

/// Callback invoked from the interrupt context on every rising or falling edge
pub type EdgeCallback = Box<dyn FnMut() + Send + 'static>;

/// An input pin exclusively owned by one button
pub trait ButtonPin: Send + 'static {
    /// Current raw level, `true` for high
    fn read_level(&self) -> Result<bool, ButtonError>;

    /// Deliver both rising and falling edges to `callback`, replacing any previous one
    fn subscribe_edges(&mut self, callback: EdgeCallback) -> Result<(), ButtonError>;

    fn unsubscribe_edges(&mut self) -> Result<(), ButtonError>;

    /// Release the underlying line. Further reads fail.
    fn close(&mut self) -> Result<(), ButtonError>;
}

/// Input bias applied when the pin is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullMode {
    None,
    Up,
    Down,
}

/// Raspberry Pi GPIO line (BCM numbering) configured as input
pub struct GpioPin {
    bcm: u8,
    pin: Option<InputPin>,
}

impl GpioPin {
    pub fn open(bcm: u8, pull: PullMode) -> Result<Self, ButtonError> {
        info!("Opening GPIO {} as input (pull: {:?})", bcm, pull);

        let gpio = Gpio::new()?;
        let pin = gpio.get(bcm)?;
        let input = match pull {
            PullMode::None => pin.into_input(),
            PullMode::Up => pin.into_input_pullup(),
            PullMode::Down => pin.into_input_pulldown(),
        };

        debug!("GPIO {} configured as input", bcm);
        Ok(Self {
            bcm,
            pin: Some(input),
        })
    }

    fn input_mut(&mut self) -> Result<&mut InputPin, ButtonError> {
        let bcm = self.bcm;
        self.pin
            .as_mut()
            .ok_or_else(|| ButtonError::Io(format!("GPIO {} already closed", bcm)))
    }
}

impl ButtonPin for GpioPin {
    fn read_level(&self) -> Result<bool, ButtonError> {
        self.pin
            .as_ref()
            .map(|pin| pin.is_high())
            .ok_or_else(|| ButtonError::Io(format!("GPIO {} already closed", self.bcm)))
    }

    fn subscribe_edges(&mut self, mut callback: EdgeCallback) -> Result<(), ButtonError> {
        let bcm = self.bcm;
        // rppal's own debounce stays off, the button does trailing-edge debouncing
        self.input_mut()?
            .set_async_interrupt(Trigger::Both, None, move |_event: Event| callback())?;
        debug!("Subscribed to both edges on GPIO {}", bcm);
        Ok(())
    }

    fn unsubscribe_edges(&mut self) -> Result<(), ButtonError> {
        if let Some(pin) = self.pin.as_mut() {
            pin.clear_async_interrupt()?;
            debug!("Cleared edge interrupt on GPIO {}", self.bcm);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), ButtonError> {
        match self.pin.take() {
            Some(pin) => {
                drop(pin);
                info!("Released GPIO {}", self.bcm);
            }
            None => warn!("GPIO {} closed twice", self.bcm),
        }
        Ok(())
    }
}
