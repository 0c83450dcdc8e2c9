//! Input Bridge - debounced button as a virtual key
//!
//! Owns a [`LogicalButton`] and, while registered, a virtual input device advertising
//! a single key. Every debounced press/release becomes a key-down/key-up for that key.
//!
//! # Lifecycle
//!
//! ```text
//! open ──► register ◄──► unregister ──► close
//!             │                          ▲
//!             └──────────────────────────┘
//! ```
//!
//! The device is created on the first `register()` and destroyed on `unregister()`,
//! independently of the button, which lives until `close()`.

use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info};

use crate::button::{
    ButtonPin, ButtonSettings, EventListener, GpioPin, LogicalButton, Polarity,
};
use crate::config::ButtonConfig;

use super::device::{InputSubsystem, UinputSubsystem, VirtualKeyDevice};
use super::error::BridgeError;

/// Name of the virtual input device unless configured otherwise
pub const DEFAULT_DEVICE_NAME: &str = "button";

// Shared between the bridge and the installed listener; emptied on unregister
type DeviceSlot = Arc<Mutex<Option<Box<dyn VirtualKeyDevice>>>>;

pub struct InputBridge {
    button: Option<LogicalButton>,
    key_code: u16,
    device_name: String,
    subsystem: Arc<dyn InputSubsystem>,
    device: Option<DeviceSlot>,
}

impl InputBridge {
    /// Opens BCM pin `pin` and binds a button emitting `key_code` through uinput
    pub fn open(pin: u8, polarity: Polarity, key_code: u16) -> Result<Self, BridgeError> {
        let gpio = GpioPin::open(pin, polarity.default_pull())?;
        let settings = ButtonSettings {
            polarity,
            ..ButtonSettings::default()
        };
        Self::with_pin(Box::new(gpio), settings, key_code, Arc::new(UinputSubsystem))
    }

    pub fn from_config(config: &ButtonConfig) -> Result<Self, BridgeError> {
        info!("Opening input bridge from config: {:?}", config);
        let gpio = GpioPin::open(config.pin, config.pull())?;
        let bridge = Self::with_pin(
            Box::new(gpio),
            config.settings(),
            config.key_code,
            Arc::new(UinputSubsystem),
        )?;
        Ok(bridge.with_device_name(&config.device_name))
    }

    /// Binds a button to an already opened pin and an arbitrary input subsystem
    ///
    /// On failure the pin has been released before the error is returned.
    pub fn with_pin(
        pin: Box<dyn ButtonPin>,
        settings: ButtonSettings,
        key_code: u16,
        subsystem: Arc<dyn InputSubsystem>,
    ) -> Result<Self, BridgeError> {
        let button = LogicalButton::spawn(pin, settings)?;
        debug!(
            "Input bridge created for key code {} ({:?})",
            key_code,
            button.polarity()
        );

        Ok(Self {
            button: Some(button),
            key_code,
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            subsystem,
            device: None,
        })
    }

    pub fn with_device_name(mut self, name: &str) -> Self {
        self.device_name = name.to_string();
        self
    }

    pub fn key_code(&self) -> u16 {
        self.key_code
    }

    pub fn is_registered(&self) -> bool {
        self.device.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.button.is_none()
    }

    /// Creates the virtual device and starts forwarding button events to it
    ///
    /// Registering an already registered bridge does nothing.
    pub fn register(&mut self) -> Result<(), BridgeError> {
        let Some(button) = self.button.as_ref() else {
            return Err(BridgeError::IllegalState(
                "cannot register closed driver".to_string(),
            ));
        };
        if self.device.is_some() {
            debug!("Input bridge already registered");
            return Ok(());
        }

        let device = self
            .subsystem
            .create_device(&self.device_name, &[self.key_code])?;
        let slot: DeviceSlot = Arc::new(Mutex::new(Some(device)));
        button.set_event_listener(Some(key_listener(slot.clone(), self.key_code)));
        self.device = Some(slot);

        info!(
            "Registered input device '{}' for key code {}",
            self.device_name, self.key_code
        );
        Ok(())
    }

    /// Removes the virtual device; no-op when not registered
    pub fn unregister(&mut self) {
        let Some(slot) = self.device.take() else {
            return;
        };

        if let Some(button) = self.button.as_ref() {
            button.set_event_listener(None);
        }
        // Destroys the device now, a listener still in flight finds the slot empty
        let device = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
        drop(device);

        info!("Unregistered input device '{}'", self.device_name);
    }

    pub fn set_debounce_delay(&mut self, window_ms: i64) -> Result<(), BridgeError> {
        match self.button.as_mut() {
            Some(button) => Ok(button.set_debounce_delay(window_ms)?),
            None => Err(BridgeError::IllegalState(
                "cannot configure closed driver".to_string(),
            )),
        }
    }

    /// Unregisters, then closes the button and releases its pin. Idempotent.
    pub async fn close(&mut self) -> Result<(), BridgeError> {
        self.unregister();
        if let Some(mut button) = self.button.take() {
            button.close().await?;
            info!("Input bridge closed");
        }
        Ok(())
    }
}

impl Drop for InputBridge {
    fn drop(&mut self) {
        // The button requests its own teardown when dropped
        self.unregister();
    }
}

fn key_listener(slot: DeviceSlot, key_code: u16) -> EventListener {
    Box::new(move |pressed| {
        let mut device = slot.lock().unwrap_or_else(PoisonError::into_inner);
        match device.as_mut() {
            Some(device) => match device.emit_key(key_code, pressed) {
                Ok(()) => debug!(
                    "Emitted key {} {}",
                    key_code,
                    if pressed { "down" } else { "up" }
                ),
                Err(e) => error!("Failed to emit key event: {}", e),
            },
            None => debug!("Input device gone, dropping key event"),
        }
    })
}
