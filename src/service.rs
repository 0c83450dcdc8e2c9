//! Button service lifecycle with statum state machine
//!
//! Ties an [`InputBridge`] to the lifetime of the daemon:
//!
//! ```text
//! Created ──start──► Running ──stop──► Stopped ──shutdown──► (closed)
//!                       ▲                 │
//!                       └────restart──────┘
//! ```
//!
//! `start` registers the virtual device, `stop` unregisters it and `shutdown` closes
//! the bridge, releasing the pin.

use statum::{machine, state};
use tracing::info;

use crate::config::ButtonConfig;
use crate::input::{BridgeError, InputBridge};

#[state]
#[derive(Debug, Clone)]
pub enum ServiceState {
    Created,
    Running,
    Stopped,
}

#[machine]
pub struct ButtonService<S: ServiceState> {
    bridge: InputBridge,
    config: ButtonConfig,
}

impl<S: ServiceState> ButtonService<S> {
    pub fn config(&self) -> &ButtonConfig {
        &self.config
    }

    pub fn is_registered(&self) -> bool {
        self.bridge.is_registered()
    }
}

impl ButtonService<Created> {
    /// Opens the configured pin and uinput backend
    pub fn create(config: ButtonConfig) -> Result<Self, BridgeError> {
        info!("Creating button service on GPIO {}", config.pin);
        let bridge = InputBridge::from_config(&config)?;
        Ok(Self::new(bridge, config))
    }

    pub fn from_bridge(bridge: InputBridge, config: ButtonConfig) -> Self {
        Self::new(bridge, config)
    }

    pub fn start(mut self) -> Result<ButtonService<Running>, BridgeError> {
        self.bridge.register()?;
        info!("Button service running, key code {}", self.config.key_code);
        Ok(self.transition())
    }
}

impl ButtonService<Running> {
    pub fn stop(mut self) -> ButtonService<Stopped> {
        self.bridge.unregister();
        info!("Button service stopped");
        self.transition()
    }
}

impl ButtonService<Stopped> {
    pub fn restart(mut self) -> Result<ButtonService<Running>, BridgeError> {
        self.bridge.register()?;
        info!("Button service restarted");
        Ok(self.transition())
    }

    /// Closes the bridge and releases the pin
    pub async fn shutdown(mut self) -> Result<(), BridgeError> {
        self.bridge.close().await?;
        info!("Button service shut down");
        Ok(())
    }
}
