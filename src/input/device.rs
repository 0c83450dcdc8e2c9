//! Virtual key devices
//!
//! A device exists on the host for as long as its handle is alive; dropping the
//! handle removes it from the input subsystem.

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, Key};
use tracing::{debug, info};

use super::error::BridgeError;

/// A registered virtual input device able to emit key events
pub trait VirtualKeyDevice: Send + 'static {
    fn emit_key(&mut self, key_code: u16, pressed: bool) -> Result<(), BridgeError>;
}

/// Host facility creating virtual input devices
pub trait InputSubsystem: Send + Sync + 'static {
    /// Creates and registers a device advertising exactly `key_codes`
    fn create_device(
        &self,
        name: &str,
        key_codes: &[u16],
    ) -> Result<Box<dyn VirtualKeyDevice>, BridgeError>;
}

/// Linux uinput (`/dev/uinput`)
#[derive(Debug, Default, Clone, Copy)]
pub struct UinputSubsystem;

impl InputSubsystem for UinputSubsystem {
    fn create_device(
        &self,
        name: &str,
        key_codes: &[u16],
    ) -> Result<Box<dyn VirtualKeyDevice>, BridgeError> {
        let mut keys = AttributeSet::<Key>::new();
        for code in key_codes {
            keys.insert(Key::new(*code));
        }

        let device = VirtualDeviceBuilder::new()?
            .name(name)
            .with_keys(&keys)?
            .build()?;

        info!("Created uinput device '{}' with keys {:?}", name, key_codes);
        Ok(Box::new(UinputDevice {
            name: name.to_string(),
            device,
        }))
    }
}

struct UinputDevice {
    name: String,
    device: VirtualDevice,
}

impl VirtualKeyDevice for UinputDevice {
    fn emit_key(&mut self, key_code: u16, pressed: bool) -> Result<(), BridgeError> {
        let event = InputEvent::new(EventType::KEY, key_code, i32::from(pressed));
        // emit() terminates the batch with SYN_REPORT
        self.device.emit(&[event])?;
        Ok(())
    }
}

impl Drop for UinputDevice {
    fn drop(&mut self) {
        debug!("Destroying uinput device '{}'", self.name);
    }
}
