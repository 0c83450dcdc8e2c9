//! In-memory pin and input subsystem used by the unit tests

use std::sync::{Arc, Mutex};
use tokio::time::Instant;

use crate::button::{ButtonError, ButtonPin, EdgeCallback, EventListener};
use crate::input::{BridgeError, InputSubsystem, VirtualKeyDevice};

#[derive(Default)]
struct PinState {
    level: bool,
    callback: Option<EdgeCallback>,
    fail_reads: bool,
    fail_subscribe: bool,
    fail_close: bool,
    closed: bool,
    close_count: usize,
}

/// Pin whose level is set by the test; `drive` also raises an edge
#[derive(Clone, Default)]
pub struct MockPin {
    state: Arc<Mutex<PinState>>,
}

impl MockPin {
    pub fn new(level: bool) -> Self {
        let pin = Self::default();
        pin.set_level(level);
        pin
    }

    pub fn handle(&self) -> Box<dyn ButtonPin> {
        Box::new(self.clone())
    }

    pub fn set_level(&self, level: bool) {
        self.state.lock().unwrap().level = level;
    }

    /// Changes the level and fires the edge callback like the interrupt thread would
    pub fn drive(&self, level: bool) {
        let mut state = self.state.lock().unwrap();
        state.level = level;
        if let Some(callback) = state.callback.as_mut() {
            callback();
        }
    }

    pub fn fail_reads(&self, fail: bool) {
        self.state.lock().unwrap().fail_reads = fail;
    }

    pub fn fail_subscribe(&self, fail: bool) {
        self.state.lock().unwrap().fail_subscribe = fail;
    }

    pub fn fail_close(&self, fail: bool) {
        self.state.lock().unwrap().fail_close = fail;
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    pub fn is_subscribed(&self) -> bool {
        self.state.lock().unwrap().callback.is_some()
    }

    pub fn close_count(&self) -> usize {
        self.state.lock().unwrap().close_count
    }
}

impl ButtonPin for MockPin {
    fn read_level(&self) -> Result<bool, ButtonError> {
        let state = self.state.lock().unwrap();
        if state.fail_reads || state.closed {
            return Err(ButtonError::Io("mock read failure".to_string()));
        }
        Ok(state.level)
    }

    fn subscribe_edges(&mut self, callback: EdgeCallback) -> Result<(), ButtonError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_subscribe {
            return Err(ButtonError::Io("mock subscribe failure".to_string()));
        }
        state.callback = Some(callback);
        Ok(())
    }

    fn unsubscribe_edges(&mut self) -> Result<(), ButtonError> {
        self.state.lock().unwrap().callback = None;
        Ok(())
    }

    fn close(&mut self) -> Result<(), ButtonError> {
        let mut state = self.state.lock().unwrap();
        state.close_count += 1;
        if state.fail_close {
            return Err(ButtonError::Io("mock close failure".to_string()));
        }
        state.closed = true;
        Ok(())
    }
}

pub type RecordedEvents = Arc<Mutex<Vec<(bool, Instant)>>>;

/// Listener recording every `pressed` value with the (paused) tokio time it arrived
pub fn recording_listener() -> (EventListener, RecordedEvents) {
    let events: RecordedEvents = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let listener: EventListener = Box::new(move |pressed| {
        sink.lock().unwrap().push((pressed, Instant::now()));
    });
    (listener, events)
}

#[derive(Default)]
struct InputState {
    created: usize,
    live: usize,
    names: Vec<String>,
    advertised: Vec<Vec<u16>>,
    emitted: Vec<(u16, bool)>,
    fail_create: bool,
}

/// Input subsystem keeping track of created devices and emitted key events
#[derive(Clone, Default)]
pub struct MockInput {
    state: Arc<Mutex<InputState>>,
}

impl MockInput {
    pub fn created(&self) -> usize {
        self.state.lock().unwrap().created
    }

    pub fn live(&self) -> usize {
        self.state.lock().unwrap().live
    }

    pub fn names(&self) -> Vec<String> {
        self.state.lock().unwrap().names.clone()
    }

    pub fn advertised(&self) -> Vec<Vec<u16>> {
        self.state.lock().unwrap().advertised.clone()
    }

    pub fn emitted(&self) -> Vec<(u16, bool)> {
        self.state.lock().unwrap().emitted.clone()
    }

    pub fn fail_create(&self, fail: bool) {
        self.state.lock().unwrap().fail_create = fail;
    }
}

impl InputSubsystem for MockInput {
    fn create_device(
        &self,
        name: &str,
        key_codes: &[u16],
    ) -> Result<Box<dyn VirtualKeyDevice>, BridgeError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_create {
            return Err(BridgeError::Device("mock uinput failure".to_string()));
        }
        state.created += 1;
        state.live += 1;
        state.names.push(name.to_string());
        state.advertised.push(key_codes.to_vec());
        Ok(Box::new(MockDevice {
            state: self.state.clone(),
        }))
    }
}

struct MockDevice {
    state: Arc<Mutex<InputState>>,
}

impl VirtualKeyDevice for MockDevice {
    fn emit_key(&mut self, key_code: u16, pressed: bool) -> Result<(), BridgeError> {
        self.state.lock().unwrap().emitted.push((key_code, pressed));
        Ok(())
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        self.state.lock().unwrap().live -= 1;
    }
}
