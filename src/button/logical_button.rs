//! Trailing-edge debounce state machine for a single push-button
//!
//! Interrupt callbacks and debounce timers can fire in any order and from different
//! threads. Both are funnelled into one command queue consumed by a single tokio task
//! that owns the pin, the listener and the pending transition, so the state machine
//! itself needs no locking.
//!
//! # State Machine
//!
//! ```text
//!          RawEdge (window > 0)            RawEdge
//!   Idle ─────────────────────► Pending ◄─────────┐
//!    ▲ │                          │  │             │
//!    │ │ RawEdge (window = 0)     │  └─────────────┘
//!    │ └──► listener              │   cancel + re-sample + reschedule
//!    │                            │
//!    └────────────────────────────┘
//!       CheckDebounce: re-sample, fire listener if candidate still holds
//! ```

use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::error::ButtonError;
use super::pin::ButtonPin;
use super::Polarity;

/// Default debounce window, same as a typical tap timeout
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Receives `pressed` for every confirmed transition
pub type EventListener = Box<dyn FnMut(bool) + Send + 'static>;

#[derive(Clone, Debug)]
pub struct ButtonSettings {
    pub polarity: Polarity,
    pub debounce_ms: u64,
}

impl Default for ButtonSettings {
    fn default() -> Self {
        Self {
            polarity: Polarity::ActiveLow,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

enum ButtonCommand {
    RawEdge,
    CheckDebounce {
        generation: u64,
    },
    SetDebounceDelay(Duration),
    SetListener(Option<EventListener>),
    Close {
        ack: Option<oneshot::Sender<Result<(), ButtonError>>>,
    },
}

struct PendingTransition {
    candidate: bool,
    deadline: Instant,
    generation: u64,
    cancel: CancellationToken,
}

enum DebounceState {
    Idle,
    Pending(PendingTransition),
}

// Everything below is only touched from the button task
struct ButtonTask {
    pin: Option<Box<dyn ButtonPin>>,
    polarity: Polarity,
    debounce: Duration,
    listener: Option<EventListener>,
    state: DebounceState,
    // A cancelled timer may already have queued its check; stale generations are dropped
    generation: u64,
    commands: mpsc::UnboundedSender<ButtonCommand>,
}

impl ButtonTask {
    async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<ButtonCommand>) {
        debug!("Button task started");

        while let Some(command) = receiver.recv().await {
            match command {
                ButtonCommand::RawEdge => self.on_raw_edge(),
                ButtonCommand::CheckDebounce { generation } => self.on_debounce_check(generation),
                ButtonCommand::SetDebounceDelay(window) => {
                    self.cancel_pending();
                    self.debounce = window;
                    debug!("Debounce window set to {} ms", window.as_millis());
                }
                ButtonCommand::SetListener(listener) => {
                    debug!(
                        "Event listener {}",
                        if listener.is_some() { "installed" } else { "cleared" }
                    );
                    self.listener = listener;
                }
                ButtonCommand::Close { ack } => {
                    let result = self.shutdown();
                    if let Some(ack) = ack {
                        if ack.send(result).is_err() {
                            warn!("Close requester went away before acknowledgement");
                        }
                    }
                    break;
                }
            }
        }

        debug!("Button task finished");
    }

    fn on_raw_edge(&mut self) {
        let level = match self.pin.as_ref() {
            Some(pin) => pin.read_level(),
            None => return,
        };

        // Any new edge supersedes the outstanding check, also when the read fails
        self.cancel_pending();

        let high = match level {
            Ok(high) => high,
            Err(e) => {
                error!("Error reading button state: {}", e);
                return;
            }
        };
        let pressed = self.polarity.is_pressed(high);

        if self.debounce.is_zero() {
            self.dispatch(pressed);
        } else {
            self.schedule_check(pressed);
        }
    }

    fn on_debounce_check(&mut self, generation: u64) {
        let pending = match std::mem::replace(&mut self.state, DebounceState::Idle) {
            DebounceState::Pending(pending) if pending.generation == generation => pending,
            other => {
                debug!("Ignoring stale debounce check #{}", generation);
                self.state = other;
                return;
            }
        };

        let level = match self.pin.as_ref() {
            Some(pin) => pin.read_level(),
            None => return,
        };

        match level {
            Ok(high) if self.polarity.is_pressed(high) == pending.candidate => {
                self.dispatch(pending.candidate)
            }
            Ok(_) => debug!(
                "Level changed during debounce window, dropping candidate {}",
                pending.candidate
            ),
            Err(e) => error!("Unable to read button value: {}", e),
        }
    }

    fn schedule_check(&mut self, candidate: bool) {
        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;
        let deadline = Instant::now() + self.debounce;
        let cancel = CancellationToken::new();

        let token = cancel.clone();
        let commands = self.commands.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep_until(deadline) => {
                    // Receiver is gone once the button is closed
                    let _ = commands.send(ButtonCommand::CheckDebounce { generation });
                }
            }
        });

        debug!(
            "Debounce check #{} scheduled in {} ms (candidate pressed={})",
            generation,
            self.debounce.as_millis(),
            candidate
        );
        self.state = DebounceState::Pending(PendingTransition {
            candidate,
            deadline,
            generation,
            cancel,
        });
    }

    fn cancel_pending(&mut self) {
        if let DebounceState::Pending(pending) =
            std::mem::replace(&mut self.state, DebounceState::Idle)
        {
            pending.cancel.cancel();
            debug!(
                "Cancelled debounce check #{} ({} ms before deadline)",
                pending.generation,
                pending
                    .deadline
                    .saturating_duration_since(Instant::now())
                    .as_millis()
            );
        }
    }

    fn dispatch(&mut self, pressed: bool) {
        info!("Button {}", if pressed { "pressed" } else { "released" });
        match self.listener.as_mut() {
            Some(listener) => listener(pressed),
            None => debug!("No event listener installed, dropping event"),
        }
    }

    // Teardown always runs to completion, the first release error is reported afterwards
    fn shutdown(&mut self) -> Result<(), ButtonError> {
        self.cancel_pending();
        self.listener = None;

        let Some(mut pin) = self.pin.take() else {
            return Ok(());
        };

        let unsubscribed = pin.unsubscribe_edges();
        if let Err(e) = &unsubscribed {
            warn!("Failed to detach edge interrupt: {}", e);
        }
        let closed = pin.close();
        if let Err(e) = &closed {
            error!("Failed to release button pin: {}", e);
        }

        info!("Button closed");
        unsubscribed.and(closed)
    }
}

/// Handle to a debounced button
///
/// Spawns the button task on the current tokio runtime. Closing (or dropping) the
/// handle stops the task, detaches the interrupt and releases the pin.
pub struct LogicalButton {
    commands: mpsc::UnboundedSender<ButtonCommand>,
    polarity: Polarity,
    debounce_ms: u64,
    closed: bool,
    task: Option<JoinHandle<()>>,
}

impl LogicalButton {
    /// Binds a button to an already opened pin
    ///
    /// If the edge subscription fails the pin is closed before the error is returned.
    pub fn spawn(
        mut pin: Box<dyn ButtonPin>,
        settings: ButtonSettings,
    ) -> Result<Self, ButtonError> {
        info!("Creating logical button with settings: {:?}", settings);

        let (commands, receiver) = mpsc::unbounded_channel();

        let edges = commands.clone();
        let subscribed = pin.subscribe_edges(Box::new(move || {
            if edges.send(ButtonCommand::RawEdge).is_err() {
                debug!("Edge after button task stopped, ignoring");
            }
        }));
        if let Err(e) = subscribed {
            error!("Failed to subscribe to edge interrupts: {}", e);
            if let Err(close_err) = pin.close() {
                warn!("Failed to release pin after setup error: {}", close_err);
            }
            return Err(e);
        }

        let task = ButtonTask {
            pin: Some(pin),
            polarity: settings.polarity,
            debounce: Duration::from_millis(settings.debounce_ms),
            listener: None,
            state: DebounceState::Idle,
            generation: 0,
            commands: commands.clone(),
        };
        let handle = tokio::spawn(task.run(receiver));

        Ok(Self {
            commands,
            polarity: settings.polarity,
            debounce_ms: settings.debounce_ms,
            closed: false,
            task: Some(handle),
        })
    }

    /// Changes the debounce window; 0 fires events straight from the interrupt
    ///
    /// A negative window is rejected and leaves the button untouched. An accepted
    /// value cancels any pending check.
    pub fn set_debounce_delay(&mut self, window_ms: i64) -> Result<(), ButtonError> {
        let window = u64::try_from(window_ms).map_err(|_| {
            ButtonError::InvalidArgument(format!(
                "Debounce delay can not be negative: {} ms",
                window_ms
            ))
        })?;

        self.debounce_ms = window;
        if self.closed {
            debug!("Debounce delay changed on closed button");
            return Ok(());
        }
        self.send(ButtonCommand::SetDebounceDelay(Duration::from_millis(window)))
    }

    /// Replaces the listener; `None` removes it
    pub fn set_event_listener(&self, listener: Option<EventListener>) {
        if self.closed {
            debug!("Ignoring listener change on closed button");
            return;
        }
        if let Err(e) = self.send(ButtonCommand::SetListener(listener)) {
            warn!("Failed to update event listener: {}", e);
        }
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Cancels the pending check, detaches the interrupt, releases the pin and drops
    /// the listener. Once this returns the listener is never called again.
    ///
    /// Calling it again is a no-op. A failed pin release is returned, but the button
    /// is closed regardless.
    pub async fn close(&mut self) -> Result<(), ButtonError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let (ack, acked) = oneshot::channel();
        self.send(ButtonCommand::Close { ack: Some(ack) })?;

        let result = acked.await.map_err(|e| {
            ButtonError::ChannelError(format!("Button task dropped close request: {}", e))
        })?;

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("Button task terminated abnormally: {}", e);
            }
        }
        result
    }

    fn send(&self, command: ButtonCommand) -> Result<(), ButtonError> {
        self.commands
            .send(command)
            .map_err(|_| ButtonError::ChannelError("Button task is not running".to_string()))
    }
}

impl Drop for LogicalButton {
    fn drop(&mut self) {
        if !self.closed {
            debug!("Logical button dropped without close, requesting teardown");
            let _ = self.commands.send(ButtonCommand::Close { ack: None });
        }
    }
}
