//! Session management for the sensor protocol
//!
//! A [`Session`] tracks the lifecycle of a device handle:
//! - Open/closed state
//! - The single operation currently running
//! - Cancellation requests from other tasks
//!
//! The per-operation protocol state shared by all state machines lives in
//! [`Context`].

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use tracing::debug;

use crate::{
    command::Command,
    config::SessionConfig,
    error::{Error, Result},
    frame::Request,
    status::RetryReason,
    variant::DeviceVariant,
};

/// Operations a device can run
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    Enroll,
    Identify,
    Verify,
    List,
    Delete,
    ClearStorage,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Enroll => "enroll",
            Self::Identify => "identify",
            Self::Verify => "verify",
            Self::List => "list",
            Self::Delete => "delete",
            Self::ClearStorage => "clear-storage",
        };
        f.write_str(name)
    }
}

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Device not opened
    Closed,

    /// Opened, no operation running
    Idle,

    /// Running an operation
    Busy(Operation),
}

/// Session manager
///
/// Thread-safe and can be cloned cheaply (Arc internally). Clones are used
/// to request cancellation while the device is borrowed by an operation.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    state: parking_lot::RwLock<SessionState>,

    cancel_requested: AtomicBool,

    cancel_notify: Notify,
}

impl Session {
    /// Create a new closed session
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SessionInner {
                state: parking_lot::RwLock::new(SessionState::Closed),
                cancel_requested: AtomicBool::new(false),
                cancel_notify: Notify::new(),
            }),
        }
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        *self.inner.state.read()
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.state(), SessionState::Closed)
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state(), SessionState::Busy(_))
    }

    /// Operation currently running
    pub fn active_operation(&self) -> Option<Operation> {
        match self.state() {
            SessionState::Busy(operation) => Some(operation),
            _ => None,
        }
    }

    /// Mark the session open
    pub fn open(&self) -> Result<()> {
        let mut state = self.inner.state.write();

        if *state != SessionState::Closed {
            return Err(Error::InvalidSessionState(format!(
                "Cannot open from state: {:?}",
                *state
            )));
        }

        *state = SessionState::Idle;
        Ok(())
    }

    /// Claim the session for an operation
    ///
    /// Clears any cancellation left over from a previous operation.
    pub fn begin(&self, operation: Operation) -> Result<()> {
        let mut state = self.inner.state.write();

        match *state {
            SessionState::Closed => return Err(Error::SessionNotOpen),
            SessionState::Busy(active) => return Err(Error::Busy { active }),
            SessionState::Idle => {}
        }

        self.inner.cancel_requested.store(false, Ordering::Release);
        *state = SessionState::Busy(operation);
        debug!(%operation, "Operation started");
        Ok(())
    }

    /// Release the session after an operation completed or failed
    pub fn finish(&self) {
        let mut state = self.inner.state.write();

        if let SessionState::Busy(operation) = *state {
            debug!(%operation, "Operation finished");
            *state = SessionState::Idle;
        }
    }

    /// Close session
    pub fn close(&self) {
        *self.inner.state.write() = SessionState::Closed;
        self.cancel();
    }

    /// Request cancellation of the running operation
    pub fn cancel(&self) {
        self.inner.cancel_requested.store(true, Ordering::Release);
        self.inner.cancel_notify.notify_waiters();
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.inner.cancel_requested.load(Ordering::Acquire)
    }

    /// Wait until cancellation is requested
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.cancel_notify.notified();
            if self.is_cancel_requested() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Protocol state shared by the operation state machines
#[derive(Debug, Clone)]
pub struct Context {
    variant: DeviceVariant,

    max_retries: Option<u32>,

    /// Number of prints the sensor reported
    pub enrolled_num: u8,

    /// Slot the current state works on
    pub print_index: u8,

    retries: u32,

    /// Commands treated as inapplicable regardless of the variant
    #[cfg(test)]
    skipped: Vec<Command>,
}

impl Context {
    pub fn new(variant: DeviceVariant, config: &SessionConfig) -> Self {
        Self {
            variant,
            max_retries: config.max_retries,
            enrolled_num: 0,
            print_index: 0,
            retries: 0,
            #[cfg(test)]
            skipped: Vec::new(),
        }
    }

    /// Skip `command` as if the variant did not support it
    #[cfg(test)]
    pub(crate) fn skipping(mut self, command: Command) -> Self {
        self.skipped.push(command);
        self
    }

    #[cfg(test)]
    fn is_skipped(&self, command: Command) -> bool {
        self.skipped.contains(&command)
    }

    #[cfg(not(test))]
    fn is_skipped(&self, _command: Command) -> bool {
        false
    }

    pub fn variant(&self) -> DeviceVariant {
        self.variant
    }

    /// Build a request, or `None` when the command is skipped on this variant
    pub fn prepare(&self, command: Command) -> Option<Request> {
        if self.is_skipped(command) {
            return None;
        }
        Request::prepare(command, self.variant)
    }

    /// Reset per-operation state
    pub fn reset(&mut self) {
        self.enrolled_num = 0;
        self.print_index = 0;
        self.retries = 0;
    }

    /// Count a rejected capture
    ///
    /// # Errors
    ///
    /// Returns [`Error::RetryLimitExceeded`] once the configured cap is
    /// passed.
    pub fn record_retry(&mut self, reason: RetryReason) -> Result<()> {
        self.retries += 1;

        match self.max_retries {
            Some(limit) if self.retries > limit => {
                Err(Error::RetryLimitExceeded { limit, last: reason })
            }
            _ => Ok(()),
        }
    }

    /// Forget previous retries after a successful capture
    pub fn reset_retries(&mut self) {
        self.retries = 0;
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }
}
