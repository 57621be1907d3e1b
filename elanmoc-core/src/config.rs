//! Session configuration

use std::time::Duration;

use crate::constants::{USB_RECV_TIMEOUT_MS, USB_SEND_TIMEOUT_MS};

/// Tunables for a device session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Bulk OUT timeout
    pub send_timeout: Duration,

    /// Bulk IN timeout (bounds how long a capture waits for a finger)
    pub receive_timeout: Duration,

    /// Consecutive capture retries tolerated before failing
    ///
    /// `None` retries for as long as the user keeps touching the sensor.
    pub max_retries: Option<u32>,
}

impl SessionConfig {
    /// Set bulk OUT timeout
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Set bulk IN timeout
    pub fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = timeout;
        self
    }

    /// Cap consecutive capture retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            send_timeout: Duration::from_millis(USB_SEND_TIMEOUT_MS),
            receive_timeout: Duration::from_millis(USB_RECV_TIMEOUT_MS),
            max_retries: None,
        }
    }
}
