//! Error types for elanmoc-core

use crate::{
    command::Command,
    session::Operation,
    status::{FatalReason, RetryReason},
};

/// Result type alias for elanmoc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Frame is too short to be valid
    #[error("Frame too short: expected at least {expected} bytes, got {actual} bytes")]
    FrameTooShort {
        expected: usize,
        actual: usize,
    },

    /// Reply did not start with the frame marker
    #[error("Error receiving data from sensor: bad marker 0x{marker:02X} in reply to {command}")]
    InvalidMarker {
        command: Command,
        marker: u8,
    },

    /// Sensor reported a terminal condition
    #[error("Sensor error: {0}")]
    Sensor(FatalReason),

    /// Enroll commit was rejected
    #[error("Failed to store fingerprint (status 0x{0:02X})")]
    CommitFailed(u8),

    /// Storage still holds prints after a wipe
    #[error("Sensor erase requested but storage is not empty ({0} prints left)")]
    StorageNotEmpty(u8),

    /// Too many consecutive capture retries
    #[error("Gave up after {limit} retries (last: {last})")]
    RetryLimitExceeded {
        limit: u32,
        last: RetryReason,
    },

    /// Another operation is running
    #[error("Device busy with {active} operation")]
    Busy {
        active: Operation,
    },

    /// Invalid session state
    #[error("Invalid session state: {0}")]
    InvalidSessionState(String),

    /// Session not opened
    #[error("Session not open - open the device first")]
    SessionNotOpen,

    /// Print data error
    #[error("Print error: {0}")]
    Print(#[from] elanmoc_types::Error),
}

impl Error {
    /// Check if the sensor reported a terminal condition
    pub fn is_sensor_error(&self) -> bool {
        matches!(
            self,
            Self::Sensor(_)
                | Self::CommitFailed(_)
                | Self::StorageNotEmpty(_)
        )
    }

    /// Check if the device must be reopened before further use
    pub fn requires_reopen(&self) -> bool {
        matches!(
            self,
            Self::FrameTooShort { .. }
                | Self::InvalidMarker { .. }
                | Self::SessionNotOpen
        )
    }

    /// Terminal sensor reason, if any
    pub fn fatal_reason(&self) -> Option<FatalReason> {
        match self {
            Self::Sensor(reason) => Some(*reason),
            _ => None,
        }
    }
}
