//! Interim feedback emitted while an operation runs

use crate::status::RetryReason;

/// Finger presence as last reported to the user
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FingerStatus {
    /// Waiting for the user to touch the sensor
    Needed,

    /// Capture in progress
    Present,

    /// No capture pending
    None,
}

/// Progress notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    FingerStatus(FingerStatus),

    /// Enroll stage report; `retry` is set when the last capture was rejected
    EnrollProgress {
        stage: u8,
        total: u8,
        retry: Option<RetryReason>,
    },

    /// Identify/verify capture rejected, the sensor is asked again
    Retry(RetryReason),

    /// Scanned finger is on the sensor but not among the requested prints
    NoMatch,
}
