//! Sensor status classification
//!
//! Regular status codes never have the most-significant nibble set; errors
//! do. Known error codes map to a retry hint (the user should adjust the
//! finger and the capture is repeated) or to a terminal failure. Codes not
//! listed here are terminal.

use std::fmt;

use crate::constants::status;

/// How the user should react to a retry
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RetryKind {
    CenterFinger,
    RemoveFinger,
    TooShort,
}

/// Recoverable capture conditions
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RetryReason {
    MoveDown,
    MoveRight,
    MoveUp,
    MoveLeft,
    SensorDirty,
    NotEnoughSurface,
    NoFinger,
    TooShort,
}

impl RetryReason {
    pub fn kind(self) -> RetryKind {
        match self {
            Self::MoveDown | Self::MoveRight | Self::MoveUp | Self::MoveLeft | Self::NoFinger => {
                RetryKind::CenterFinger
            }
            Self::SensorDirty | Self::NotEnoughSurface => RetryKind::RemoveFinger,
            Self::TooShort => RetryKind::TooShort,
        }
    }

    /// User-facing hint
    pub fn hint(self) -> &'static str {
        match self {
            Self::MoveDown => "Move your finger slightly downwards",
            Self::MoveRight => "Move your finger slightly to the right",
            Self::MoveUp => "Move your finger slightly upwards",
            Self::MoveLeft => "Move your finger slightly to the left",
            Self::SensorDirty => "Sensor is dirty or wet",
            Self::NotEnoughSurface => "Press your finger slightly harder on the sensor",
            Self::NoFinger => "Please place your finger on the sensor",
            Self::TooShort => "Capture was too short, try again",
        }
    }

    /// Check whether this is a finger position hint
    pub fn is_reposition(self) -> bool {
        matches!(
            self,
            Self::MoveDown | Self::MoveRight | Self::MoveUp | Self::MoveLeft
        )
    }
}

impl fmt::Display for RetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hint())
    }
}

/// Terminal sensor conditions
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FatalReason {
    /// Finger not recognized
    NotEnrolled,

    /// Sensor storage is full
    StorageFull,

    /// Finger already enrolled
    Duplicate,

    /// Code outside the known set
    Unknown(u8),
}

impl fmt::Display for FatalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotEnrolled => f.write_str("no match found"),
            Self::StorageFull => f.write_str("capacity exceeded"),
            Self::Duplicate => f.write_str("already enrolled"),
            Self::Unknown(code) => write!(f, "unknown error (0x{:02x})", code),
        }
    }
}

/// Result of classifying a status byte
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Classification {
    Ok,
    Retry(RetryReason),
    Fatal(FatalReason),
}

/// Classify a status byte
///
/// # Examples
///
/// ```
/// use elanmoc_core::status::{classify, Classification, RetryReason};
///
/// assert_eq!(classify(0x05), Classification::Ok);
/// assert_eq!(classify(0x42), Classification::Retry(RetryReason::MoveRight));
/// ```
pub fn classify(code: u8) -> Classification {
    if code & 0xf0 == 0 {
        return Classification::Ok;
    }

    match code {
        status::MOVE_DOWN => Classification::Retry(RetryReason::MoveDown),
        status::MOVE_RIGHT => Classification::Retry(RetryReason::MoveRight),
        status::MOVE_UP => Classification::Retry(RetryReason::MoveUp),
        status::MOVE_LEFT => Classification::Retry(RetryReason::MoveLeft),
        status::SENSOR_DIRTY => Classification::Retry(RetryReason::SensorDirty),
        status::NOT_ENOUGH_SURFACE => Classification::Retry(RetryReason::NotEnoughSurface),
        status::NO_FINGER => Classification::Retry(RetryReason::NoFinger),
        status::NOT_ENROLLED => Classification::Fatal(FatalReason::NotEnrolled),
        status::MAX_ENROLLED_REACHED => Classification::Fatal(FatalReason::StorageFull),
        other => Classification::Fatal(FatalReason::Unknown(other)),
    }
}

/// Classify a status byte received during an enroll capture
///
/// A "not enrolled" reply can legitimately arrive before the sensor has
/// built a full template, so it is retried as a short capture.
pub fn classify_enroll(code: u8) -> Classification {
    match classify(code) {
        Classification::Fatal(FatalReason::NotEnrolled) => {
            Classification::Retry(RetryReason::TooShort)
        }
        other => other,
    }
}
