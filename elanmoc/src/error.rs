//! High-level error types

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] elanmoc_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] elanmoc_transport::Error),

    #[error("Type error: {0}")]
    Types(#[from] elanmoc_types::Error),

    #[error("Device not open")]
    NotOpen,

    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// Check if the operation may succeed when started again
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Core(elanmoc_core::Error::RetryLimitExceeded { .. }) => true,
            Self::Transport(err) => err.is_timeout(),
            _ => false,
        }
    }

    /// Check if the device must be reopened before further use
    pub fn requires_reopen(&self) -> bool {
        match self {
            Self::NotOpen => true,
            Self::Core(err) => err.requires_reopen(),
            Self::Transport(err) => !err.is_timeout(),
            _ => false,
        }
    }

    /// Check if the sensor itself rejected the operation
    pub fn is_sensor_error(&self) -> bool {
        matches!(self, Self::Core(err) if err.is_sensor_error())
    }

    /// Terminal sensor reason, if any
    pub fn fatal_reason(&self) -> Option<elanmoc_core::FatalReason> {
        match self {
            Self::Core(err) => err.fatal_reason(),
            _ => None,
        }
    }
}
