//! Errors for host-side print data

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Print metadata cannot be encoded into a user identifier
    #[error("Invalid print metadata: {0}")]
    Validation(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Print is not stored on a sensor")]
    NotDeviceStored,
}
