//! Transport errors

use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Device not open")]
    NotOpen,

    #[error("Device already open")]
    AlreadyOpen,

    #[error("No supported sensor found")]
    DeviceNotFound,

    #[error("Unsupported device {vendor_id:04x}:{product_id:04x}")]
    Unsupported { vendor_id: u16, product_id: u16 },

    #[error("Send timeout on endpoint 0x{endpoint:02x}")]
    SendTimeout { endpoint: u8 },

    #[error("Receive timeout on endpoint 0x{endpoint:02x}")]
    ReceiveTimeout { endpoint: u8 },

    #[error("Short write: sent {actual} of {expected} bytes")]
    ShortWrite { expected: usize, actual: usize },

    #[error("Transfer failed: {0}")]
    Transfer(#[from] nusb::transfer::TransferError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Check if the error is a send or receive timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::SendTimeout { .. } | Self::ReceiveTimeout { .. })
    }
}
