//! Transport layer for ELAN match-on-chip sensors
//!
//! Provides bulk USB communication with the sensor.

pub mod error;
pub mod usb;

pub use error::{Error, Result};
pub use usb::UsbTransport;

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;

/// Transport trait for different communication methods
#[async_trait]
pub trait Transport: Send + Sync {
    /// Reset the device and claim its interface
    async fn open(&mut self) -> Result<()>;

    /// Release the interface
    async fn close(&mut self) -> Result<()>;

    /// Check if open
    fn is_open(&self) -> bool;

    /// Write one frame to an OUT endpoint
    async fn transmit(&mut self, endpoint: u8, data: &[u8], timeout: Duration) -> Result<()>;

    /// Read up to `len` bytes from an IN endpoint
    async fn receive(&mut self, endpoint: u8, len: usize, timeout: Duration) -> Result<BytesMut>;

    /// Human-readable device location
    fn describe(&self) -> String;
}
