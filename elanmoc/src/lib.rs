//! # elanmoc
//!
//! Rust driver for ELAN match-on-chip USB fingerprint sensors.
//!
//! ## Features
//!
//! - Enroll, identify, verify, list, delete and clear-storage operations
//! - Async/await API using Tokio
//! - Cancellation from another task
//! - Interim progress events (finger status, enroll stages, retry hints)
//!
//! ## Quick Start
//!
//! ```no_run
//! use elanmoc::Device;
//!
//! #[tokio::main]
//! async fn main() -> elanmoc::Result<()> {
//!     let mut device = Device::discover()?;
//!     device.open().await?;
//!
//!     for print in device.list().await? {
//!         println!("{}", print);
//!     }
//!
//!     device.close().await?;
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod error;

// Re-exports
pub use device::Device;
pub use error::{Error, Result};

// Re-export types
pub use elanmoc_core::machine::MatchOutcome;
pub use elanmoc_core::{
    DeviceVariant, Event, FatalReason, FingerStatus, Operation, RetryReason, Session,
    SessionConfig,
};
pub use elanmoc_transport::{Transport, UsbTransport};
pub use elanmoc_types::{DeviceInfo, Finger, Print, PrintOrigin, StoredPrint};
