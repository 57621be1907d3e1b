//! Type definitions for elanmoc
//!
//! Host-side representation of fingerprints stored on the sensor and the
//! `FP1-` user identifier format used to recover their metadata.

pub mod device_info;
pub mod error;
pub mod finger;
pub mod print;
pub mod user_id;

pub use device_info::DeviceInfo;
pub use error::{Error, Result};
pub use finger::Finger;
pub use print::{Print, PrintOrigin, StoredPrint};
