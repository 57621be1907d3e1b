//! Device information structures

use std::fmt;

/// Device information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// USB vendor ID
    pub vendor_id: u16,

    /// USB product ID
    pub product_id: u16,

    /// Sensor model name
    pub model: String,

    /// Number of captures needed to enroll a finger
    pub enroll_stages: u8,

    /// Number of templates the sensor can store
    pub max_prints: u8,
}

impl DeviceInfo {
    pub fn new(vendor_id: u16, product_id: u16, model: impl Into<String>) -> Self {
        Self {
            vendor_id,
            product_id,
            model: model.into(),
            enroll_stages: 0,
            max_prints: 0,
        }
    }

    /// Set storage geometry
    pub fn with_capacity(mut self, enroll_stages: u8, max_prints: u8) -> Self {
        self.enroll_stages = enroll_stages;
        self.max_prints = max_prints;
        self
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Device[{:04x}:{:04x} {}, {} slots]",
            self.vendor_id, self.product_id, self.model, self.max_prints
        )
    }
}
