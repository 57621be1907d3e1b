//! Sensor variants
//!
//! The ELAN match-on-chip family shares one command set, but individual
//! models lay out finger-info frames differently and some need extra steps
//! before they accept enrollments. The variant is picked from the USB ID
//! table when the device is opened.

use std::fmt;

use bitflags::bitflags;

use crate::command::Command;

/// ELAN USB vendor ID
pub const ELAN_VENDOR_ID: u16 = 0x04f3;

bitflags! {
    /// Set of variants a command applies to
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct Devices: u16 {
        const STANDARD = 1 << 0;
        const ELAN_0C5E = 1 << 1;
        const ELAN_0C8E = 1 << 2;
    }
}

/// Sensor sub-model
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DeviceVariant {
    /// `04f3:0c00`, `04f3:0c4c`
    Standard,

    /// `04f3:0c5e`: user ID starts one byte later in finger-info frames
    Elan0c5e,

    /// `04f3:0c8e`: storage must be wiped before enroll captures are accepted
    Elan0c8e,
}

/// Entry of the supported-device table
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UsbId {
    pub vendor_id: u16,
    pub product_id: u16,
    pub variant: DeviceVariant,
}

/// Supported devices
pub const ID_TABLE: &[UsbId] = &[
    UsbId { vendor_id: ELAN_VENDOR_ID, product_id: 0x0c00, variant: DeviceVariant::Standard },
    UsbId { vendor_id: ELAN_VENDOR_ID, product_id: 0x0c4c, variant: DeviceVariant::Standard },
    UsbId { vendor_id: ELAN_VENDOR_ID, product_id: 0x0c5e, variant: DeviceVariant::Elan0c5e },
    UsbId { vendor_id: ELAN_VENDOR_ID, product_id: 0x0c8e, variant: DeviceVariant::Elan0c8e },
];

impl DeviceVariant {
    /// Look up the variant for a USB vendor/product pair
    pub fn from_usb_id(vendor_id: u16, product_id: u16) -> Option<Self> {
        ID_TABLE
            .iter()
            .find(|id| id.vendor_id == vendor_id && id.product_id == product_id)
            .map(|id| id.variant)
    }

    /// Applicability flag of this variant
    pub fn flag(self) -> Devices {
        match self {
            Self::Standard => Devices::STANDARD,
            Self::Elan0c5e => Devices::ELAN_0C5E,
            Self::Elan0c8e => Devices::ELAN_0C8E,
        }
    }

    /// Offset of the user ID inside a finger-info response
    pub fn user_id_offset(self) -> usize {
        match self {
            Self::Elan0c5e => 3,
            Self::Standard | Self::Elan0c8e => 2,
        }
    }

    /// Longest user ID the sensor returns
    pub fn max_user_id_len(self) -> usize {
        Command::FingerInfo.descriptor().in_len - self.user_id_offset()
    }

    /// Whether enroll captures are rejected until storage is wiped
    pub fn wipe_before_enroll(self) -> bool {
        matches!(self, Self::Elan0c8e)
    }

    /// Slot byte sent with each enroll capture
    pub fn enroll_slot_byte(self, enrolled_num: u8) -> u8 {
        match self {
            Self::Elan0c8e => 0x02,
            Self::Standard | Self::Elan0c5e => enrolled_num,
        }
    }

    /// Model name
    pub fn name(self) -> &'static str {
        match self {
            Self::Standard => "ELAN MoC",
            Self::Elan0c5e => "ELAN MoC 0c5e",
            Self::Elan0c8e => "ELAN MoC 0c8e",
        }
    }
}

impl fmt::Display for DeviceVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_table_lookup() {
        assert_eq!(
            DeviceVariant::from_usb_id(0x04f3, 0x0c4c),
            Some(DeviceVariant::Standard)
        );
        assert_eq!(
            DeviceVariant::from_usb_id(0x04f3, 0x0c5e),
            Some(DeviceVariant::Elan0c5e)
        );
        assert_eq!(DeviceVariant::from_usb_id(0x04f3, 0x1234), None);
        assert_eq!(DeviceVariant::from_usb_id(0x1234, 0x0c4c), None);
    }

    #[test]
    fn test_user_id_geometry() {
        assert_eq!(DeviceVariant::Standard.user_id_offset(), 2);
        assert_eq!(DeviceVariant::Standard.max_user_id_len(), 62);
        assert_eq!(DeviceVariant::Elan0c5e.user_id_offset(), 3);
        assert_eq!(DeviceVariant::Elan0c5e.max_user_id_len(), 61);
    }

    #[test]
    fn test_quirks() {
        assert!(DeviceVariant::Elan0c8e.wipe_before_enroll());
        assert!(!DeviceVariant::Standard.wipe_before_enroll());
        assert_eq!(DeviceVariant::Elan0c8e.enroll_slot_byte(7), 0x02);
        assert_eq!(DeviceVariant::Standard.enroll_slot_byte(7), 7);
    }
}
