//! Host-side print records

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    finger::Finger,
    user_id,
};

/// Where a sensor-stored print came from
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrintOrigin {
    /// Enrolled by this library; metadata is encoded in the user identifier
    SelfIssued,

    /// Present on the sensor but enrolled by something else
    Foreign,
}

/// Data identifying a template inside the sensor storage
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoredPrint {
    /// Finger slot on the sensor
    pub slot: u8,

    /// User identifier stored next to the template
    pub user_id: Vec<u8>,

    pub origin: PrintOrigin,
}

impl StoredPrint {
    pub fn new(slot: u8, user_id: impl Into<Vec<u8>>) -> Self {
        let user_id = user_id.into();
        let origin = if user_id::has_magic(&user_id) {
            PrintOrigin::SelfIssued
        } else {
            PrintOrigin::Foreign
        };

        Self {
            slot,
            user_id,
            origin,
        }
    }
}

/// Fingerprint as seen by the host
///
/// Enrollment starts from a template carrying only metadata (finger,
/// username, date); once committed, the sensor slot and user identifier are
/// attached as [`StoredPrint`] data. This is the record callers persist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Print {
    pub finger: Finger,

    pub username: Option<String>,

    pub enroll_date: Option<NaiveDate>,

    /// Free-form description
    pub description: Option<String>,

    /// Sensor storage data (absent until enrolled)
    pub stored: Option<StoredPrint>,
}

impl Print {
    /// Create an enrollment template for a finger
    pub fn new(finger: Finger) -> Self {
        Self {
            finger,
            ..Default::default()
        }
    }

    /// Create a print for a template found on the sensor
    ///
    /// Metadata is recovered from the user identifier when it was issued by
    /// this library; foreign identifiers leave the metadata unset.
    pub fn from_sensor(slot: u8, user_id: impl Into<Vec<u8>>) -> Self {
        let mut print = Self {
            stored: Some(StoredPrint::new(slot, user_id)),
            ..Default::default()
        };
        print.fill_from_user_id();
        print
    }

    /// Set username
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set enroll date
    pub fn with_enroll_date(mut self, date: NaiveDate) -> Self {
        self.enroll_date = Some(date);
        self
    }

    /// Set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sensor storage data, or an error when the print was never stored
    pub fn stored(&self) -> Result<&StoredPrint> {
        self.stored.as_ref().ok_or(Error::NotDeviceStored)
    }

    /// Check that the metadata can be encoded into a user identifier
    pub fn validate(&self) -> Result<()> {
        match &self.username {
            Some(username) => user_id::validate_username(username),
            None => Ok(()),
        }
    }

    /// Check whether the sensor template was enrolled by another program
    pub fn is_foreign(&self) -> bool {
        matches!(
            self.stored,
            Some(StoredPrint {
                origin: PrintOrigin::Foreign,
                ..
            })
        )
    }

    /// Generate a user identifier from this print's metadata
    pub fn generate_user_id(&self, random: u32) -> String {
        user_id::generate(
            self.finger,
            self.username.as_deref(),
            self.enroll_date,
            random,
        )
    }

    /// Refresh the metadata from the stored user identifier
    ///
    /// Returns `false` when the identifier is foreign.
    pub fn fill_from_user_id(&mut self) -> bool {
        let Some(info) = self
            .stored
            .as_ref()
            .and_then(|stored| user_id::parse(&stored.user_id))
        else {
            return false;
        };

        self.finger = info.finger;
        self.username = info.username;
        self.enroll_date = info.enroll_date;
        true
    }

    /// Compare the sensor identity of two prints
    ///
    /// Prints are equal when both are sensor-stored with the same slot and
    /// user identifier; host metadata is ignored.
    pub fn equal(&self, other: &Print) -> bool {
        match (&self.stored, &other.stored) {
            (Some(a), Some(b)) => a.slot == b.slot && a.user_id == b.user_id,
            _ => false,
        }
    }
}

impl fmt::Display for Print {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.stored {
            Some(stored) => write!(
                f,
                "Print[{}, slot {}, {:?}]",
                self.finger, stored.slot, stored.origin
            ),
            None => write!(f, "Print[{}, not stored]", self.finger),
        }
    }
}
