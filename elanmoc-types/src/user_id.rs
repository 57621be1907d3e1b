//! `FP1-` user identifiers
//!
//! Prints enrolled by this library are tagged on the sensor with a textual user
//! identifier that carries enough metadata to rebuild the host-side print:
//!
//! ```text
//! FP1-20240131-7-1A2B3C4D-alice
//! │   │        │ │        └─ username ("nobody" when unset)
//! │   │        │ └────────── random component (8 hex digits)
//! │   │        └──────────── finger (1 hex digit)
//! │   └───────────────────── enroll date (YYYYMMDD, zeros when unset)
//! └───────────────────────── magic prefix
//! ```

use chrono::{Datelike, NaiveDate};

use crate::{
    error::{Error, Result},
    finger::Finger,
};

/// Magic prefix marking a self-issued user identifier
pub const MAGIC: &[u8; 4] = b"FP1-";

/// Username written when the print has none
pub const NO_USERNAME: &str = "nobody";

/// Length of the fixed part, up to and including the dash before the username
pub const HEADER_LEN: usize = 24;

/// Metadata recovered from a user identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdInfo {
    pub enroll_date: Option<NaiveDate>,
    pub finger: Finger,
    pub username: Option<String>,
}

/// Check whether raw identifier bytes start with the magic prefix
pub fn has_magic(user_id: &[u8]) -> bool {
    user_id.starts_with(MAGIC)
}

/// Check that a username survives a round trip through the sensor
///
/// Finger-info frames pad the identifier with NUL bytes, so an embedded NUL
/// would cut the name short when it is read back.
pub fn validate_username(username: &str) -> Result<()> {
    if username.contains('\0') {
        return Err(Error::Validation(format!(
            "username {:?} contains a NUL byte",
            username
        )));
    }
    Ok(())
}

/// Build a user identifier for a print
pub fn generate(
    finger: Finger,
    username: Option<&str>,
    enroll_date: Option<NaiveDate>,
    random: u32,
) -> String {
    let (year, month, day) = enroll_date
        .map(|date| (date.year(), date.month(), date.day()))
        .unwrap_or((0, 0, 0));

    format!(
        "FP1-{:04}{:02}{:02}-{:X}-{:08X}-{}",
        year,
        month,
        day,
        u8::from(finger),
        random,
        username.unwrap_or(NO_USERNAME),
    )
}

/// Parse the metadata out of a user identifier
///
/// Returns `None` when the identifier was not generated by [`generate`].
pub fn parse(user_id: &[u8]) -> Option<UserIdInfo> {
    if !has_magic(user_id)
        || user_id.len() < HEADER_LEN
        || user_id[12] != b'-'
        || user_id[14] != b'-'
        || user_id[23] != b'-'
    {
        return None;
    }

    let date_ymd: u32 = std::str::from_utf8(&user_id[4..12])
        .ok()
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(0);
    let enroll_date = if date_ymd > 0 {
        NaiveDate::from_ymd_opt((date_ymd / 10000) as i32, (date_ymd / 100) % 100, date_ymd % 100)
    } else {
        None
    };

    let finger = std::str::from_utf8(&user_id[13..14])
        .ok()
        .and_then(|digit| u8::from_str_radix(digit, 16).ok())
        .and_then(|value| Finger::try_from(value).ok())
        .unwrap_or_default();

    let username = String::from_utf8_lossy(&user_id[HEADER_LEN..]).into_owned();
    let username = if username.is_empty() || username == NO_USERNAME {
        None
    } else {
        Some(username)
    };

    Some(UserIdInfo {
        enroll_date,
        finger,
        username,
    })
}
