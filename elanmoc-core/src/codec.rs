//! Print codec
//!
//! Maps between host [`Print`] records and the slot/user-ID fields carried by
//! commit, delete and finger-info frames.
//!
//! Whether a slot is in use is judged from the `FP1-` prefix of its user ID.
//! Wiping the sensor does not necessarily clear stored user IDs, so a wiped
//! slot can still read as present.

use tracing::debug;

use elanmoc_types::{Print, user_id};

use crate::{
    command::Command,
    frame::{Request, Response},
    variant::DeviceVariant,
};

/// Offset of the slot byte in commit and delete requests
const SLOT_OFFSET: usize = 3;

/// Offset of the user ID in commit and delete requests
const USER_ID_OFFSET: usize = 4;

/// Encode a slot index for commit and delete requests
pub fn slot_byte(slot: u8) -> u8 {
    0xf0 | slot.wrapping_add(5)
}

/// Raw user-ID field of a finger-info response
pub fn user_id_field(variant: DeviceVariant, frame: &Response) -> Vec<u8> {
    let offset = variant.user_id_offset();
    (offset..offset + variant.max_user_id_len())
        .map(|index| frame.byte(index))
        .collect()
}

/// Check whether a finger-info response describes a slot we provisioned
pub fn is_present(variant: DeviceVariant, frame: &Response) -> bool {
    let offset = variant.user_id_offset();
    (0..user_id::MAGIC.len()).all(|i| frame.byte(offset + i) == user_id::MAGIC[i])
}

/// User ID stored in a finger-info response
///
/// Self-issued IDs end at the first NUL byte; foreign IDs are kept whole.
pub fn user_id_from_finger_info(variant: DeviceVariant, frame: &Response) -> Vec<u8> {
    let mut field = user_id_field(variant, frame);
    if user_id::has_magic(&field) {
        let len = field.iter().position(|&b| b == 0).unwrap_or(field.len());
        field.truncate(len);
    }
    field
}

/// Rebuild a print from a finger-info response
pub fn decode_finger_info(variant: DeviceVariant, slot: u8, frame: &Response) -> Print {
    let user_id = user_id_from_finger_info(variant, frame);
    let print = Print::from_sensor(slot, user_id);

    if print.is_foreign() {
        debug!(slot, "Finger info not generated by this driver (raw data)");
    } else {
        debug!(slot, finger = %print.finger, "Finger info with driver user ID");
    }

    print
}

/// Generate the user ID to commit for an enrollment template
///
/// The ID is truncated to what the variant can return in finger-info frames.
pub fn encode_user_id(variant: DeviceVariant, template: &Print, random: u32) -> Vec<u8> {
    let mut user_id = template.generate_user_id(random).into_bytes();
    user_id.truncate(variant.max_user_id_len());
    user_id
}

/// Request finger info for a slot
pub fn finger_info_request(variant: DeviceVariant, slot: u8) -> Option<Request> {
    Request::prepare(Command::FingerInfo, variant).map(|request| request.with_byte(3, slot))
}

/// Request storing the template just captured under `slot`
pub fn commit_request(variant: DeviceVariant, slot: u8, user_id: &[u8]) -> Option<Request> {
    keyed_request(Command::Commit, variant, slot, user_id)
}

/// Request deleting the template in `slot`
pub fn delete_request(variant: DeviceVariant, slot: u8, user_id: &[u8]) -> Option<Request> {
    keyed_request(Command::Delete, variant, slot, user_id)
}

fn keyed_request(
    command: Command,
    variant: DeviceVariant,
    slot: u8,
    user_id: &[u8],
) -> Option<Request> {
    Request::prepare(command, variant).map(|request| {
        request
            .with_byte(SLOT_OFFSET, slot_byte(slot))
            .with_slice(USER_ID_OFFSET, user_id)
    })
}
