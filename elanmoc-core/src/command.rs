//! ELAN match-on-chip command catalog

use std::fmt;

use crate::{
    constants::endpoints,
    variant::{DeviceVariant, Devices},
};

/// Protocol commands
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    GetFirmwareVersion,
    FingerInfo,
    GetEnrolledCount,
    Abort,
    Identify,
    Enroll,
    Commit,
    CheckEnrollCollision,
    Delete,
    WipeSensor,
}

/// Static description of a command
///
/// The request frame is `out_len` bytes long; a reply of up to `in_len` bytes
/// is read from `ep_in` unless `in_len` is zero.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    pub command: Command,

    /// Opcode bytes following the frame marker (one or two bytes)
    pub opcode: &'static [u8],

    /// Variants accepting this command
    pub devices: Devices,

    /// Request frame length
    pub out_len: usize,

    /// Reply frame length (0 when the sensor does not answer)
    pub in_len: usize,

    /// Endpoint the reply arrives on
    pub ep_in: u8,

    /// Whether a pending reply may be interrupted by cancellation
    pub cancellable: bool,
}

impl CommandDescriptor {
    /// Check whether the command exists on a variant
    pub fn applies_to(&self, variant: DeviceVariant) -> bool {
        self.devices.contains(variant.flag())
    }

    /// Check whether the sensor answers this command
    pub fn expects_reply(&self) -> bool {
        self.in_len > 0
    }
}

const GET_FIRMWARE_VERSION: CommandDescriptor = CommandDescriptor {
    command: Command::GetFirmwareVersion,
    opcode: &[0x19],
    devices: Devices::all(),
    out_len: 2,
    in_len: 2,
    ep_in: endpoints::CMD_IN,
    cancellable: false,
};

const FINGER_INFO: CommandDescriptor = CommandDescriptor {
    command: Command::FingerInfo,
    opcode: &[0xff, 0x12],
    devices: Devices::all(),
    out_len: 4,
    in_len: 64,
    ep_in: endpoints::CMD_IN,
    cancellable: false,
};

const GET_ENROLLED_COUNT: CommandDescriptor = CommandDescriptor {
    command: Command::GetEnrolledCount,
    opcode: &[0xff, 0x04],
    devices: Devices::all(),
    out_len: 3,
    in_len: 2,
    ep_in: endpoints::CMD_IN,
    cancellable: false,
};

const ABORT: CommandDescriptor = CommandDescriptor {
    command: Command::Abort,
    opcode: &[0xff, 0x02],
    devices: Devices::all(),
    out_len: 3,
    in_len: 0,
    ep_in: endpoints::CMD_IN,
    cancellable: false,
};

const IDENTIFY: CommandDescriptor = CommandDescriptor {
    command: Command::Identify,
    opcode: &[0xff, 0x03],
    devices: Devices::all(),
    out_len: 3,
    in_len: 2,
    ep_in: endpoints::MOC_CMD_IN,
    cancellable: true,
};

const ENROLL: CommandDescriptor = CommandDescriptor {
    command: Command::Enroll,
    opcode: &[0xff, 0x01],
    devices: Devices::all(),
    out_len: 7,
    in_len: 2,
    ep_in: endpoints::MOC_CMD_IN,
    cancellable: true,
};

const COMMIT: CommandDescriptor = CommandDescriptor {
    command: Command::Commit,
    opcode: &[0xff, 0x11],
    devices: Devices::all(),
    out_len: 72,
    in_len: 2,
    ep_in: endpoints::CMD_IN,
    cancellable: false,
};

const CHECK_ENROLL_COLLISION: CommandDescriptor = CommandDescriptor {
    command: Command::CheckEnrollCollision,
    opcode: &[0xff, 0x10],
    devices: Devices::all(),
    out_len: 3,
    in_len: 3,
    ep_in: endpoints::CMD_IN,
    cancellable: false,
};

const DELETE: CommandDescriptor = CommandDescriptor {
    command: Command::Delete,
    opcode: &[0xff, 0x13],
    devices: Devices::all(),
    out_len: 72,
    in_len: 2,
    ep_in: endpoints::CMD_IN,
    cancellable: false,
};

const WIPE_SENSOR: CommandDescriptor = CommandDescriptor {
    command: Command::WipeSensor,
    opcode: &[0xff, 0x99],
    devices: Devices::all(),
    out_len: 3,
    in_len: 0,
    ep_in: endpoints::CMD_IN,
    cancellable: false,
};

/// Every command known to the driver
pub const CATALOG: &[CommandDescriptor] = &[
    GET_FIRMWARE_VERSION,
    FINGER_INFO,
    GET_ENROLLED_COUNT,
    ABORT,
    IDENTIFY,
    ENROLL,
    COMMIT,
    CHECK_ENROLL_COLLISION,
    DELETE,
    WIPE_SENSOR,
];

impl Command {
    /// Get the static descriptor of this command
    pub fn descriptor(self) -> &'static CommandDescriptor {
        match self {
            Self::GetFirmwareVersion => &GET_FIRMWARE_VERSION,
            Self::FingerInfo => &FINGER_INFO,
            Self::GetEnrolledCount => &GET_ENROLLED_COUNT,
            Self::Abort => &ABORT,
            Self::Identify => &IDENTIFY,
            Self::Enroll => &ENROLL,
            Self::Commit => &COMMIT,
            Self::CheckEnrollCollision => &CHECK_ENROLL_COLLISION,
            Self::Delete => &DELETE,
            Self::WipeSensor => &WIPE_SENSOR,
        }
    }

    /// Get command name
    pub fn name(self) -> &'static str {
        match self {
            Self::GetFirmwareVersion => "CMD_GET_FW_VER",
            Self::FingerInfo => "CMD_FINGER_INFO",
            Self::GetEnrolledCount => "CMD_GET_ENROLLED_COUNT",
            Self::Abort => "CMD_ABORT",
            Self::Identify => "CMD_IDENTIFY",
            Self::Enroll => "CMD_ENROLL",
            Self::Commit => "CMD_COMMIT",
            Self::CheckEnrollCollision => "CMD_CHECK_ENROLL_COLLISION",
            Self::Delete => "CMD_DELETE",
            Self::WipeSensor => "CMD_WIPE_SENSOR",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), hex::encode(self.descriptor().opcode))
    }
}
