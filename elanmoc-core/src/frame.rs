//! Request and response frames
//!
//! # Frame Structure
//!
//! ```text
//! request:  ┌────────┬──────────────┬──────────────────────────────┐
//!           │  0x40  │ opcode (1-2) │ payload, zero-padded to out_len │
//!           └────────┴──────────────┴──────────────────────────────┘
//! response: ┌────────┬──────────────┬─────────────────┐
//!           │  0x40  │    status    │     payload     │
//!           └────────┴──────────────┴─────────────────┘
//! ```

use bytes::{Bytes, BytesMut};
use std::fmt;

use crate::{
    command::Command,
    constants::FRAME_MARKER,
    error::{Error, Result},
    variant::DeviceVariant,
};

/// Outgoing command frame
#[derive(Clone, PartialEq, Eq)]
pub struct Request {
    command: Command,
    buf: BytesMut,
}

impl Request {
    /// Minimum response size (marker + status)
    pub const MIN_RESPONSE_SIZE: usize = 2;

    /// Build a zero-filled frame for a command
    ///
    /// Returns `None` when the command does not exist on `variant`; callers
    /// treat that as a successful no-op.
    ///
    /// # Examples
    ///
    /// ```
    /// use elanmoc_core::{Command, DeviceVariant, Request};
    ///
    /// let request = Request::prepare(Command::GetEnrolledCount, DeviceVariant::Standard).unwrap();
    /// assert_eq!(request.as_bytes(), &[0x40, 0xff, 0x04]);
    /// ```
    pub fn prepare(command: Command, variant: DeviceVariant) -> Option<Self> {
        let descriptor = command.descriptor();
        if !descriptor.applies_to(variant) {
            return None;
        }

        let mut buf = BytesMut::zeroed(descriptor.out_len);
        buf[0] = FRAME_MARKER;
        buf[1..1 + descriptor.opcode.len()].copy_from_slice(descriptor.opcode);

        Some(Self { command, buf })
    }

    /// Set a single payload byte
    ///
    /// Offsets past the end of the frame are ignored.
    pub fn with_byte(mut self, offset: usize, value: u8) -> Self {
        if let Some(byte) = self.buf.get_mut(offset) {
            *byte = value;
        }
        self
    }

    /// Copy bytes into the frame, truncated to the frame length
    pub fn with_slice(mut self, offset: usize, data: &[u8]) -> Self {
        if offset < self.buf.len() {
            let len = data.len().min(self.buf.len() - offset);
            self.buf[offset..offset + len].copy_from_slice(&data[..len]);
        }
        self
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Get total frame size
    pub fn size(&self) -> usize {
        self.buf.len()
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("command", &self.command)
            .field("data", &hex::encode(&self.buf[..self.buf.len().min(8)]))
            .field("len", &self.buf.len())
            .finish()
    }
}

/// Reply frame for one command
///
/// A response is consumed by the state that requested it and dropped when
/// that state returns.
#[derive(Clone, PartialEq, Eq)]
pub struct Response {
    command: Command,
    buf: Bytes,
}

impl Response {
    /// Validate a received frame
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is shorter than marker + status or does
    /// not start with the frame marker.
    pub fn decode(command: Command, buf: BytesMut) -> Result<Self> {
        if let Some(&marker) = buf.first() {
            if marker != FRAME_MARKER {
                return Err(Error::InvalidMarker { command, marker });
            }
        }

        if buf.len() < Request::MIN_RESPONSE_SIZE {
            return Err(Error::FrameTooShort {
                expected: Request::MIN_RESPONSE_SIZE,
                actual: buf.len(),
            });
        }

        Ok(Self {
            command,
            buf: buf.freeze(),
        })
    }

    /// Synthetic reply for a command skipped on the current variant
    ///
    /// Reads as status `0x00` with an all-zero payload.
    pub fn skipped(command: Command) -> Self {
        let len = command.descriptor().in_len.max(Request::MIN_RESPONSE_SIZE);
        let mut buf = BytesMut::zeroed(len);
        buf[0] = FRAME_MARKER;

        Self {
            command,
            buf: buf.freeze(),
        }
    }

    pub fn command(&self) -> Command {
        self.command
    }

    /// Status/result code
    pub fn status(&self) -> u8 {
        self.buf[1]
    }

    /// Byte at `offset`, or zero past the end of the frame
    pub fn byte(&self, offset: usize) -> u8 {
        self.buf.get(offset).copied().unwrap_or(0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("command", &self.command)
            .field("status", &format!("0x{:02x}", self.status()))
            .field("len", &self.buf.len())
            .finish()
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Response[{}](status=0x{:02x}, len={})",
            self.command,
            self.status(),
            self.buf.len()
        )
    }
}
