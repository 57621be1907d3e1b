//! # elanmoc-core
//!
//! Protocol engine for ELAN match-on-chip fingerprint sensors.
//!
//! This crate provides the transport-independent parts of the driver:
//! - Command catalog and request/response framing
//! - Status classification (ok, retry hints, fatal errors)
//! - Print codec for slots and `FP1-` user identifiers
//! - Session bookkeeping and cancellation
//! - One state machine per operation, stepped by the async driver

pub mod codec;
pub mod command;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod frame;
pub mod machine;
pub mod session;
pub mod status;
pub mod variant;

pub use command::{Command, CommandDescriptor};
pub use config::SessionConfig;
pub use error::{Error, Result};
pub use event::{Event, FingerStatus};
pub use frame::{Request, Response};
pub use machine::{StateMachine, Step, Transition};
pub use session::{Context, Operation, Session, SessionState};
pub use status::{Classification, FatalReason, RetryKind, RetryReason};
pub use variant::{DeviceVariant, Devices, UsbId};
