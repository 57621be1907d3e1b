//! Operation state machines
//!
//! Every operation is an explicit state enum plus a transition function. The
//! function runs one state: it may inspect the reply requested by the
//! previous state, emit [`Event`]s and returns the next [`Transition`]. No
//! I/O happens here; the async driver in the `elanmoc` crate sends requests
//! and feeds replies back, so each machine can be stepped in tests with
//! canned frames.

mod clear_storage;
mod delete;
mod enroll;
mod identify;
mod list;

pub use clear_storage::{ClearStorageMachine, ClearStorageState};
pub use delete::{DeleteMachine, DeleteState};
pub use enroll::{EnrollMachine, EnrollState};
pub use identify::{IdentifyMachine, IdentifyState, MatchOutcome, MatchTarget};
pub use list::{ListMachine, ListState};

use std::fmt;

use crate::{
    command::Command,
    error::Error,
    event::Event,
    frame::{Request, Response},
    session::Context,
};

/// What the driver does after a state ran
#[derive(Debug)]
pub enum Transition<S, T> {
    /// Run another state right away
    Goto(S),

    /// Send `request`, then run `then` with the reply (if the command has one)
    Transceive { request: Request, then: S },

    /// Operation succeeded
    Complete(T),

    /// Operation failed
    Fail(Error),
}

/// Outcome of running one state
#[derive(Debug)]
pub struct Step<S, T> {
    pub transition: Transition<S, T>,
    pub events: Vec<Event>,
}

impl<S, T> Step<S, T> {
    fn new(transition: Transition<S, T>) -> Self {
        Self {
            transition,
            events: Vec::new(),
        }
    }

    pub fn goto(state: S) -> Self {
        Self::new(Transition::Goto(state))
    }

    pub fn transceive(request: Request, then: S) -> Self {
        Self::new(Transition::Transceive { request, then })
    }

    /// Send `request`, or go straight to `then` when the command is skipped
    pub fn send_or_skip(request: Option<Request>, then: S) -> Self {
        match request {
            Some(request) => Self::transceive(request, then),
            None => Self::goto(then),
        }
    }

    pub fn complete(output: T) -> Self {
        Self::new(Transition::Complete(output))
    }

    pub fn fail(error: impl Into<Error>) -> Self {
        Self::new(Transition::Fail(error.into()))
    }

    /// Attach an event
    pub fn with_event(mut self, event: Event) -> Self {
        self.events.push(event);
        self
    }

    /// Attach an event in front of the ones already present
    pub fn after_event(mut self, event: Event) -> Self {
        self.events.insert(0, event);
        self
    }
}

/// One protocol operation
pub trait StateMachine {
    type State: Copy + Eq + fmt::Debug;
    type Output;

    /// State the operation starts in
    fn initial(&self) -> Self::State;

    /// Run one state
    ///
    /// `reply` is the response to the request issued by the previous state,
    /// `None` when there was no request or its command has no reply. It is
    /// dropped when this call returns.
    fn run_state(
        &mut self,
        state: Self::State,
        ctx: &mut Context,
        reply: Option<Response>,
    ) -> Step<Self::State, Self::Output>;
}

/// Reply for `command`, or a zero-status stand-in when it was skipped
fn reply_or_skipped(reply: Option<Response>, command: Command) -> Response {
    reply.unwrap_or_else(|| Response::skipped(command))
}

#[cfg(test)]
pub(crate) mod testing {
    //! Stepping harness feeding canned replies to a machine

    use bytes::BytesMut;

    use super::*;
    use crate::{config::SessionConfig, variant::DeviceVariant};

    /// Finished run of a machine
    pub struct Run<S, T> {
        pub result: Result<T, Error>,
        pub states: Vec<S>,
        pub sent: Vec<Request>,
        pub events: Vec<Event>,
    }

    impl<S, T> Run<S, T> {
        pub fn sent_commands(&self) -> Vec<Command> {
            self.sent.iter().map(Request::command).collect()
        }
    }

    /// Reply frame with a status byte and optional payload
    pub fn reply(command: Command, status: u8, payload: &[u8]) -> Response {
        let mut buf = BytesMut::from(&[0x40, status][..]);
        buf.extend_from_slice(payload);
        Response::decode(command, buf).unwrap()
    }

    /// Finger-info reply carrying `user_id` at the variant offset
    pub fn finger_info(variant: DeviceVariant, user_id: &[u8]) -> Response {
        let mut buf = BytesMut::zeroed(Command::FingerInfo.descriptor().in_len);
        buf[0] = 0x40;
        let offset = variant.user_id_offset();
        buf[offset..offset + user_id.len()].copy_from_slice(user_id);
        Response::decode(Command::FingerInfo, buf).unwrap()
    }

    pub fn context(variant: DeviceVariant) -> Context {
        Context::new(variant, &SessionConfig::default())
    }

    /// Drive `machine` to completion
    ///
    /// Every request expecting a reply pops the next canned response, which
    /// must answer the same command. Panics when the script runs dry.
    pub fn run<M: StateMachine>(
        machine: &mut M,
        ctx: &mut Context,
        replies: Vec<Response>,
    ) -> Run<M::State, M::Output> {
        let mut replies = replies.into_iter();
        let mut state = machine.initial();
        let mut reply = None;
        let mut run = Run {
            result: Err(Error::InvalidSessionState("not finished".into())),
            states: Vec::new(),
            sent: Vec::new(),
            events: Vec::new(),
        };

        for _ in 0..10_000 {
            run.states.push(state);
            let step = machine.run_state(state, ctx, reply.take());
            run.events.extend(step.events);

            match step.transition {
                Transition::Goto(next) => state = next,
                Transition::Transceive { request, then } => {
                    let command = request.command();
                    run.sent.push(request);
                    if command.descriptor().expects_reply() {
                        let response = replies
                            .next()
                            .unwrap_or_else(|| panic!("no reply scripted for {}", command));
                        assert_eq!(response.command(), command, "reply for wrong command");
                        reply = Some(response);
                    }
                    state = then;
                }
                Transition::Complete(output) => {
                    run.result = Ok(output);
                    break;
                }
                Transition::Fail(error) => {
                    run.result = Err(error);
                    break;
                }
            }
        }

        assert!(replies.next().is_none(), "unused scripted replies");
        run
    }
}
