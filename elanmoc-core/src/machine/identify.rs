//! Identify and verify
//!
//! Both operations ask the sensor to match the finger against its own
//! storage, then read back the user identifier of the matched slot and look
//! it up among the prints the caller is interested in.

use tracing::{debug, info, warn};

use elanmoc_types::Print;

use super::{reply_or_skipped, StateMachine, Step};
use crate::{
    codec,
    command::Command,
    constants::status,
    error::{Error, Result},
    event::{Event, FingerStatus},
    frame::Response,
    session::Context,
    status::{classify, Classification},
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum IdentifyState {
    GetNumEnrolled,
    CheckNumEnrolled,
    Identify,
    CheckFingerStatus,
    GetFingerInfo,
    CheckFingerInfo,
}

/// Prints a scanned finger is compared against
#[derive(Debug, Clone)]
pub enum MatchTarget {
    /// Identify: any print of the gallery
    Gallery(Vec<Print>),

    /// Verify: exactly this print
    Single(Print),
}

impl MatchTarget {
    /// Requested print matching `scanned`, with its index
    fn find(&self, scanned: &Print) -> Option<(usize, &Print)> {
        match self {
            Self::Gallery(gallery) => gallery
                .iter()
                .enumerate()
                .find(|(_, print)| print.equal(scanned)),
            Self::Single(print) => print.equal(scanned).then_some((0, print)),
        }
    }
}

/// Result of an identify or verify run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The sensor has no enrolled prints
    NoMatch,

    /// `print` (at `index` in the target) was scanned
    Matched { index: usize, print: Print },
}

impl MatchOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }
}

/// Shared identify/verify machine
#[derive(Debug)]
pub struct IdentifyMachine {
    target: MatchTarget,
}

impl IdentifyMachine {
    /// Match against a gallery
    pub fn identify(gallery: Vec<Print>) -> Self {
        Self {
            target: MatchTarget::Gallery(gallery),
        }
    }

    /// Match against one print
    ///
    /// # Errors
    ///
    /// Fails when `print` carries no sensor data, since it could never match.
    pub fn verify(print: Print) -> Result<Self> {
        print.stored()?;
        Ok(Self {
            target: MatchTarget::Single(print),
        })
    }

    pub fn target(&self) -> &MatchTarget {
        &self.target
    }
}

impl StateMachine for IdentifyMachine {
    type State = IdentifyState;
    type Output = MatchOutcome;

    fn initial(&self) -> IdentifyState {
        IdentifyState::GetNumEnrolled
    }

    fn run_state(
        &mut self,
        state: IdentifyState,
        ctx: &mut Context,
        reply: Option<Response>,
    ) -> Step<IdentifyState, MatchOutcome> {
        match state {
            IdentifyState::GetNumEnrolled => {
                ctx.reset();
                Step::send_or_skip(
                    ctx.prepare(Command::GetEnrolledCount),
                    IdentifyState::CheckNumEnrolled,
                )
            }

            IdentifyState::CheckNumEnrolled => {
                let reply = reply_or_skipped(reply, Command::GetEnrolledCount);
                let code = reply.status();

                if code == status::NOT_ENROLLED {
                    info!("No fingers enrolled, no need to identify finger");
                    return Step::complete(MatchOutcome::NoMatch);
                }

                ctx.enrolled_num = code;
                debug!(enrolled = code, "Identify: fingers enrolled");
                Step::goto(IdentifyState::Identify)
            }

            IdentifyState::Identify => {
                let step = Step::send_or_skip(
                    ctx.prepare(Command::Identify),
                    IdentifyState::CheckFingerStatus,
                );
                debug!("Sent identification request");
                step.with_event(Event::FingerStatus(FingerStatus::Needed))
            }

            IdentifyState::CheckFingerStatus => {
                let reply = reply_or_skipped(reply, Command::Identify);
                let step = match classify(reply.status()) {
                    Classification::Ok => {
                        ctx.reset_retries();
                        ctx.print_index = reply.status();
                        info!(slot = ctx.print_index, "Identified finger");
                        Step::goto(IdentifyState::GetFingerInfo)
                    }
                    Classification::Retry(reason) => match ctx.record_retry(reason) {
                        Ok(()) => {
                            info!(%reason, "Identify retry");
                            Step::goto(IdentifyState::Identify).with_event(Event::Retry(reason))
                        }
                        Err(error) => Step::fail(error),
                    },
                    Classification::Fatal(reason) => {
                        info!(%reason, "Identify failed");
                        Step::fail(Error::Sensor(reason))
                    }
                };
                step.after_event(Event::FingerStatus(FingerStatus::Present))
            }

            IdentifyState::GetFingerInfo => Step::send_or_skip(
                codec::finger_info_request(ctx.variant(), ctx.print_index),
                IdentifyState::CheckFingerInfo,
            ),

            IdentifyState::CheckFingerInfo => {
                let reply = reply_or_skipped(reply, Command::FingerInfo);
                let scanned = codec::decode_finger_info(ctx.variant(), ctx.print_index, &reply);

                let step = match self.target.find(&scanned) {
                    Some((index, print)) => {
                        info!(index, %print, "Scanned finger matches");
                        Step::complete(MatchOutcome::Matched {
                            index,
                            print: print.clone(),
                        })
                    }
                    None => {
                        warn!(%scanned, "Scanned finger is not among the requested prints");
                        Step::goto(IdentifyState::Identify).with_event(Event::NoMatch)
                    }
                };
                step.after_event(Event::FingerStatus(FingerStatus::None))
            }
        }
    }
}
