//! Enrollment
//!
//! Before capturing, the sensor is asked whether the finger is already
//! enrolled; a stale template for the same finger is deleted (or the whole
//! storage wiped if that fails). Eight accepted captures build the template,
//! which is then checked for collisions and committed under a fresh user
//! identifier in the next free slot.

use tracing::{debug, info, warn};

use elanmoc_types::{Print, StoredPrint};

use super::{reply_or_skipped, StateMachine, Step};
use crate::{
    codec,
    command::Command,
    constants::{status, ENROLL_TIMES, MAX_PRINTS},
    error::Error,
    event::{Event, FingerStatus},
    frame::Response,
    session::Context,
    status::{classify, classify_enroll, Classification, FatalReason, RetryReason},
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EnrollState {
    GetNumEnrolled,
    CheckNumEnrolled,
    EarlyReenrollCheck,
    GetEnrolledFingerInfo,
    AttemptDelete,
    CheckDeleted,
    WipeSensor,
    Enroll,
    CheckEnrolled,
    LateReenrollCheck,
    Commit,
    CheckCommitted,
}

#[derive(Debug)]
pub struct EnrollMachine {
    template: Print,
    nonce: u32,
    stage: u8,
    stored: Option<StoredPrint>,
}

impl EnrollMachine {
    /// Enroll `template`, using `nonce` as the random part of its user ID
    pub fn new(template: Print, nonce: u32) -> Self {
        Self {
            template,
            nonce,
            stage: 0,
            stored: None,
        }
    }

    /// Captures accepted so far
    pub fn stage(&self) -> u8 {
        self.stage
    }

    fn progress(&self, retry: Option<RetryReason>) -> Event {
        Event::EnrollProgress {
            stage: self.stage,
            total: ENROLL_TIMES,
            retry,
        }
    }

    /// Proceed to capturing, wiping first where the variant needs it
    fn continue_enroll(ctx: &Context) -> EnrollState {
        if ctx.variant().wipe_before_enroll() {
            EnrollState::WipeSensor
        } else {
            EnrollState::Enroll
        }
    }
}

impl StateMachine for EnrollMachine {
    type State = EnrollState;
    type Output = Print;

    fn initial(&self) -> EnrollState {
        EnrollState::GetNumEnrolled
    }

    fn run_state(
        &mut self,
        state: EnrollState,
        ctx: &mut Context,
        reply: Option<Response>,
    ) -> Step<EnrollState, Print> {
        match state {
            EnrollState::GetNumEnrolled => {
                ctx.reset();
                self.stage = 0;
                self.stored = None;
                Step::send_or_skip(
                    ctx.prepare(Command::GetEnrolledCount),
                    EnrollState::CheckNumEnrolled,
                )
            }

            EnrollState::CheckNumEnrolled => {
                let reply = reply_or_skipped(reply, Command::GetEnrolledCount);
                ctx.enrolled_num = reply.status();

                if ctx.enrolled_num >= MAX_PRINTS {
                    info!(enrolled = ctx.enrolled_num, "Can't enroll, sensor storage is full");
                    return Step::fail(Error::Sensor(FatalReason::StorageFull));
                }

                Step::goto(EnrollState::EarlyReenrollCheck)
            }

            EnrollState::EarlyReenrollCheck => {
                let step = Step::send_or_skip(
                    ctx.prepare(Command::Identify),
                    EnrollState::GetEnrolledFingerInfo,
                );
                debug!("Sent identification request");
                step.with_event(Event::FingerStatus(FingerStatus::Needed))
            }

            EnrollState::GetEnrolledFingerInfo => {
                let reply = reply_or_skipped(reply, Command::Identify);
                let code = reply.status();
                let present = Event::FingerStatus(FingerStatus::Present);

                if code == status::NOT_ENROLLED {
                    info!("Finger not enrolled, proceeding with enroll stage");
                    return Step::goto(Self::continue_enroll(ctx))
                        .with_event(present)
                        .with_event(self.progress(None));
                }

                match classify(code) {
                    Classification::Retry(reason) => match ctx.record_retry(reason) {
                        Ok(()) => {
                            info!(%reason, "Identify failed, retrying");
                            Step::goto(EnrollState::EarlyReenrollCheck)
                                .with_event(present)
                                .with_event(self.progress(Some(reason)))
                        }
                        Err(error) => Step::fail(error).with_event(present),
                    },
                    Classification::Fatal(reason) => {
                        info!(%reason, "Identify failed");
                        Step::fail(Error::Sensor(reason)).with_event(present)
                    }
                    Classification::Ok => {
                        ctx.reset_retries();
                        ctx.print_index = code;
                        info!(slot = code, "Finger already enrolled, fetching finger info");
                        Step::send_or_skip(
                            codec::finger_info_request(ctx.variant(), code),
                            EnrollState::AttemptDelete,
                        )
                        .with_event(present)
                    }
                }
            }

            EnrollState::AttemptDelete => {
                let reply = reply_or_skipped(reply, Command::FingerInfo);
                let user_id = codec::user_id_from_finger_info(ctx.variant(), &reply);
                info!(slot = ctx.print_index, "Deleting enrolled finger");

                Step::send_or_skip(
                    codec::delete_request(ctx.variant(), ctx.print_index, &user_id),
                    EnrollState::CheckDeleted,
                )
                .with_event(Event::FingerStatus(FingerStatus::None))
            }

            EnrollState::CheckDeleted => {
                let reply = reply_or_skipped(reply, Command::Delete);

                if reply.status() != status::OK {
                    warn!(
                        slot = ctx.print_index,
                        code = reply.status(),
                        "Failed to delete finger, wiping sensor"
                    );
                    return Step::goto(EnrollState::WipeSensor);
                }

                info!(slot = ctx.print_index, "Finger deleted, proceeding with enroll stage");
                ctx.enrolled_num = ctx.enrolled_num.saturating_sub(1);
                Step::goto(Self::continue_enroll(ctx)).with_event(self.progress(None))
            }

            EnrollState::WipeSensor => {
                ctx.enrolled_num = 0;
                ctx.print_index = 0;
                info!("Wipe sensor command sent, next operation will take a while");
                Step::send_or_skip(ctx.prepare(Command::WipeSensor), EnrollState::Enroll)
            }

            EnrollState::Enroll => {
                let slot = ctx.variant().enroll_slot_byte(ctx.enrolled_num);
                let request = ctx.prepare(Command::Enroll).map(|request| {
                    request
                        .with_byte(3, slot)
                        .with_byte(4, ENROLL_TIMES)
                        .with_byte(5, self.stage)
                        .with_byte(6, 0)
                });
                debug!(stage = self.stage, total = ENROLL_TIMES, "Enroll command sent");

                Step::send_or_skip(request, EnrollState::CheckEnrolled)
                    .with_event(Event::FingerStatus(FingerStatus::Needed))
            }

            EnrollState::CheckEnrolled => {
                let reply = reply_or_skipped(reply, Command::Enroll);
                let code = reply.status();
                let present = Event::FingerStatus(FingerStatus::Present);

                if code == status::OK || code == status::ENROLL_STAGE_OK {
                    self.stage += 1;
                    ctx.reset_retries();
                    info!(stage = self.stage, code, "Enroll stage succeeded");

                    let next = if self.stage >= ENROLL_TIMES {
                        info!("Enroll captures completed");
                        EnrollState::LateReenrollCheck
                    } else {
                        EnrollState::Enroll
                    };
                    return Step::goto(next)
                        .with_event(present)
                        .with_event(self.progress(None));
                }

                match classify_enroll(code) {
                    Classification::Retry(reason) => match ctx.record_retry(reason) {
                        Ok(()) => {
                            info!(%reason, "Enroll stage failed, retrying");
                            Step::goto(EnrollState::Enroll)
                                .with_event(present)
                                .with_event(self.progress(Some(reason)))
                        }
                        Err(error) => Step::fail(error).with_event(present),
                    },
                    Classification::Fatal(reason) => {
                        info!(%reason, "Enroll stage failed");
                        Step::fail(Error::Sensor(reason)).with_event(present)
                    }
                    Classification::Ok => {
                        debug!(code, "Enroll stage failed for unknown reasons");
                        Step::goto(EnrollState::Enroll).with_event(present)
                    }
                }
            }

            EnrollState::LateReenrollCheck => {
                debug!("Check re-enroll command sent");
                Step::send_or_skip(
                    ctx.prepare(Command::CheckEnrollCollision),
                    EnrollState::Commit,
                )
                .with_event(Event::FingerStatus(FingerStatus::None))
            }

            EnrollState::Commit => {
                let reply = reply_or_skipped(reply, Command::CheckEnrollCollision);

                if reply.status() != status::OK {
                    info!(slot = reply.byte(2), "Finger is already enrolled, cannot commit");
                    return Step::fail(Error::Sensor(FatalReason::Duplicate));
                }

                let slot = ctx.enrolled_num;
                let user_id = codec::encode_user_id(ctx.variant(), &self.template, self.nonce);
                let request = codec::commit_request(ctx.variant(), slot, &user_id);
                self.stored = Some(StoredPrint::new(slot, user_id));
                info!(slot, "Finger is not enrolled, committing");

                Step::send_or_skip(request, EnrollState::CheckCommitted)
            }

            EnrollState::CheckCommitted => {
                let reply = reply_or_skipped(reply, Command::Commit);

                if reply.status() != status::OK {
                    warn!(code = reply.status(), "Commit failed");
                    return Step::fail(Error::CommitFailed(reply.status()));
                }

                let mut print = self.template.clone();
                print.stored = self.stored.take();
                info!(%print, "Commit succeeded");
                Step::complete(print)
            }
        }
    }
}
