//! Delete one print from sensor storage

use tracing::{info, warn};

use elanmoc_types::Print;

use super::{reply_or_skipped, StateMachine, Step};
use crate::{
    codec,
    command::Command,
    constants::status,
    frame::Response,
    session::Context,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DeleteState {
    GetNumEnrolled,
    Delete,
    CheckDeleted,
}

#[derive(Debug)]
pub struct DeleteMachine {
    print: Print,
}

impl DeleteMachine {
    pub fn new(print: Print) -> Self {
        Self { print }
    }
}

impl StateMachine for DeleteMachine {
    type State = DeleteState;
    type Output = ();

    fn initial(&self) -> DeleteState {
        DeleteState::GetNumEnrolled
    }

    fn run_state(
        &mut self,
        state: DeleteState,
        ctx: &mut Context,
        reply: Option<Response>,
    ) -> Step<DeleteState, ()> {
        match state {
            DeleteState::GetNumEnrolled => {
                ctx.reset();
                Step::send_or_skip(ctx.prepare(Command::GetEnrolledCount), DeleteState::Delete)
            }

            DeleteState::Delete => {
                let reply = reply_or_skipped(reply, Command::GetEnrolledCount);
                ctx.enrolled_num = reply.status();

                if ctx.enrolled_num == 0 {
                    info!("No fingers enrolled, nothing to delete");
                    return Step::complete(());
                }

                let stored = match self.print.stored() {
                    Ok(stored) => stored,
                    Err(error) => return Step::fail(error),
                };
                info!(slot = stored.slot, "Deleting print");

                Step::send_or_skip(
                    codec::delete_request(ctx.variant(), stored.slot, &stored.user_id),
                    DeleteState::CheckDeleted,
                )
            }

            DeleteState::CheckDeleted => {
                let reply = reply_or_skipped(reply, Command::Delete);
                let code = reply.status();

                if code != status::OK && code != status::NOT_ENROLLED {
                    warn!(code, "Failed to delete finger, status code 0x{:02x}", code);
                }
                Step::complete(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::machine::testing::{context, reply, run};
    use crate::variant::DeviceVariant;
    use elanmoc_types::Finger;
    use pretty_assertions::assert_eq;

    const USER_ID: &[u8] = b"FP1-20240101-7-0000000A-alice";

    #[test]
    fn test_delete_stored_print() {
        let mut ctx = context(DeviceVariant::Standard);
        let run = run(
            &mut DeleteMachine::new(Print::from_sensor(3, USER_ID)),
            &mut ctx,
            vec![
                reply(Command::GetEnrolledCount, 4, &[]),
                reply(Command::Delete, 0, &[]),
            ],
        );

        assert!(run.result.is_ok());
        let frame = run.sent[1].as_bytes();
        assert_eq!(&frame[..4], &[0x40, 0xff, 0x13, 0xf8]);
        assert_eq!(&frame[4..4 + USER_ID.len()], USER_ID);
        assert_eq!(frame.len(), 72);
    }

    #[test]
    fn test_empty_sensor_sends_no_delete() {
        let mut ctx = context(DeviceVariant::Standard);
        let run = run(
            &mut DeleteMachine::new(Print::from_sensor(3, USER_ID)),
            &mut ctx,
            vec![reply(Command::GetEnrolledCount, 0, &[])],
        );

        assert!(run.result.is_ok());
        assert_eq!(run.sent_commands(), vec![Command::GetEnrolledCount]);
    }

    #[test]
    fn test_any_delete_status_completes() {
        for code in [0xfd, 0x22] {
            let mut ctx = context(DeviceVariant::Standard);
            let run = run(
                &mut DeleteMachine::new(Print::from_sensor(0, USER_ID)),
                &mut ctx,
                vec![
                    reply(Command::GetEnrolledCount, 1, &[]),
                    reply(Command::Delete, code, &[]),
                ],
            );
            assert!(run.result.is_ok());
        }
    }

    #[test]
    fn test_foreign_print_is_deletable() {
        let mut ctx = context(DeviceVariant::Standard);
        let raw = vec![0x5a; 62];
        let run = run(
            &mut DeleteMachine::new(Print::from_sensor(9, raw.clone())),
            &mut ctx,
            vec![
                reply(Command::GetEnrolledCount, 1, &[]),
                reply(Command::Delete, 0, &[]),
            ],
        );

        assert!(run.result.is_ok());
        assert_eq!(&run.sent[1].as_bytes()[4..66], &raw[..]);
    }

    #[test]
    fn test_unstored_print_is_rejected() {
        let mut ctx = context(DeviceVariant::Standard);
        let run = run(
            &mut DeleteMachine::new(Print::new(Finger::LeftIndex)),
            &mut ctx,
            vec![reply(Command::GetEnrolledCount, 1, &[])],
        );

        assert!(matches!(
            run.result,
            Err(Error::Print(elanmoc_types::Error::NotDeviceStored))
        ));
    }
}
