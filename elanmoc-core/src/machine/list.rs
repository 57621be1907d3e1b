//! List the prints stored on the sensor

use tracing::{debug, info};

use elanmoc_types::Print;

use super::{reply_or_skipped, StateMachine, Step};
use crate::{
    codec,
    command::Command,
    constants::MAX_PRINTS,
    frame::Response,
    session::Context,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ListState {
    GetNumEnrolled,
    CheckNumEnrolled,
    GetFingerInfo,
    CheckFingerInfo,
}

/// Queries every slot and collects the provisioned ones
///
/// Results are only returned after all slots were queried.
#[derive(Debug, Default)]
pub struct ListMachine {
    prints: Vec<Print>,
}

impl ListMachine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateMachine for ListMachine {
    type State = ListState;
    type Output = Vec<Print>;

    fn initial(&self) -> ListState {
        ListState::GetNumEnrolled
    }

    fn run_state(
        &mut self,
        state: ListState,
        ctx: &mut Context,
        reply: Option<Response>,
    ) -> Step<ListState, Vec<Print>> {
        match state {
            ListState::GetNumEnrolled => {
                ctx.reset();
                Step::send_or_skip(
                    ctx.prepare(Command::GetEnrolledCount),
                    ListState::CheckNumEnrolled,
                )
            }

            ListState::CheckNumEnrolled => {
                let reply = reply_or_skipped(reply, Command::GetEnrolledCount);
                ctx.enrolled_num = reply.status();
                info!(enrolled = ctx.enrolled_num, "List: fingers enrolled");

                if ctx.enrolled_num == 0 {
                    return Step::complete(Vec::new());
                }
                Step::goto(ListState::GetFingerInfo)
            }

            ListState::GetFingerInfo => Step::send_or_skip(
                codec::finger_info_request(ctx.variant(), ctx.print_index),
                ListState::CheckFingerInfo,
            ),

            ListState::CheckFingerInfo => {
                let reply = reply_or_skipped(reply, Command::FingerInfo);
                let slot = ctx.print_index;

                if codec::is_present(ctx.variant(), &reply) {
                    self.prints
                        .push(codec::decode_finger_info(ctx.variant(), slot, &reply));
                } else {
                    debug!(slot, "List: slot empty");
                }

                ctx.print_index += 1;
                if ctx.print_index < MAX_PRINTS {
                    return Step::goto(ListState::GetFingerInfo);
                }

                info!(found = self.prints.len(), "List: finished probing slots");
                Step::complete(std::mem::take(&mut self.prints))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::testing::{context, finger_info, reply, run};
    use crate::variant::DeviceVariant;
    use elanmoc_types::Finger;
    use pretty_assertions::assert_eq;

    fn empty_slot(variant: DeviceVariant) -> Response {
        finger_info(variant, &[])
    }

    #[test]
    fn test_empty_sensor_lists_nothing() {
        let mut ctx = context(DeviceVariant::Standard);
        let run = run(
            &mut ListMachine::new(),
            &mut ctx,
            vec![reply(Command::GetEnrolledCount, 0, &[])],
        );

        assert_eq!(*run.result.as_ref().unwrap(), Vec::new());
        assert_eq!(run.sent_commands(), vec![Command::GetEnrolledCount]);
    }

    #[test]
    fn test_queries_all_slots() {
        let variant = DeviceVariant::Elan0c5e;
        let mut ctx = context(variant);

        let mut replies = vec![reply(Command::GetEnrolledCount, 2, &[])];
        for slot in 0..MAX_PRINTS {
            replies.push(match slot {
                3 => finger_info(variant, b"FP1-20240101-1-00000001-alice"),
                7 => finger_info(variant, b"FP1-20240202-6-00000002-nobody"),
                _ => empty_slot(variant),
            });
        }

        let run = run(&mut ListMachine::new(), &mut ctx, replies);
        let prints = run.result.unwrap();

        assert_eq!(prints.len(), 2);
        assert_eq!(prints[0].stored().unwrap().slot, 3);
        assert_eq!(prints[0].finger, Finger::LeftThumb);
        assert_eq!(prints[0].username.as_deref(), Some("alice"));
        assert_eq!(prints[1].stored().unwrap().slot, 7);
        assert_eq!(prints[1].finger, Finger::RightThumb);
        assert_eq!(prints[1].username, None);

        let queried = run
            .sent
            .iter()
            .filter(|request| request.command() == Command::FingerInfo)
            .map(|request| request.as_bytes()[3])
            .collect::<Vec<_>>();
        assert_eq!(queried, (0..MAX_PRINTS).collect::<Vec<_>>());
    }

    #[test]
    fn test_foreign_ids_are_not_listed() {
        let variant = DeviceVariant::Standard;
        let mut ctx = context(variant);

        let mut replies = vec![reply(Command::GetEnrolledCount, 1, &[])];
        replies.push(finger_info(variant, b"WINBIO-user"));
        for _ in 1..MAX_PRINTS {
            replies.push(empty_slot(variant));
        }

        let run = run(&mut ListMachine::new(), &mut ctx, replies);
        assert!(run.result.unwrap().is_empty());
    }
}
