//! Wipe all prints from sensor storage

use tracing::info;

use super::{reply_or_skipped, StateMachine, Step};
use crate::{command::Command, error::Error, frame::Response, session::Context};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ClearStorageState {
    WipeSensor,
    GetNumEnrolled,
    CheckNumEnrolled,
}

/// Wipes storage, then confirms the sensor reports no prints
#[derive(Debug, Default)]
pub struct ClearStorageMachine;

impl ClearStorageMachine {
    pub fn new() -> Self {
        Self
    }
}

impl StateMachine for ClearStorageMachine {
    type State = ClearStorageState;
    type Output = ();

    fn initial(&self) -> ClearStorageState {
        ClearStorageState::WipeSensor
    }

    fn run_state(
        &mut self,
        state: ClearStorageState,
        ctx: &mut Context,
        reply: Option<Response>,
    ) -> Step<ClearStorageState, ()> {
        match state {
            ClearStorageState::WipeSensor => {
                ctx.reset();
                info!("Wipe sensor command sent, next operation will take a while");
                Step::send_or_skip(
                    ctx.prepare(Command::WipeSensor),
                    ClearStorageState::GetNumEnrolled,
                )
            }

            ClearStorageState::GetNumEnrolled => Step::send_or_skip(
                ctx.prepare(Command::GetEnrolledCount),
                ClearStorageState::CheckNumEnrolled,
            ),

            ClearStorageState::CheckNumEnrolled => {
                let reply = reply_or_skipped(reply, Command::GetEnrolledCount);
                ctx.enrolled_num = reply.status();

                if ctx.enrolled_num == 0 {
                    info!("Successfully wiped sensor");
                    return Step::complete(());
                }

                info!(left = ctx.enrolled_num, "Sensor erase requested but storage is not empty");
                Step::fail(Error::StorageNotEmpty(ctx.enrolled_num))
            }
        }
    }
}
