//! Pull-and-dispatch loop of one worker.
//!
//! The loop is an explicit state machine:
//!
//! ```text
//! Idle -> PullPending -> Dispatching(id) -> PullPending -> ... -> Drained
//! ```
//!
//! Every step performs at most one host pull or one callback, so the
//! loop can be stepped from tests and inspected in between.

use crate::error::DispatchError;
use crate::worker::{TaskScope, WorkerContext};
use core_types::TaskId;
use host_api::HostApi;
use serde::{Deserialize, Serialize};
use services_logger::{LogEntry, LogLevel};

/// Where a dispatch loop currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchState {
    /// Created, setup timers not yet settled
    Idle,
    /// Next step asks the host for an id
    PullPending,
    /// Next step runs the callback of this id
    Dispatching(TaskId),
    /// The host reported an empty queue
    Drained,
}

/// Outcome of one drain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainReport {
    /// Tasks whose callback returned successfully, in execution order
    pub executed: Vec<TaskId>,
    /// Tasks whose callback failed, with the error message
    pub failed: Vec<(TaskId, String)>,
    /// Pulled ids with no registered callback
    pub skipped: Vec<TaskId>,
}

impl DrainReport {
    /// Number of callbacks that ran, successful or not
    pub fn ran(&self) -> usize {
        self.executed.len() + self.failed.len()
    }

    /// Returns true when nothing was pulled
    pub fn is_empty(&self) -> bool {
        self.ran() == 0 && self.skipped.is_empty()
    }
}

/// Drives one worker's registry against the host queue
#[derive(Debug)]
pub struct DispatchLoop {
    state: DispatchState,
    report: DrainReport,
}

impl Default for DispatchLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchLoop {
    pub fn new() -> Self {
        Self {
            state: DispatchState::Idle,
            report: DrainReport::default(),
        }
    }

    pub fn state(&self) -> &DispatchState {
        &self.state
    }

    /// Report accumulated so far
    pub fn report(&self) -> &DrainReport {
        &self.report
    }

    /// Advances the loop by one transition
    ///
    /// Stepping a drained loop does nothing. A host pull error leaves the
    /// loop in [`DispatchState::PullPending`].
    pub fn step<H: HostApi>(
        &mut self,
        ctx: &mut WorkerContext<H>,
    ) -> Result<&DispatchState, DispatchError> {
        match std::mem::replace(&mut self.state, DispatchState::PullPending) {
            DispatchState::Idle => {
                ctx.settle(None);
            }
            DispatchState::PullPending => {
                if let Some(id) = ctx.ops.next_task_id()? {
                    self.state = DispatchState::Dispatching(id);
                } else {
                    self.state = DispatchState::Drained;
                    ctx.logger.log(
                        LogEntry::new(LogLevel::Info, "drain finished")
                            .with_field("executed", self.report.executed.len())
                            .with_field("failed", self.report.failed.len())
                            .with_field("skipped", self.report.skipped.len()),
                    );
                }
            }
            DispatchState::Dispatching(id) => self.dispatch(ctx, id),
            DispatchState::Drained => self.state = DispatchState::Drained,
        }
        Ok(&self.state)
    }

    /// Steps until the host queue is empty and returns the report
    pub fn run<H: HostApi>(
        mut self,
        ctx: &mut WorkerContext<H>,
    ) -> Result<DrainReport, DispatchError> {
        while self.state != DispatchState::Drained {
            self.step(ctx)?;
        }
        Ok(self.report)
    }

    fn dispatch<H: HostApi>(&mut self, ctx: &mut WorkerContext<H>, id: TaskId) {
        let Some(callback) = ctx.registry.lookup_and_remove(&id) else {
            ctx.logger.log(
                LogEntry::new(LogLevel::Debug, "pulled task has no callback")
                    .with_field("task", &id),
            );
            self.report.skipped.push(id);
            return;
        };

        ctx.registry.begin(id.clone());
        let outcome = {
            let mut scope = TaskScope::new(ctx, Some(id.clone()));
            callback(&mut scope)
        };
        // Timers the task scheduled belong to it.
        ctx.settle(Some(&id));
        ctx.registry.finish();

        match outcome {
            Ok(()) => self.report.executed.push(id),
            Err(e) => {
                ctx.logger.log(
                    LogEntry::new(LogLevel::Error, "task failed")
                        .with_field("task", &id)
                        .with_field("error", &e),
                );
                self.report.failed.push((id, e.to_string()));
            }
        }
    }
}
