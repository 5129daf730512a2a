//! Worker identity of a context.

use core_types::WorkerId;
use host_api::ContextHandle;
use std::fmt;

/// The identity slot of one context
///
/// Filled by the host when the context is spawned and immutable from then
/// on. A context that was never given an identity reads as unassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkerIdentity(Option<WorkerId>);

impl WorkerIdentity {
    /// Identity of a non-worker context
    pub fn unassigned() -> Self {
        Self(None)
    }

    /// Identity of a worker context
    pub fn assigned(worker_id: WorkerId) -> Self {
        Self(Some(worker_id))
    }

    /// Returns the worker id, if any
    pub fn get(&self) -> Option<WorkerId> {
        self.0
    }

    /// Returns true for a worker context
    pub fn is_worker(&self) -> bool {
        self.0.is_some()
    }
}

impl From<&ContextHandle> for WorkerIdentity {
    fn from(handle: &ContextHandle) -> Self {
        Self(handle.worker_id)
    }
}

impl fmt::Display for WorkerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(id) => write!(f, "{id}"),
            None => f.write_str("null"),
        }
    }
}
