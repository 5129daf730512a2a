//! Test utilities for dispatch and host tests
//!
//! Helpers that set up a simulated host and contexts with less ceremony.

use crate::fault_injection::FaultPlan;
use crate::SimHost;
use core_types::{TaskId, WorkerId};
use host_api::{ContextDescriptor, ContextHandle, HostApi, HostError};

/// Runs a test with a fault plan applied
///
/// # Example
///
/// ```
/// use sim_host::test_utils::with_fault_plan;
/// use sim_host::fault_injection::{FaultPlan, HostFault};
///
/// with_fault_plan(
///     FaultPlan::new().with_fault(HostFault::FailReads { count: 1 }),
///     |host| {
///         assert_eq!(host.context_count(), 0);
///     },
/// );
/// ```
pub fn with_fault_plan<F>(plan: FaultPlan, f: F)
where
    F: FnOnce(&SimHost),
{
    let host = SimHost::new().with_fault_plan(plan);
    f(&host);
}

/// Spawns a context with a fresh worker identity
pub fn spawn_worker_context(host: &SimHost, name: &str) -> Result<ContextHandle, HostError> {
    host.spawn_context(ContextDescriptor::new(name).with_worker_id(WorkerId::new()))
}

/// Pulls every remaining id of a context, oldest first
pub fn pull_all(host: &SimHost, handle: &ContextHandle) -> Result<Vec<TaskId>, HostError> {
    let mut ids = Vec::new();
    while let Some(id) = host.get_next_task_id(handle.context_id)? {
        ids.push(id);
    }
    Ok(ids)
}
