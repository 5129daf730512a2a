//! Deterministic fault injection for testing
//!
//! Lets tests make the simulated host misbehave in controlled ways: fail
//! I/O, or let the task queue and the script-side registry drift apart.
//!
//! ## Example
//!
//! ```
//! use sim_host::fault_injection::{FaultPlan, HostFault};
//!
//! let plan = FaultPlan::new()
//!     .with_fault(HostFault::RepeatNextPull)
//!     .with_fault(HostFault::FailReads { count: 2 });
//! assert_eq!(plan.faults().len(), 2);
//! ```

/// A fault to inject into host operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostFault {
    /// The next successful pull hands out its id but leaves it queued,
    /// so the following pull returns the same id again
    RepeatNextPull,

    /// The next N `read_file` calls reject
    FailReads { count: usize },

    /// The next N `fetch` calls reject
    FailFetches { count: usize },

    /// The next registration is acknowledged but never queued
    DropNextRegistration,
}

/// A plan describing all faults to inject
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    faults: Vec<HostFault>,
}

impl FaultPlan {
    /// Creates a new empty fault plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a fault to the plan
    pub fn with_fault(mut self, fault: HostFault) -> Self {
        self.faults.push(fault);
        self
    }

    /// Returns the planned faults
    pub fn faults(&self) -> &[HostFault] {
        &self.faults
    }
}

/// Stateful injector built from a [`FaultPlan`]
///
/// Every fault is consumed as it fires.
#[derive(Debug, Default)]
pub struct FaultInjector {
    repeat_pulls: usize,
    failing_reads: usize,
    failing_fetches: usize,
    dropped_registrations: usize,
}

impl FaultInjector {
    /// Creates a new fault injector with the given plan
    pub fn new(plan: FaultPlan) -> Self {
        let mut injector = Self::default();
        for fault in plan.faults() {
            match fault {
                HostFault::RepeatNextPull => injector.repeat_pulls += 1,
                HostFault::FailReads { count } => injector.failing_reads += count,
                HostFault::FailFetches { count } => injector.failing_fetches += count,
                HostFault::DropNextRegistration => injector.dropped_registrations += 1,
            }
        }
        injector
    }

    fn consume(counter: &mut usize) -> bool {
        if *counter > 0 {
            *counter -= 1;
            true
        } else {
            false
        }
    }

    pub fn should_repeat_pull(&mut self) -> bool {
        Self::consume(&mut self.repeat_pulls)
    }

    pub fn should_fail_read(&mut self) -> bool {
        Self::consume(&mut self.failing_reads)
    }

    pub fn should_fail_fetch(&mut self) -> bool {
        Self::consume(&mut self.failing_fetches)
    }

    pub fn should_drop_registration(&mut self) -> bool {
        Self::consume(&mut self.dropped_registrations)
    }

    /// Returns true once every planned fault has fired
    pub fn is_exhausted(&self) -> bool {
        self.repeat_pulls == 0
            && self.failing_reads == 0
            && self.failing_fetches == 0
            && self.dropped_registrations == 0
    }
}
