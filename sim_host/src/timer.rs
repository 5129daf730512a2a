//! # Virtual Timers
//!
//! Deterministic timer queue for the simulated host.
//!
//! Timers only fire when the host clock is advanced, either explicitly
//! through [`crate::SimHost::advance_time`] or by [`crate::SimHost`]'s
//! `drive`, which jumps straight to the earliest deadline. A delay
//! therefore costs no wall-clock time.

use host_api::{Completer, Instant};

struct PendingTimer {
    deadline: Instant,
    /// Creation order, breaks ties between equal deadlines
    order: u64,
    completer: Completer<()>,
}

/// Queue of timers waiting for the virtual clock
#[derive(Default)]
pub struct TimerQueue {
    pending: Vec<PendingTimer>,
    next_order: u64,
}

impl TimerQueue {
    /// Creates an empty timer queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `completer` to be resolved at `deadline`
    pub fn schedule(&mut self, deadline: Instant, completer: Completer<()>) {
        let order = self.next_order;
        self.next_order += 1;
        self.pending.push(PendingTimer {
            deadline,
            order,
            completer,
        });
    }

    /// Returns the number of timers not yet fired
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns whether no timer is pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest deadline among pending timers
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|t| t.deadline).min()
    }

    /// Removes every timer due at `now`, in firing order
    ///
    /// Firing order is deadline first, then creation order.
    pub fn take_due(&mut self, now: Instant) -> Vec<Completer<()>> {
        let mut due = Vec::new();
        let mut index = 0;
        while index < self.pending.len() {
            if self.pending[index].deadline <= now {
                due.push(self.pending.swap_remove(index));
            } else {
                index += 1;
            }
        }
        due.sort_by_key(|t| (t.deadline, t.order));
        due.into_iter().map(|t| t.completer).collect()
    }
}
