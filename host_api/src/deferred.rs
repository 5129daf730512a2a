//! One-shot deferred results for asynchronous host operations.
//!
//! An asynchronous op hands the caller a [`Deferred`] and keeps the matching
//! [`Completer`]. The host resolves or rejects it exactly once and stamps
//! the completion with a sequence number, so callers can order several
//! completions the way the host observed them.

use crate::HostError;
use std::sync::{Arc, Condvar, Mutex};

enum SlotState<T> {
    Pending,
    Complete { seq: u64, result: Result<T, HostError> },
    Taken,
}

struct Slot<T> {
    state: Mutex<SlotState<T>>,
    ready: Condvar,
}

impl<T> Slot<T> {
    fn complete(&self, seq: u64, result: Result<T, HostError>) {
        let mut guard = self.state.lock().expect("deferred slot mutex poisoned");
        if matches!(*guard, SlotState::Pending) {
            *guard = SlotState::Complete { seq, result };
            self.ready.notify_all();
        }
    }
}

/// Creates a linked completer/deferred pair
pub fn deferred<T>() -> (Completer<T>, Deferred<T>) {
    let slot = Arc::new(Slot {
        state: Mutex::new(SlotState::Pending),
        ready: Condvar::new(),
    });
    (
        Completer {
            slot: Some(Arc::clone(&slot)),
        },
        Deferred { slot },
    )
}

/// Host side of a deferred result
///
/// Dropping a completer without calling [`Completer::complete`] rejects
/// the deferred with [`HostError::Cancelled`].
pub struct Completer<T> {
    slot: Option<Arc<Slot<T>>>,
}

impl<T> Completer<T> {
    /// Resolves or rejects the deferred result
    pub fn complete(mut self, seq: u64, result: Result<T, HostError>) {
        if let Some(slot) = self.slot.take() {
            slot.complete(seq, result);
        }
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            slot.complete(u64::MAX, Err(HostError::Cancelled));
        }
    }
}

/// Caller side of a deferred result
pub struct Deferred<T> {
    slot: Arc<Slot<T>>,
}

impl<T> Deferred<T> {
    /// Creates a deferred that is already complete
    ///
    /// Hosts use this for operations they finish before returning.
    pub fn ready(seq: u64, result: Result<T, HostError>) -> Self {
        let (completer, deferred) = deferred();
        completer.complete(seq, result);
        deferred
    }

    /// Returns true once the host has completed the operation
    pub fn is_ready(&self) -> bool {
        let guard = self.slot.state.lock().expect("deferred slot mutex poisoned");
        !matches!(*guard, SlotState::Pending)
    }

    /// Returns the host completion sequence number, if completed
    pub fn seq(&self) -> Option<u64> {
        let guard = self.slot.state.lock().expect("deferred slot mutex poisoned");
        match *guard {
            SlotState::Complete { seq, .. } => Some(seq),
            _ => None,
        }
    }

    /// Takes the result without blocking
    ///
    /// Returns `None` while the operation is pending. The result can be
    /// taken once; later calls return `Some(Err(HostError::Cancelled))`.
    pub fn try_take(&self) -> Option<Result<T, HostError>> {
        let mut guard = self.slot.state.lock().expect("deferred slot mutex poisoned");
        match std::mem::replace(&mut *guard, SlotState::Taken) {
            SlotState::Pending => {
                *guard = SlotState::Pending;
                None
            }
            SlotState::Complete { result, .. } => Some(result),
            SlotState::Taken => Some(Err(HostError::Cancelled)),
        }
    }

    /// Blocks the calling thread until the host completes the operation
    pub fn wait(self) -> Result<T, HostError> {
        let mut guard = self.slot.state.lock().expect("deferred slot mutex poisoned");
        loop {
            match std::mem::replace(&mut *guard, SlotState::Taken) {
                SlotState::Pending => *guard = SlotState::Pending,
                SlotState::Complete { result, .. } => return result,
                SlotState::Taken => return Err(HostError::Cancelled),
            }
            // Wait releases the lock and re-acquires it before returning.
            guard = self.slot.ready.wait(guard).expect("condvar wait failed");
        }
    }

    /// Blocks until the operation is complete without taking the result
    pub fn wait_ready(&self) {
        let mut guard = self.slot.state.lock().expect("deferred slot mutex poisoned");
        while matches!(*guard, SlotState::Pending) {
            guard = self.slot.ready.wait(guard).expect("condvar wait failed");
        }
    }

    /// Waits by driving the host until it stops making progress, then blocks
    ///
    /// `drive` returns false when the host has nothing left to advance; at
    /// that point only another thread can complete the operation.
    pub fn wait_with(self, mut drive: impl FnMut() -> bool) -> Result<T, HostError> {
        loop {
            if let Some(result) = self.try_take() {
                return result;
            }
            if !drive() {
                return self.wait();
            }
        }
    }
}
