//! Timer bookkeeping for the op bridge.

use host_api::{Deferred, HostError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a scheduled timer, unique per bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer:{}", self.0)
    }
}

/// A timer the host has completed, with its callback
pub struct ReadyTimer<F> {
    pub id: TimerId,
    /// Host outcome; a rejected timer must not run its callback
    pub result: Result<(), HostError>,
    pub callback: F,
}

struct PendingTimer<F> {
    id: TimerId,
    signal: Deferred<()>,
    callback: F,
}

/// Pending timers of one bridge
pub(crate) struct TimerTable<F> {
    pending: Vec<PendingTimer<F>>,
    next_id: u64,
}

impl<F> TimerTable<F> {
    pub(crate) fn new() -> Self {
        Self {
            pending: Vec::new(),
            next_id: 0,
        }
    }

    pub(crate) fn insert(&mut self, signal: Deferred<()>, callback: F) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(PendingTimer {
            id,
            signal,
            callback,
        });
        id
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Removes completed timers, sorted by host completion sequence
    pub(crate) fn take_ready(&mut self) -> Vec<ReadyTimer<F>> {
        let mut ready = Vec::new();
        let mut index = 0;
        while index < self.pending.len() {
            if self.pending[index].signal.is_ready() {
                let timer = self.pending.remove(index);
                let seq = timer.signal.seq().unwrap_or(u64::MAX);
                let result = timer.signal.wait();
                ready.push((
                    seq,
                    ReadyTimer {
                        id: timer.id,
                        result,
                        callback: timer.callback,
                    },
                ));
            } else {
                index += 1;
            }
        }
        ready.sort_by_key(|(seq, timer)| (*seq, timer.id));
        ready.into_iter().map(|(_, timer)| timer).collect()
    }

    /// Blocks until the oldest pending timer completes
    pub(crate) fn wait_any(&self) {
        if let Some(timer) = self.pending.first() {
            timer.signal.wait_ready();
        }
    }
}
