//! # Op Bridge
//!
//! Exposes host primitives to script code under one namespace.
//!
//! ## Calling conventions
//!
//! - **Synchronous** ops (`remove_file`, `signal`) return immediately; a
//!   failure is an `Err` the caller must handle.
//! - **Asynchronous** ops (`read_file`, `write_file`, `fetch`, `sleep`)
//!   return a [`Deferred`]; a failure is a rejection surfaced by
//!   [`OpBridge::wait`].
//!
//! The bridge is a pass-through: no retries, no buffering, no assumption
//! about how long the host takes.
//!
//! ## Timers
//!
//! [`OpBridge::set_timeout`] pairs a callback with a host timer. The
//! bridge only keeps the bookkeeping; whoever owns the bridge invokes the
//! callbacks handed back by [`OpBridge::poll_timers`], in the order the
//! host completed the timers.

pub mod timers;

use core_types::{ContextId, TaskId};
use host_api::{Deferred, Duration, FetchResponse, HostApi, HostError};
use std::sync::Arc;

pub use timers::{ReadyTimer, TimerId};
use timers::TimerTable;

/// Host ops bound to one context
///
/// `F` is the timer callback type chosen by the owner of the bridge.
pub struct OpBridge<H: HostApi, F> {
    host: Arc<H>,
    context: ContextId,
    timers: TimerTable<F>,
}

impl<H: HostApi, F> OpBridge<H, F> {
    /// Creates a bridge for `context`
    pub fn new(host: Arc<H>, context: ContextId) -> Self {
        Self {
            host,
            context,
            timers: TimerTable::new(),
        }
    }

    /// Returns the host behind this bridge
    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    /// Returns the context this bridge acts for
    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Reads a whole file (async)
    pub fn read_file(&self, path: &str) -> Deferred<Vec<u8>> {
        self.host.read_file(path)
    }

    /// Reads a whole file and decodes it as UTF-8, waiting for the host
    pub fn read_text_file(&self, path: &str) -> Result<String, HostError> {
        let bytes = self.wait(self.read_file(path))?;
        String::from_utf8(bytes).map_err(|e| HostError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Writes a whole file (async)
    pub fn write_file(&self, path: &str, contents: impl Into<Vec<u8>>) -> Deferred<()> {
        self.host.write_file(path, contents.into())
    }

    /// Removes a file (sync)
    pub fn remove_file(&self, path: &str) -> Result<(), HostError> {
        self.host.remove_file(path)
    }

    /// Fetches a url (async)
    pub fn fetch(&self, url: &str) -> Deferred<FetchResponse> {
        self.host.fetch(url)
    }

    /// Raw timer signal: resolves after at least `delay` (async)
    pub fn sleep(&self, delay: Duration) -> Deferred<()> {
        self.host.set_timeout(delay)
    }

    /// Raises the host's diagnostic signal (fire-and-forget)
    pub fn signal(&self) {
        self.host.signal(self.context);
    }

    /// Tells the host that `task` is eligible for dispatch
    pub fn register_task(&self, task: &TaskId) -> Result<(), HostError> {
        self.host.register_task(self.context, task)
    }

    /// Pulls the next eligible task id from the host
    pub fn next_task_id(&self) -> Result<Option<TaskId>, HostError> {
        self.host.get_next_task_id(self.context)
    }

    /// Suspends until `deferred` completes
    ///
    /// The host is driven while waiting so virtual-time hosts make
    /// progress; threaded hosts fall back to blocking.
    pub fn wait<T>(&self, deferred: Deferred<T>) -> Result<T, HostError> {
        let host = &self.host;
        deferred.wait_with(|| host.drive())
    }

    /// Schedules `callback` to run at or after `delay`
    pub fn set_timeout(&mut self, delay: Duration, callback: F) -> TimerId {
        let signal = self.host.set_timeout(delay);
        self.timers.insert(signal, callback)
    }

    /// Returns the number of timers whose callback has not been handed out
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Hands back timers the host already completed, in completion order
    pub fn take_ready_timers(&mut self) -> Vec<ReadyTimer<F>> {
        self.timers.take_ready()
    }

    /// Hands back at least one completed timer if any is pending
    ///
    /// Drives the host until a timer of this bridge completes, blocking
    /// only when the host cannot make progress itself. Returns an empty
    /// list when no timer is pending.
    pub fn poll_timers(&mut self) -> Vec<ReadyTimer<F>> {
        while !self.timers.is_empty() {
            let ready = self.timers.take_ready();
            if !ready.is_empty() {
                return ready;
            }
            if !self.host.drive() {
                self.timers.wait_any();
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use host_api::{ContextDescriptor, Instant};
    use sim_host::SimHost;

    type Bridge = OpBridge<SimHost, &'static str>;

    fn bridge(host: SimHost) -> (Arc<SimHost>, Bridge) {
        let host = Arc::new(host);
        let ctx = host
            .spawn_context(ContextDescriptor::new("test"))
            .unwrap()
            .context_id;
        (Arc::clone(&host), OpBridge::new(host, ctx))
    }

    #[test]
    fn test_file_ops_pass_through() {
        let (host, ops) = bridge(SimHost::new());
        ops.wait(ops.write_file("out.txt", "hi")).unwrap();
        assert_eq!(host.file("out.txt"), Some(b"hi".to_vec()));
        assert_eq!(ops.read_text_file("out.txt").unwrap(), "hi");
        ops.remove_file("out.txt").unwrap();
        assert!(matches!(ops.remove_file("out.txt"), Err(HostError::NotFound(_))));
    }

    #[test]
    fn test_read_rejection_surfaces_on_wait() {
        let (_host, ops) = bridge(SimHost::new());
        assert!(matches!(
            ops.wait(ops.read_file("missing")),
            Err(HostError::NotFound(_))
        ));
    }

    #[test]
    fn test_invalid_utf8_is_io_error() {
        let (_host, ops) = bridge(SimHost::new().with_file("bin", vec![0xff, 0xfe]));
        assert!(matches!(
            ops.read_text_file("bin"),
            Err(HostError::Io { .. })
        ));
    }

    #[test]
    fn test_fetch_pass_through() {
        let (_host, ops) = bridge(SimHost::new().with_route("sim://a", 200, "A"));
        let response = ops.wait(ops.fetch("sim://a")).unwrap();
        assert_eq!(response.body, "A");
    }

    #[test]
    fn test_sleep_waits_at_least_delay() {
        let (host, ops) = bridge(SimHost::new());
        let start = host.now();
        ops.wait(ops.sleep(Duration::from_millis(30))).unwrap();
        assert!(host.now().duration_since(start) >= Duration::from_millis(30));
    }

    #[test]
    fn test_signal_reaches_host() {
        let (host, ops) = bridge(SimHost::new());
        ops.signal();
        assert_eq!(host.signal_count(ops.context()), 1);
    }

    #[test]
    fn test_task_queue_ops() {
        let (_host, ops) = bridge(SimHost::new());
        ops.register_task(&TaskId::from("t")).unwrap();
        assert_eq!(ops.next_task_id().unwrap(), Some(TaskId::from("t")));
        assert_eq!(ops.next_task_id().unwrap(), None);
    }

    #[test]
    fn test_timers_delivered_in_completion_order() {
        let (host, mut ops) = bridge(SimHost::new());
        ops.set_timeout(Duration::from_millis(20), "late");
        ops.set_timeout(Duration::from_millis(5), "early");
        ops.set_timeout(Duration::from_millis(5), "early-second");
        assert_eq!(ops.pending_timers(), 3);

        let mut fired = Vec::new();
        loop {
            let ready = ops.poll_timers();
            if ready.is_empty() {
                break;
            }
            fired.extend(ready.into_iter().map(|t| t.callback));
        }
        assert_eq!(fired, vec!["early", "early-second", "late"]);
        assert_eq!(ops.pending_timers(), 0);
        assert_eq!(host.now(), Instant::from_nanos(0) + Duration::from_millis(20));
    }

    #[test]
    fn test_timer_handed_out_exactly_once() {
        let (host, mut ops) = bridge(SimHost::new());
        let id = ops.set_timeout(Duration::from_millis(1), "once");
        host.advance_time(Duration::from_millis(1));

        let ready = ops.take_ready_timers();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].id, id);
        assert!(ready[0].result.is_ok());
        assert!(ops.take_ready_timers().is_empty());
        assert!(ops.poll_timers().is_empty());
    }
}
