//! # Simulated Host
//!
//! This crate provides an in-process implementation of the host API.
//!
//! ## Purpose
//!
//! The simulated host lets the task dispatch protocol run without a real
//! script engine:
//! - Runs under `cargo test`
//! - Deterministic (virtual time, FIFO task queues)
//! - Fast (in-memory files, routed network, no real delays)
//! - Inspectable (printed lines, queues and signals are all visible)
//!
//! Several worker threads may share one `SimHost`; all state sits behind a
//! single mutex, which is the internal synchronization the host-side task
//! queues need.

pub mod fault_injection;
pub mod file_store;
pub mod network;
pub mod task_queue;
pub mod test_utils;
pub mod timer;

use core_types::{ContextId, TaskId};
use fault_injection::{FaultInjector, FaultPlan};
use file_store::FileStore;
use host_api::{
    deferred, ContextDescriptor, ContextHandle, Deferred, Duration, FetchResponse, HostApi,
    HostError, Instant,
};
use network::RouteTable;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use task_queue::{QueueError, TaskQueue};
use timer::TimerQueue;

/// One line written through the host print primitive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintedLine {
    pub line: String,
    pub is_error: bool,
}

struct ContextInfo {
    handle: ContextHandle,
    queue: TaskQueue,
    signals: usize,
}

struct HostState {
    current_time: Instant,
    contexts: HashMap<ContextId, ContextInfo>,
    timers: TimerQueue,
    files: FileStore,
    routes: RouteTable,
    output: Vec<PrintedLine>,
    fault_injector: Option<FaultInjector>,
}

/// Simulated host state
pub struct SimHost {
    state: Mutex<HostState>,
    /// Source of completion sequence numbers for deferred results
    completions: AtomicU64,
    /// Also write printed lines to the process stdout/stderr
    echo: bool,
}

impl SimHost {
    /// Creates a new simulated host with an in-memory file store
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HostState {
                current_time: Instant::from_nanos(0),
                contexts: HashMap::new(),
                timers: TimerQueue::new(),
                files: FileStore::default(),
                routes: RouteTable::new(),
                output: Vec::new(),
                fault_injector: None,
            }),
            completions: AtomicU64::new(0),
            echo: false,
        }
    }

    /// Maps file ops under a real directory
    pub fn with_disk_root(self, root: impl Into<PathBuf>) -> Self {
        self.lock().files = FileStore::disk(root);
        self
    }

    /// Preloads a file into the store
    pub fn with_file(self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        // Preloading goes through the same normalization as scripts.
        let preloaded = self.lock().files.write(path, contents.into());
        if let Err(e) = preloaded {
            self.print(&format!("[host] could not preload {path}: {e}\n"), true);
        }
        self
    }

    /// Adds a canned fetch response
    pub fn with_route(self, url: &str, status: u16, body: &str) -> Self {
        self.lock().routes.insert(url, status, body);
        self
    }

    /// Sets the fault plan for this host
    pub fn with_fault_plan(self, plan: FaultPlan) -> Self {
        self.lock().fault_injector = Some(FaultInjector::new(plan));
        self
    }

    /// Echoes printed lines to the real stdout/stderr
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().expect("host state mutex poisoned")
    }

    fn next_seq(&self) -> u64 {
        self.completions.fetch_add(1, Ordering::SeqCst)
    }

    /// Advances virtual time and fires every timer that became due
    pub fn advance_time(&self, duration: Duration) {
        let mut state = self.lock();
        state.current_time = state.current_time + duration;
        self.fire_due(&mut state);
    }

    fn fire_due(&self, state: &mut HostState) -> usize {
        let due = state.timers.take_due(state.current_time);
        let fired = due.len();
        for completer in due {
            completer.complete(self.next_seq(), Ok(()));
        }
        fired
    }

    /// Returns every line printed so far
    pub fn printed(&self) -> Vec<PrintedLine> {
        self.lock().output.clone()
    }

    /// Returns the lines printed on the normal stream
    pub fn stdout_lines(&self) -> Vec<String> {
        self.lock()
            .output
            .iter()
            .filter(|p| !p.is_error)
            .map(|p| p.line.clone())
            .collect()
    }

    /// Returns the lines printed on the error stream
    pub fn stderr_lines(&self) -> Vec<String> {
        self.lock()
            .output
            .iter()
            .filter(|p| p.is_error)
            .map(|p| p.line.clone())
            .collect()
    }

    /// Returns the number of spawned contexts
    pub fn context_count(&self) -> usize {
        self.lock().contexts.len()
    }

    /// Returns the number of ids still queued for `context`
    pub fn queued_count(&self, context: ContextId) -> usize {
        self.lock()
            .contexts
            .get(&context)
            .map(|c| c.queue.len())
            .unwrap_or(0)
    }

    /// Returns the ids still queued for `context`, oldest first
    pub fn queued_ids(&self, context: ContextId) -> Vec<TaskId> {
        self.lock()
            .contexts
            .get(&context)
            .map(|c| c.queue.ids())
            .unwrap_or_default()
    }

    /// Returns how many times `context` raised the diagnostic signal
    pub fn signal_count(&self, context: ContextId) -> usize {
        self.lock()
            .contexts
            .get(&context)
            .map(|c| c.signals)
            .unwrap_or(0)
    }

    /// Returns the number of timers waiting for the clock
    pub fn pending_timer_count(&self) -> usize {
        self.lock().timers.len()
    }

    /// Reads a file straight from the store, bypassing faults
    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().files.read(path).ok()
    }

    /// Looks up the handle of a spawned context
    pub fn context(&self, context: ContextId) -> Option<ContextHandle> {
        self.lock().contexts.get(&context).map(|c| c.handle.clone())
    }
}

impl Default for SimHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostApi for SimHost {
    fn spawn_context(&self, descriptor: ContextDescriptor) -> Result<ContextHandle, HostError> {
        let handle = ContextHandle {
            context_id: ContextId::new(),
            worker_id: descriptor.worker_id,
            name: descriptor.name,
        };
        self.lock().contexts.insert(
            handle.context_id,
            ContextInfo {
                handle: handle.clone(),
                queue: TaskQueue::new(),
                signals: 0,
            },
        );
        Ok(handle)
    }

    fn read_file(&self, path: &str) -> Deferred<Vec<u8>> {
        let mut state = self.lock();
        let injected = state
            .fault_injector
            .as_mut()
            .map(|i| i.should_fail_read())
            .unwrap_or(false);
        let result = if injected {
            Err(HostError::Io {
                path: path.to_string(),
                message: "injected read failure".to_string(),
            })
        } else {
            state.files.read(path)
        };
        Deferred::ready(self.next_seq(), result)
    }

    fn write_file(&self, path: &str, contents: Vec<u8>) -> Deferred<()> {
        let result = self.lock().files.write(path, contents);
        Deferred::ready(self.next_seq(), result)
    }

    fn remove_file(&self, path: &str) -> Result<(), HostError> {
        self.lock().files.remove(path)
    }

    fn fetch(&self, url: &str) -> Deferred<FetchResponse> {
        let mut state = self.lock();
        let injected = state
            .fault_injector
            .as_mut()
            .map(|i| i.should_fail_fetch())
            .unwrap_or(false);
        let result = if injected {
            Err(HostError::Network {
                url: url.to_string(),
                message: "injected fetch failure".to_string(),
            })
        } else {
            state.routes.fetch(url)
        };
        Deferred::ready(self.next_seq(), result)
    }

    fn set_timeout(&self, delay: Duration) -> Deferred<()> {
        let (completer, deferred) = deferred();
        let mut state = self.lock();
        let deadline = state.current_time + delay;
        state.timers.schedule(deadline, completer);
        deferred
    }

    fn print(&self, line: &str, is_error: bool) {
        if self.echo {
            if is_error {
                eprint!("{line}");
            } else {
                print!("{line}");
            }
        }
        self.lock().output.push(PrintedLine {
            line: line.to_string(),
            is_error,
        });
    }

    fn register_task(&self, context: ContextId, task: &TaskId) -> Result<(), HostError> {
        let mut state = self.lock();
        let dropped = state
            .fault_injector
            .as_mut()
            .map(|i| i.should_drop_registration())
            .unwrap_or(false);
        let info = state
            .contexts
            .get_mut(&context)
            .ok_or(HostError::UnknownContext(context))?;
        if dropped {
            return Ok(());
        }
        info.queue.push(task.clone()).map_err(|e| match e {
            QueueError::Duplicate(id) => HostError::DuplicateTask(id),
        })
    }

    fn get_next_task_id(&self, context: ContextId) -> Result<Option<TaskId>, HostError> {
        let mut state = self.lock();
        let repeat = state
            .fault_injector
            .as_mut()
            .map(|i| i.should_repeat_pull())
            .unwrap_or(false);
        let info = state
            .contexts
            .get_mut(&context)
            .ok_or(HostError::UnknownContext(context))?;
        if repeat {
            return Ok(info.queue.peek().cloned());
        }
        Ok(info.queue.pop())
    }

    fn signal(&self, context: ContextId) {
        if let Some(info) = self.lock().contexts.get_mut(&context) {
            info.signals += 1;
        }
        self.print("woof\n", false);
    }

    fn now(&self) -> Instant {
        self.lock().current_time
    }

    fn drive(&self) -> bool {
        let mut state = self.lock();
        let Some(deadline) = state.timers.next_deadline() else {
            return false;
        };
        if deadline > state.current_time {
            state.current_time = deadline;
        }
        self.fire_due(&mut state) > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::WorkerId;

    fn spawn(host: &SimHost) -> ContextId {
        host.spawn_context(ContextDescriptor::new("test"))
            .unwrap()
            .context_id
    }

    #[test]
    fn test_simulated_host_creation() {
        let host = SimHost::new();
        assert_eq!(host.context_count(), 0);
        assert_eq!(host.now(), Instant::from_nanos(0));
    }

    #[test]
    fn test_spawn_context_keeps_worker_identity() {
        let host = SimHost::new();
        let worker = WorkerId::new();
        let handle = host
            .spawn_context(ContextDescriptor::new("w").with_worker_id(worker))
            .unwrap();
        assert_eq!(handle.worker_id, Some(worker));
        assert_eq!(host.context(handle.context_id), Some(handle));
    }

    #[test]
    fn test_register_then_pull_in_fifo_order() {
        let host = SimHost::new();
        let ctx = spawn(&host);
        host.register_task(ctx, &TaskId::from("a")).unwrap();
        host.register_task(ctx, &TaskId::from("b")).unwrap();

        assert_eq!(host.get_next_task_id(ctx).unwrap(), Some(TaskId::from("a")));
        assert_eq!(host.get_next_task_id(ctx).unwrap(), Some(TaskId::from("b")));
        assert_eq!(host.get_next_task_id(ctx).unwrap(), None);
        assert_eq!(host.get_next_task_id(ctx).unwrap(), None);
    }

    #[test]
    fn test_queues_are_per_context() {
        let host = SimHost::new();
        let a = spawn(&host);
        let b = spawn(&host);
        host.register_task(a, &TaskId::from("x")).unwrap();

        assert_eq!(host.get_next_task_id(b).unwrap(), None);
        assert_eq!(host.queued_count(a), 1);
        assert!(host.register_task(b, &TaskId::from("x")).is_ok());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let host = SimHost::new();
        let ctx = spawn(&host);
        host.register_task(ctx, &TaskId::from("a")).unwrap();
        assert_eq!(
            host.register_task(ctx, &TaskId::from("a")),
            Err(HostError::DuplicateTask(TaskId::from("a")))
        );
    }

    #[test]
    fn test_unknown_context() {
        let host = SimHost::new();
        let ctx = ContextId::new();
        assert_eq!(
            host.get_next_task_id(ctx),
            Err(HostError::UnknownContext(ctx))
        );
    }

    #[test]
    fn test_file_ops() {
        let host = SimHost::new();
        host.write_file("a.txt", b"abc".to_vec()).wait().unwrap();
        assert_eq!(host.read_file("a.txt").wait().unwrap(), b"abc");
        host.remove_file("a.txt").unwrap();
        assert!(matches!(
            host.read_file("a.txt").wait(),
            Err(HostError::NotFound(_))
        ));
        assert!(host.remove_file("a.txt").is_err());
    }

    #[test]
    fn test_fetch_routes() {
        let host = SimHost::new().with_route("sim://x", 200, "body");
        assert_eq!(host.fetch("sim://x").wait().unwrap().body, "body");
        assert!(matches!(
            host.fetch("sim://y").wait(),
            Err(HostError::Network { .. })
        ));
    }

    #[test]
    fn test_timer_fires_on_advance() {
        let host = SimHost::new();
        let timer = host.set_timeout(Duration::from_millis(100));
        host.advance_time(Duration::from_millis(99));
        assert!(!timer.is_ready());
        host.advance_time(Duration::from_millis(1));
        assert!(timer.is_ready());
        assert_eq!(host.pending_timer_count(), 0);
    }

    #[test]
    fn test_drive_jumps_to_next_deadline() {
        let host = SimHost::new();
        let slow = host.set_timeout(Duration::from_millis(50));
        let fast = host.set_timeout(Duration::from_millis(10));

        assert!(host.drive());
        assert!(fast.is_ready());
        assert!(!slow.is_ready());
        assert_eq!(host.now(), Instant::from_nanos(0) + Duration::from_millis(10));

        assert!(host.drive());
        assert!(slow.is_ready());
        assert!(fast.seq() < slow.seq());
        assert!(!host.drive());
    }

    #[test]
    fn test_wait_with_drive_resolves_timer() {
        let host = SimHost::new();
        let timer = host.set_timeout(Duration::from_secs(5));
        assert_eq!(timer.wait_with(|| host.drive()), Ok(()));
        assert!(host.now() >= Instant::from_nanos(0) + Duration::from_secs(5));
    }

    #[test]
    fn test_print_captures_streams() {
        let host = SimHost::new();
        host.print("out\n", false);
        host.print("err\n", true);
        assert_eq!(host.stdout_lines(), vec!["out\n".to_string()]);
        assert_eq!(host.stderr_lines(), vec!["err\n".to_string()]);
    }

    #[test]
    fn test_signal_counts_and_prints() {
        let host = SimHost::new();
        let ctx = spawn(&host);
        host.signal(ctx);
        host.signal(ctx);
        assert_eq!(host.signal_count(ctx), 2);
        assert_eq!(host.stdout_lines().len(), 2);
    }

    #[test]
    fn test_preloaded_file() {
        let host = SimHost::new().with_file("cfg.json", "{}");
        assert_eq!(host.file("cfg.json"), Some(b"{}".to_vec()));
    }
}
