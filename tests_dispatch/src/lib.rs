//! Dispatch Test Utilities
//!
//! Shared helpers for the cross-crate dispatch tests.
//!
//! ## Test Philosophy
//!
//! - **Exactly once**: every registered callback runs once, however the
//!   host misbehaves
//! - **Deterministic failures**: host bugs are reproduced via FaultPlan
//! - **Sequential workers**: callbacks of one worker never overlap
//! - **Independent workers**: workers sharing a host only share its queue map

use core_types::WorkerId;
use host_api::{ContextDescriptor, HostError, Instant};
use services_task_dispatch::WorkerContext;
use sim_host::SimHost;
use std::sync::{Arc, Mutex};

/// Bootstrap helper for tests
///
/// Creates a host and one worker context with a fresh identity.
pub fn test_bootstrap() -> (Arc<SimHost>, WorkerContext<SimHost>) {
    bootstrap_with(SimHost::new())
}

/// Same as [`test_bootstrap`] on a preconfigured host
pub fn bootstrap_with(host: SimHost) -> (Arc<SimHost>, WorkerContext<SimHost>) {
    let host = Arc::new(host);
    let ctx = spawn_worker(&host, "worker").expect("spawn worker context");
    (host, ctx)
}

/// Spawns another worker context on `host`
pub fn spawn_worker(host: &Arc<SimHost>, name: &str) -> Result<WorkerContext<SimHost>, HostError> {
    WorkerContext::spawn(
        Arc::clone(host),
        ContextDescriptor::new(name).with_worker_id(WorkerId::new()),
    )
}

/// Event recorded by instrumented callbacks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trace {
    Enter(String, Instant),
    Exit(String, Instant),
}

/// Shared log of callback events
#[derive(Debug, Clone, Default)]
pub struct TraceLog {
    events: Arc<Mutex<Vec<Trace>>>,
}

impl TraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self, task: &str, at: Instant) {
        self.push(Trace::Enter(task.to_string(), at));
    }

    pub fn exit(&self, task: &str, at: Instant) {
        self.push(Trace::Exit(task.to_string(), at));
    }

    fn push(&self, event: Trace) {
        self.events.lock().expect("trace mutex poisoned").push(event);
    }

    pub fn events(&self) -> Vec<Trace> {
        self.events.lock().expect("trace mutex poisoned").clone()
    }

    /// Names of entered tasks, in order
    pub fn entered(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Trace::Enter(name, _) => Some(name),
                Trace::Exit(..) => None,
            })
            .collect()
    }

    /// Returns true when every enter is followed by its own exit before
    /// the next enter, and exits never precede their enter in time
    pub fn is_sequential(&self) -> bool {
        let mut open: Option<(String, Instant)> = None;
        let mut last_exit: Option<Instant> = None;
        for event in self.events() {
            match event {
                Trace::Enter(name, at) => {
                    if open.is_some() || last_exit.is_some_and(|exit| at < exit) {
                        return false;
                    }
                    open = Some((name, at));
                }
                Trace::Exit(name, at) => match open.take() {
                    Some((entered, start)) if entered == name && start <= at => {
                        last_exit = Some(at);
                    }
                    _ => return false,
                },
            }
        }
        open.is_none()
    }
}
