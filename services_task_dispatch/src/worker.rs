//! Worker context and the scope handed to task callbacks.

use crate::dispatch::{DispatchLoop, DrainReport};
use crate::error::{DispatchError, RegistryError, TaskError, TaskResult};
use crate::identity::WorkerIdentity;
use crate::registry::TaskRegistry;
use core_types::{TaskId, WorkerId};
use host_api::{ContextDescriptor, ContextHandle, Deferred, Duration, HostApi, HostError};
use op_bridge::{OpBridge, TimerId};
use services_console::Console;
use services_logger::{LogEntry, LogLevel, Logger};
use std::sync::Arc;

/// A registered unit of work, also used for timer callbacks
pub type TaskFn<H> = Box<dyn FnOnce(&mut TaskScope<'_, H>) -> TaskResult + Send>;

/// Everything one isolated context owns
///
/// The registry, bridge, console and logger all belong to exactly one
/// context; nothing here is shared with other workers except the host.
pub struct WorkerContext<H: HostApi> {
    handle: ContextHandle,
    identity: WorkerIdentity,
    pub(crate) registry: TaskRegistry<H>,
    pub(crate) ops: OpBridge<H, TaskFn<H>>,
    console: Console<H>,
    pub(crate) logger: Logger<H>,
}

impl<H: HostApi> WorkerContext<H> {
    /// Asks the host for a new context and builds its worker state
    pub fn spawn(host: Arc<H>, descriptor: ContextDescriptor) -> Result<Self, HostError> {
        let handle = host.spawn_context(descriptor)?;
        Ok(Self::new(host, handle))
    }

    /// Builds worker state around an already spawned context
    pub fn new(host: Arc<H>, handle: ContextHandle) -> Self {
        let identity = WorkerIdentity::from(&handle);
        Self {
            registry: TaskRegistry::new(Arc::clone(&host), handle.context_id),
            ops: OpBridge::new(Arc::clone(&host), handle.context_id),
            console: Console::new(Arc::clone(&host)),
            logger: Logger::new(host, identity.get()).with_threshold(LogLevel::Warn),
            handle,
            identity,
        }
    }

    /// Changes which log entries are printed through the host
    pub fn with_log_threshold(mut self, threshold: LogLevel) -> Self {
        self.logger = Logger::new(Arc::clone(self.ops.host()), self.identity.get())
            .with_threshold(threshold);
        self
    }

    /// Returns the host handle of this context
    pub fn handle(&self) -> &ContextHandle {
        &self.handle
    }

    /// Returns the identity assigned at creation
    pub fn identity(&self) -> WorkerIdentity {
        self.identity
    }

    /// Returns the registry
    pub fn registry(&self) -> &TaskRegistry<H> {
        &self.registry
    }

    /// Returns the op bridge
    pub fn ops(&self) -> &OpBridge<H, TaskFn<H>> {
        &self.ops
    }

    /// Returns the console
    pub fn console(&self) -> &Console<H> {
        &self.console
    }

    /// Returns every log entry recorded by this context
    pub fn log_entries(&self) -> &[LogEntry] {
        self.logger.entries()
    }

    /// Registers a task during the setup phase
    pub fn register<F>(
        &mut self,
        id: impl Into<TaskId>,
        callback: F,
    ) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut TaskScope<'_, H>) -> TaskResult + Send + 'static,
    {
        self.registry.register(id.into(), Box::new(callback))
    }

    /// Schedules a timer callback outside of any task
    pub fn set_timeout<F>(&mut self, delay: Duration, callback: F) -> TimerId
    where
        F: FnOnce(&mut TaskScope<'_, H>) -> TaskResult + Send + 'static,
    {
        self.ops.set_timeout(delay, Box::new(callback))
    }

    /// Runs timer callbacks until no timer of this context is pending
    ///
    /// Timers scheduled by the callbacks themselves are settled too.
    /// Returns the number of callbacks that failed.
    pub fn settle(&mut self, origin: Option<&TaskId>) -> usize {
        let mut failures = 0;
        loop {
            let ready = self.ops.poll_timers();
            if ready.is_empty() {
                return failures;
            }
            for timer in ready {
                let outcome = match timer.result {
                    Ok(()) => {
                        let mut scope = TaskScope::new(self, origin.cloned());
                        (timer.callback)(&mut scope)
                    }
                    Err(e) => Err(TaskError::Host(e)),
                };
                if let Err(e) = outcome {
                    failures += 1;
                    let mut entry = LogEntry::new(LogLevel::Error, "timer callback failed")
                        .with_field("timer", timer.id)
                        .with_field("error", &e);
                    if let Some(task) = origin {
                        entry = entry.with_field("task", task);
                    }
                    self.logger.log(entry);
                }
            }
        }
    }

    /// Drains every eligible task of this context
    ///
    /// Calling it again after it returned pulls again; with nothing
    /// registered in between it returns an empty report.
    pub fn drain(&mut self) -> Result<DrainReport, DispatchError> {
        DispatchLoop::new().run(self)
    }
}

/// What a task or timer callback can reach
pub struct TaskScope<'a, H: HostApi> {
    ctx: &'a mut WorkerContext<H>,
    task_id: Option<TaskId>,
}

impl<'a, H: HostApi> TaskScope<'a, H> {
    pub(crate) fn new(ctx: &'a mut WorkerContext<H>, task_id: Option<TaskId>) -> Self {
        Self { ctx, task_id }
    }

    /// Id of the task being executed (or that scheduled this timer)
    pub fn task_id(&self) -> Option<&TaskId> {
        self.task_id.as_ref()
    }

    /// Identity of the worker this callback runs in
    pub fn worker_id(&self) -> Option<WorkerId> {
        self.ctx.identity.get()
    }

    /// Identity slot of the worker this callback runs in
    pub fn identity(&self) -> WorkerIdentity {
        self.ctx.identity
    }

    /// Host ops
    pub fn ops(&self) -> &OpBridge<H, TaskFn<H>> {
        &self.ctx.ops
    }

    /// Script console
    pub fn console(&self) -> &Console<H> {
        &self.ctx.console
    }

    /// Suspends the callback until `deferred` completes
    pub fn wait<T>(&self, deferred: Deferred<T>) -> Result<T, HostError> {
        self.ctx.ops.wait(deferred)
    }

    /// Registers another task from inside a callback
    pub fn register<F>(&mut self, id: impl Into<TaskId>, callback: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut TaskScope<'_, H>) -> TaskResult + Send + 'static,
    {
        self.ctx.register(id, callback)
    }

    /// Schedules a timer callback; the current task completes only after it ran
    pub fn set_timeout<F>(&mut self, delay: Duration, callback: F) -> TimerId
    where
        F: FnOnce(&mut TaskScope<'_, H>) -> TaskResult + Send + 'static,
    {
        self.ctx.set_timeout(delay, callback)
    }

    /// Records a structured log entry for this worker
    pub fn log(&mut self, entry: LogEntry) {
        self.ctx.logger.log(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use services_console::console_args;
    use sim_host::SimHost;
    use std::sync::Mutex;

    fn worker(host: &Arc<SimHost>) -> WorkerContext<SimHost> {
        WorkerContext::spawn(
            Arc::clone(host),
            ContextDescriptor::new("w").with_worker_id(WorkerId::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_spawn_assigns_identity_from_host() {
        let host = Arc::new(SimHost::new());
        let ctx = worker(&host);
        assert!(ctx.identity().is_worker());
        assert_eq!(ctx.identity().get(), ctx.handle().worker_id);
    }

    #[test]
    fn test_non_worker_context_identity_is_unassigned() {
        let host = Arc::new(SimHost::new());
        let ctx = WorkerContext::spawn(Arc::clone(&host), ContextDescriptor::new("main")).unwrap();
        assert_eq!(ctx.identity(), WorkerIdentity::unassigned());
    }

    #[test]
    fn test_settle_runs_timers_in_completion_order() {
        let host = Arc::new(SimHost::new());
        let mut ctx = worker(&host);
        let order = Arc::new(Mutex::new(Vec::new()));

        for (name, millis) in [("slow", 30), ("fast", 10)] {
            let order = Arc::clone(&order);
            ctx.set_timeout(Duration::from_millis(millis), move |_| {
                order.lock().unwrap().push(name);
                Ok(())
            });
        }

        assert_eq!(ctx.settle(None), 0);
        assert_eq!(*order.lock().unwrap(), vec!["fast", "slow"]);
        assert_eq!(ctx.ops().pending_timers(), 0);
    }

    #[test]
    fn test_settle_follows_nested_timers() {
        let host = Arc::new(SimHost::new());
        let mut ctx = worker(&host);
        let hits = Arc::new(Mutex::new(0));

        let outer_hits = Arc::clone(&hits);
        ctx.set_timeout(Duration::from_millis(5), move |scope| {
            *outer_hits.lock().unwrap() += 1;
            let inner_hits = Arc::clone(&outer_hits);
            scope.set_timeout(Duration::from_millis(5), move |_| {
                *inner_hits.lock().unwrap() += 1;
                Ok(())
            });
            Ok(())
        });

        ctx.settle(None);
        assert_eq!(*hits.lock().unwrap(), 2);
    }

    #[test]
    fn test_failing_timer_is_logged_and_counted() {
        let host = Arc::new(SimHost::new());
        let mut ctx = worker(&host);
        ctx.set_timeout(Duration::ZERO, |_| Err(TaskError::failed("tick failed")));

        assert_eq!(ctx.settle(None), 1);
        let entry = &ctx.log_entries()[0];
        assert_eq!(entry.level, LogLevel::Error);
        assert_eq!(entry.field("error"), Some("tick failed"));
        assert_eq!(host.stderr_lines().len(), 1);
    }

    #[test]
    fn test_scope_exposes_console_and_ops() {
        let host = Arc::new(SimHost::new().with_file("in.txt", "data"));
        let mut ctx = worker(&host);
        ctx.set_timeout(Duration::ZERO, |scope| {
            let text = scope.ops().read_text_file("in.txt")?;
            scope.console().log(&console_args!(text));
            Ok(())
        });
        ctx.settle(None);
        assert_eq!(host.stdout_lines(), vec!["[out]: \"data\"\n".to_string()]);
    }
}
