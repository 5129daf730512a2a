//! Per-worker task registry.
//!
//! Maps task ids to callbacks and keeps the host's eligibility queue in
//! lockstep: every successful [`TaskRegistry::register`] produces exactly
//! one host-queue entry, and every callback leaves the registry through
//! [`TaskRegistry::lookup_and_remove`] exactly once.

use crate::error::RegistryError;
use crate::worker::TaskFn;
use core_types::{ContextId, TaskId};
use host_api::HostApi;
use std::collections::HashMap;
use std::sync::Arc;

/// Task id → callback map of one context
pub struct TaskRegistry<H: HostApi> {
    host: Arc<H>,
    context: ContextId,
    callbacks: HashMap<TaskId, TaskFn<H>>,
    /// Id of the callback currently executing, if any
    running: Option<TaskId>,
}

impl<H: HostApi> TaskRegistry<H> {
    /// Creates an empty registry for `context`
    pub fn new(host: Arc<H>, context: ContextId) -> Self {
        Self {
            host,
            context,
            callbacks: HashMap::new(),
            running: None,
        }
    }

    /// Registers `callback` under `id` and tells the host it is eligible
    ///
    /// Fails without side effects if `id` is registered already or is the
    /// task currently running. If the host refuses the notification the
    /// insert is rolled back.
    pub fn register(&mut self, id: TaskId, callback: TaskFn<H>) -> Result<(), RegistryError> {
        if self.callbacks.contains_key(&id) {
            return Err(RegistryError::DuplicateTask(id));
        }
        if self.running.as_ref() == Some(&id) {
            return Err(RegistryError::TaskRunning(id));
        }
        self.callbacks.insert(id.clone(), callback);
        if let Err(e) = self.host.register_task(self.context, &id) {
            self.callbacks.remove(&id);
            return Err(RegistryError::Host(e));
        }
        Ok(())
    }

    /// Takes the callback for `id` out of the registry
    ///
    /// Returns `None` if nothing is registered under `id`, including when
    /// it was already taken.
    pub fn lookup_and_remove(&mut self, id: &TaskId) -> Option<TaskFn<H>> {
        self.callbacks.remove(id)
    }

    /// Returns whether `id` has a registered callback
    pub fn contains(&self, id: &TaskId) -> bool {
        self.callbacks.contains_key(id)
    }

    /// Returns the number of registered callbacks
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Returns true when no callback is registered
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Returns the registered ids in sorted order
    pub fn ids(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self.callbacks.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Returns the id of the running callback, if any
    pub fn running(&self) -> Option<&TaskId> {
        self.running.as_ref()
    }

    pub(crate) fn begin(&mut self, id: TaskId) {
        self.running = Some(id);
    }

    pub(crate) fn finish(&mut self) {
        self.running = None;
    }
}
