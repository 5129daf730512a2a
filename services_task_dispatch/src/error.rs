//! Dispatch error types

use core_types::TaskId;
use host_api::HostError;
use thiserror::Error;

/// Errors raised by task registration
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The id already has a registered callback
    #[error("Task already registered: {0}")]
    DuplicateTask(TaskId),

    /// The id belongs to the callback that is running right now
    #[error("Task is still running: {0}")]
    TaskRunning(TaskId),

    /// The host refused the eligibility notification
    #[error("Host rejected registration: {0}")]
    Host(#[from] HostError),
}

/// Failure of a task or timer callback
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskError {
    /// The callback reported a failure of its own
    #[error("{0}")]
    Failed(String),

    /// A host op the callback awaited was rejected
    #[error("Host op failed: {0}")]
    Host(#[from] HostError),

    /// The callback tried to register a task and was refused
    #[error("Registration failed: {0}")]
    Registry(#[from] RegistryError),
}

impl TaskError {
    /// Builds a callback-reported failure
    pub fn failed(message: impl Into<String>) -> Self {
        TaskError::Failed(message.into())
    }
}

/// Errors that abort a drain
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// Pulling the next id from the host failed
    #[error("Host error while pulling tasks: {0}")]
    Host(#[from] HostError),
}

/// Result type returned by task and timer callbacks
pub type TaskResult = Result<(), TaskError>;
