//! Host error types

use core_types::{ContextId, TaskId};
use thiserror::Error;

/// Errors that can occur when calling into the host
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    /// File system operation failed
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// File does not exist
    #[error("File not found: {0}")]
    NotFound(String),

    /// Network fetch failed
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    /// Task id is already queued for this context
    #[error("Task already queued: {0}")]
    DuplicateTask(TaskId),

    /// Context was never spawned on this host
    #[error("Unknown context: {0}")]
    UnknownContext(ContextId),

    /// The host dropped the operation without completing it
    #[error("Operation cancelled before completion")]
    Cancelled,
}

impl HostError {
    /// Builds an I/O error from a std error and the path it concerns
    pub fn io(path: impl Into<String>, err: &std::io::Error) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            HostError::NotFound(path)
        } else {
            HostError::Io {
                path,
                message: err.to_string(),
            }
        }
    }
}
