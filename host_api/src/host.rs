//! Host API trait and context management types

use crate::{Deferred, Duration, HostError, Instant};
use core_types::{ContextId, TaskId, WorkerId};
use serde::{Deserialize, Serialize};

/// Descriptor for creating a new isolated script context
///
/// The worker identity is chosen here, at creation, and never changes for
/// the lifetime of the context. A context created without one is a
/// non-worker context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextDescriptor {
    /// Human-readable name for debugging
    pub name: String,
    /// Worker identity assigned to the context
    pub worker_id: Option<WorkerId>,
}

impl ContextDescriptor {
    /// Creates a descriptor for a non-worker context
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            worker_id: None,
        }
    }

    /// Assigns a worker identity to the context
    pub fn with_worker_id(mut self, worker_id: WorkerId) -> Self {
        self.worker_id = Some(worker_id);
        self
    }
}

/// Handle to a spawned context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextHandle {
    /// The context's unique identifier (keys its task queue)
    pub context_id: ContextId,
    /// Worker identity, if the context is a worker
    pub worker_id: Option<WorkerId>,
    /// Name from the descriptor
    pub name: String,
}

/// Response payload of a network fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResponse {
    /// The url that was fetched
    pub url: String,
    /// Status code reported by the remote end
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl FetchResponse {
    /// Returns true for 2xx status codes
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The host API trait
///
/// This is the fixed capability interface the script side is written
/// against. Implementations:
/// - Simulated host (in-process, deterministic, for tests and the demo)
/// - Embedding hosts that drive a real engine
///
/// # Calling conventions
///
/// **Synchronous** operations return `Result` and fail by returning
/// `Err`. **Asynchronous** operations return a [`Deferred`] that the host
/// resolves or rejects later; a rejection is an `Err` out of
/// [`Deferred::wait`].
///
/// # Task queue
///
/// The host owns one FIFO queue of task ids per context.
/// `register_task` appends, `get_next_task_id` pops. Several worker
/// threads call into the same host, so implementations synchronize the
/// queues internally.
pub trait HostApi: Send + Sync + 'static {
    /// Creates a new isolated context and its empty task queue
    fn spawn_context(&self, descriptor: ContextDescriptor) -> Result<ContextHandle, HostError>;

    /// Reads a whole file (async)
    fn read_file(&self, path: &str) -> Deferred<Vec<u8>>;

    /// Writes a whole file, replacing it (async)
    fn write_file(&self, path: &str, contents: Vec<u8>) -> Deferred<()>;

    /// Removes a file (sync)
    fn remove_file(&self, path: &str) -> Result<(), HostError>;

    /// Fetches a url (async)
    fn fetch(&self, url: &str) -> Deferred<FetchResponse>;

    /// Resolves once at least `delay` has elapsed (async)
    fn set_timeout(&self, delay: Duration) -> Deferred<()>;

    /// Writes one line to the host output channel
    ///
    /// Best effort: failures stay inside the host.
    fn print(&self, line: &str, is_error: bool);

    /// Informs the host that `task` is eligible for dispatch in `context`
    fn register_task(&self, context: ContextId, task: &TaskId) -> Result<(), HostError>;

    /// Pops the oldest eligible task id of `context`
    ///
    /// Returns `Ok(None)` once the queue is empty.
    fn get_next_task_id(&self, context: ContextId) -> Result<Option<TaskId>, HostError>;

    /// Custom diagnostic signal, fire-and-forget
    fn signal(&self, context: ContextId);

    /// Returns the current host time
    fn now(&self) -> Instant;

    /// Makes progress on pending asynchronous work without blocking
    ///
    /// Returns false when nothing is pending. Hosts backed by real threads
    /// may always return false and rely on [`Deferred::wait`].
    fn drive(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_descriptor_defaults_to_non_worker() {
        let descriptor = ContextDescriptor::new("setup");
        assert_eq!(descriptor.name, "setup");
        assert!(descriptor.worker_id.is_none());
    }

    #[test]
    fn test_context_descriptor_with_worker() {
        let worker = WorkerId::new();
        let descriptor = ContextDescriptor::new("w0").with_worker_id(worker);
        assert_eq!(descriptor.worker_id, Some(worker));
    }

    #[test]
    fn test_fetch_response_success_range() {
        let mut response = FetchResponse {
            url: "sim://a".to_string(),
            status: 200,
            body: String::new(),
        };
        assert!(response.is_success());
        response.status = 404;
        assert!(!response.is_success());
    }

    #[test]
    fn test_fetch_response_serializes() {
        let response = FetchResponse {
            url: "sim://a".to_string(),
            status: 201,
            body: "ok".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], 201);
        assert_eq!(json["body"], "ok");
    }
}
