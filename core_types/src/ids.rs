//! Unique identifiers for system entities

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identifier for a unit of registered work
///
/// Task ids are chosen by script code, not by the host. They may be
/// strings or integers; integers are carried in their decimal form so the
/// host can compare any two ids without knowing where they came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a task id from any string-like token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for TaskId {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<u64> for TaskId {
    fn from(token: u64) -> Self {
        Self(token.to_string())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a worker context
///
/// Assigned by the host when a worker context is created. Task callbacks
/// read it for logging and coordination; nothing can change it afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerId(Uuid);

impl WorkerId {
    /// Creates a new random worker ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a worker ID from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Returns the first seven characters of the simple UUID form
    ///
    /// This is the form printed in console lines.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..7].to_string()
    }
}

impl Default for WorkerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short())
    }
}

/// Host-side handle of an isolated script context
///
/// Every context owns exactly one task queue on the host, whether or not
/// it was given a worker identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(Uuid);

impl ContextId {
    /// Creates a new random context ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Context({})", self.0)
    }
}
