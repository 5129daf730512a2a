//! # Workload Manifest
//!
//! Describes which tasks every worker registers.
//!
//! ## Format
//!
//! A JSON object; missing fields take their default:
//!
//! ```text
//! {
//!   "main_tasks": ["alpha", "beta"],   # task families
//!   "sub_tasks": 2,                    # ids per family: alpha-0, alpha-1
//!   "delay_ms": 0                      # sleep before each task prints
//! }
//! ```

use core_types::TaskId;
use host_api::{Duration, HostApi};
use serde::{Deserialize, Serialize};
use services_console::console_args;
use services_task_dispatch::{RegistryError, WorkerContext};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Workload error types
#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("Failed to read workload {path}: {message}")]
    Io { path: String, message: String },

    #[error("Invalid workload manifest: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid task name: {0:?}")]
    InvalidTaskName(String),
}

/// Tasks a worker registers before draining
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Workload {
    pub main_tasks: Vec<String>,
    pub sub_tasks: usize,
    pub delay_ms: u64,
}

impl Default for Workload {
    fn default() -> Self {
        Self {
            main_tasks: vec!["alpha".to_string(), "beta".to_string()],
            sub_tasks: 2,
            delay_ms: 0,
        }
    }
}

impl Workload {
    /// Parses a manifest
    pub fn from_json(text: &str) -> Result<Self, WorkloadError> {
        let workload: Workload = serde_json::from_str(text)?;
        workload.validate()?;
        Ok(workload)
    }

    /// Reads and parses a manifest file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, WorkloadError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| WorkloadError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&text)
    }

    fn validate(&self) -> Result<(), WorkloadError> {
        for name in &self.main_tasks {
            if name.trim().is_empty() {
                return Err(WorkloadError::InvalidTaskName(name.clone()));
            }
        }
        Ok(())
    }

    /// Task ids in registration order: every sub task of the first family,
    /// then the next family
    pub fn task_ids(&self) -> Vec<TaskId> {
        self.main_tasks
            .iter()
            .flat_map(|main| {
                (0..self.sub_tasks).map(move |sub| TaskId::new(format!("{main}-{sub}")))
            })
            .collect()
    }

    /// Registers one printing task per id in `ctx`
    ///
    /// Returns the number of tasks registered.
    pub fn install<H: HostApi>(
        &self,
        ctx: &mut WorkerContext<H>,
    ) -> Result<usize, RegistryError> {
        let delay = Duration::from_millis(self.delay_ms);
        let ids = self.task_ids();
        for id in &ids {
            let task = id.clone();
            ctx.register(id.clone(), move |scope| {
                if delay != Duration::ZERO {
                    scope.wait(scope.ops().sleep(delay))?;
                }
                let line = format!("[worker {}] performing task {}", scope.identity(), task);
                scope.console().log(&console_args!(line));
                Ok(())
            })?;
        }
        Ok(ids.len())
    }
}
