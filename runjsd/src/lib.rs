//! # runjs Host Runtime
//!
//! Runs a task workload on several worker threads against one shared host.
//!
//! ## Philosophy
//!
//! - **Host owns I/O**: workers print only through the host
//! - **Host owns order**: every worker drains its own host queue
//! - **Deterministic mode is first-class**: the host is simulated, so the
//!   same workload always produces the same lines per worker
//!
//! ## Responsibilities
//!
//! The runtime:
//! - Picks the worker count (bounded by [`MAX_WORKERS`])
//! - Gives every worker a fresh identity and context
//! - Installs the workload in each worker and drains it
//! - Reports per-worker completion and errors
//!
//! ## Non-Responsibilities
//!
//! The runtime does NOT:
//! - Balance tasks across workers (each worker runs its own copy)
//! - Retry failed tasks
//! - Parse script source code

pub mod config;
pub mod runtime;
pub mod workload;

pub use config::{default_worker_count, HostRuntimeConfig, MAX_WORKERS};
pub use runtime::{HostRuntime, HostRuntimeError, RuntimeReport, WorkerSummary};
pub use workload::{Workload, WorkloadError};
