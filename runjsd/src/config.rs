//! Host runtime configuration

use crate::workload::Workload;
use services_logger::LogLevel;
use std::path::PathBuf;
use std::thread;

/// Upper bound on concurrently running workers
pub const MAX_WORKERS: usize = 4;

/// Worker count used when none is configured
///
/// The machine's available parallelism, capped at [`MAX_WORKERS`].
pub fn default_worker_count() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_WORKERS)
}

/// Host runtime configuration
#[derive(Debug, Clone)]
pub struct HostRuntimeConfig {
    /// Number of worker threads to start
    pub workers: usize,
    /// Largest accepted value for `workers`
    pub max_workers: usize,
    /// Tasks every worker registers
    pub workload: Workload,
    /// Whether printed lines also go to the process stdout/stderr
    pub echo_output: bool,
    /// Directory backing file ops; in-memory when unset
    pub disk_root: Option<PathBuf>,
    /// Lowest level a worker prints its log entries at
    pub log_level: LogLevel,
}

impl Default for HostRuntimeConfig {
    fn default() -> Self {
        Self {
            workers: default_worker_count(),
            max_workers: MAX_WORKERS,
            workload: Workload::default(),
            echo_output: true,
            disk_root: None,
            log_level: LogLevel::Warn,
        }
    }
}

impl HostRuntimeConfig {
    /// Configuration that keeps output inside the host only
    pub fn quiet(workers: usize) -> Self {
        Self {
            workers,
            echo_output: false,
            ..Self::default()
        }
    }
}
