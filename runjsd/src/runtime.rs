//! # Host Runtime
//!
//! Starts the workers, waits for them, and collects their reports.

use crate::config::HostRuntimeConfig;
use crate::workload::Workload;
use core_types::WorkerId;
use host_api::{ContextDescriptor, HostApi, HostError};
use services_logger::LogLevel;
use services_task_dispatch::{DispatchError, DrainReport, RegistryError, WorkerContext};
use sim_host::SimHost;
use std::sync::Arc;
use std::thread;
use thiserror::Error;

/// Host runtime error types
#[derive(Debug, Error)]
pub enum HostRuntimeError {
    #[error("Invalid worker count {requested} (expected 1..={max})")]
    InvalidWorkerCount { requested: usize, max: usize },

    #[error("Host error: {0}")]
    Host(#[from] HostError),

    #[error("Workload registration failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("Dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Worker {0} panicked")]
    WorkerPanicked(WorkerId),
}

/// What one worker did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSummary {
    pub worker_id: WorkerId,
    pub registered: usize,
    pub report: DrainReport,
}

/// Outcome of a whole run
#[derive(Debug, Default)]
pub struct RuntimeReport {
    /// Workers that drained their queue, in start order
    pub finished: Vec<WorkerSummary>,
    /// Workers that stopped with an error
    pub errors: Vec<(WorkerId, HostRuntimeError)>,
}

impl RuntimeReport {
    /// Total number of callbacks that ran across workers
    pub fn tasks_run(&self) -> usize {
        self.finished.iter().map(|w| w.report.ran()).sum()
    }

    /// Returns true when every worker finished and no task failed
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.finished.iter().all(|w| w.report.failed.is_empty())
    }
}

/// Host runtime
pub struct HostRuntime {
    config: HostRuntimeConfig,
    host: Arc<SimHost>,
}

impl HostRuntime {
    /// Creates a new host runtime
    pub fn new(config: HostRuntimeConfig) -> Result<Self, HostRuntimeError> {
        if config.workers == 0 || config.workers > config.max_workers {
            return Err(HostRuntimeError::InvalidWorkerCount {
                requested: config.workers,
                max: config.max_workers,
            });
        }

        let mut host = SimHost::new().with_echo(config.echo_output);
        if let Some(root) = &config.disk_root {
            host = host.with_disk_root(root.clone());
        }

        Ok(Self {
            config,
            host: Arc::new(host),
        })
    }

    /// Returns the shared host
    pub fn host(&self) -> &Arc<SimHost> {
        &self.host
    }

    pub fn config(&self) -> &HostRuntimeConfig {
        &self.config
    }

    /// Runs every worker to completion on its own thread
    pub fn run(&self) -> RuntimeReport {
        let mut handles = Vec::with_capacity(self.config.workers);
        for index in 0..self.config.workers {
            let worker_id = WorkerId::new();
            let host = Arc::clone(&self.host);
            let workload = self.config.workload.clone();
            let log_level = self.config.log_level;
            let handle = thread::spawn(move || {
                run_worker(host, index, worker_id, &workload, log_level)
            });
            handles.push((worker_id, handle));
        }

        let mut report = RuntimeReport::default();
        for (worker_id, handle) in handles {
            let outcome = handle
                .join()
                .unwrap_or_else(|_| Err(HostRuntimeError::WorkerPanicked(worker_id)));
            match outcome {
                Ok(summary) => {
                    self.host
                        .print(&format!("worker {worker_id} finished\n"), false);
                    report.finished.push(summary);
                }
                Err(e) => {
                    self.host.print(&format!("worker error: {e}\n"), true);
                    report.errors.push((worker_id, e));
                }
            }
        }
        report
    }
}

fn run_worker(
    host: Arc<SimHost>,
    index: usize,
    worker_id: WorkerId,
    workload: &Workload,
    log_level: LogLevel,
) -> Result<WorkerSummary, HostRuntimeError> {
    let descriptor = ContextDescriptor::new(format!("worker-{index}")).with_worker_id(worker_id);
    let mut ctx = WorkerContext::spawn(host, descriptor)?.with_log_threshold(log_level);
    let registered = workload.install(&mut ctx)?;
    let report = ctx.drain()?;
    Ok(WorkerSummary {
        worker_id,
        registered,
        report,
    })
}
