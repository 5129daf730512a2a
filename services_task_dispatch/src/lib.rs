//! # Task Dispatch Service
//!
//! Host-driven execution of named tasks inside worker contexts.
//!
//! ## Philosophy
//!
//! - **Host decides order**: the script side only registers, the host
//!   queue hands out ids
//! - **Exactly once**: a callback leaves the registry the moment it is
//!   dispatched, so repeated ids are skipped
//! - **One at a time**: a worker runs a single callback (and the timers it
//!   scheduled) before it pulls again
//! - **Explicit steps**: the dispatch loop is a state machine that tests
//!   can advance one transition at a time
//!
//! ## Example
//!
//! ```
//! use host_api::ContextDescriptor;
//! use core_types::WorkerId;
//! use services_task_dispatch::WorkerContext;
//! use sim_host::SimHost;
//! use std::sync::Arc;
//!
//! let host = Arc::new(SimHost::new());
//! let descriptor = ContextDescriptor::new("worker").with_worker_id(WorkerId::new());
//! let mut worker = WorkerContext::spawn(Arc::clone(&host), descriptor).unwrap();
//!
//! worker
//!     .register("greet", |scope| {
//!         scope.console().log(&services_console::console_args!("hello"));
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let report = worker.drain().unwrap();
//! assert_eq!(report.executed.len(), 1);
//! assert_eq!(host.stdout_lines(), vec!["[out]: \"hello\"\n".to_string()]);
//! ```

pub mod dispatch;
pub mod error;
pub mod identity;
pub mod registry;
pub mod worker;

pub use dispatch::{DispatchLoop, DispatchState, DrainReport};
pub use error::{DispatchError, RegistryError, TaskError, TaskResult};
pub use identity::WorkerIdentity;
pub use registry::TaskRegistry;
pub use worker::{TaskFn, TaskScope, WorkerContext};
