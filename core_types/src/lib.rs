//! # Core Types
//!
//! This crate defines the identifiers shared by the host, the op bridge and
//! the task dispatch services.
//!
//! ## Philosophy
//!
//! - **Opaque over structured**: A task id is a token, never parsed.
//! - **Explicit identity**: Worker identity is a value handed out by the
//!   host, not ambient global state.
//!
//! ## Key Types
//!
//! - [`TaskId`]: Opaque token naming one unit of registered work
//! - [`WorkerId`]: Identity of one worker context
//! - [`ContextId`]: Host-side handle of one isolated script context

pub mod ids;

pub use ids::{ContextId, TaskId, WorkerId};
