//! # Host API
//!
//! This crate defines the interface between script-side code and the host
//! engine that runs it.
//!
//! ## Philosophy
//!
//! The host provides **primitives**, not policies:
//! - Context creation (with an explicit worker identity)
//! - File and network access (deferred, completed by the host)
//! - Time (virtual in simulated hosts)
//! - The authoritative per-context task queue
//!
//! ## Design Goals
//!
//! 1. **Testability**: The whole interface can be implemented in-process
//! 2. **Explicitness**: Every call names the context it acts for
//! 3. **Static dispatch**: Consumers are generic over [`HostApi`]
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - A script engine (no parsing, no evaluation)
//! - A persistent queue (the task queue lives and dies with the host)
//! - A priority scheduler (pull order is registration order)

pub mod deferred;
pub mod error;
pub mod host;
pub mod time;

pub use deferred::{deferred, Completer, Deferred};
pub use error::HostError;
pub use host::{ContextDescriptor, ContextHandle, FetchResponse, HostApi};
pub use time::{Duration, Instant};
