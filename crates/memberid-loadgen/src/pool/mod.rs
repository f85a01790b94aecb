//! Tokio worker pool driving registrations.
//!
//! - [`manager`] - round-robin dispatch and graceful shutdown.
//! - [`worker`] - the per-task receive loop.

mod error;
mod manager;
mod request;
mod worker;

pub use error::PoolError;
pub use manager::WorkerPool;
pub use request::WorkRequest;
pub use worker::{SharedService, worker_loop};
