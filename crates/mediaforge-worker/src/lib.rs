//! Task worker for Mediaforge.
//!
//! This crate provides:
//! - A queue store abstraction with the PostgreSQL-backed implementation
//! - The resource guard bounding concurrent CPU-heavy work and disk use
//! - The per-attempt workspace with guaranteed cleanup
//! - The phase-orchestrating task processor
//! - The claim-loop worker runner and the maintenance scheduler

pub mod bootstrap;
pub mod guard;
pub mod processor;
pub mod queue;
pub mod runner;
pub mod scheduler;
pub mod sink;
pub mod spool;
pub mod workspace;

pub use guard::ResourceGuard;
pub use processor::TaskProcessor;
pub use queue::{PgQueueStore, QueueStore};
pub use runner::WorkerRunner;
pub use scheduler::MaintenanceScheduler;
pub use workspace::TaskWorkspace;
