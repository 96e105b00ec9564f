//! Staging storage for finished artifacts.
//!
//! Staging is the optional, best-effort copy of a finished artifact to a
//! secondary location. It is never on the critical path: a staging failure
//! degrades to a warning and the pipeline continues to egress.

pub mod local;
pub mod provider;
pub mod staging;

pub use local::LocalStorageProvider;
pub use provider::StorageProvider;
pub use staging::StagingService;
