//! Source acquisition: resolves a task's source to a local file.
//!
//! A source is either a remote URL (fetched through a swappable
//! [`mediaforge_core::traits::download::DownloadClient`]) or a file held by
//! the messaging transport. Acquisition is idempotent per destination path
//! and reports throttled progress.

pub mod acquirer;
pub mod http;
pub mod progress;

pub use acquirer::SourceAcquirer;
pub use http::HttpDownloadClient;
pub use progress::ProgressThrottle;
