//! Core traits, configuration, types, and error handling for Mediaforge.
//!
//! Every other crate in the workspace depends on this one. It defines:
//! - The unified [`error::AppError`] type and [`result::AppResult`] alias
//! - Configuration schemas loaded from TOML + environment
//! - The collaborator traits the pipeline is wired against (transport,
//!   download client, status sink)

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
