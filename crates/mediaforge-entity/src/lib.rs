//! Domain entity models and enums for Mediaforge.

pub mod processing;
pub mod task;

pub use processing::ProcessingConfig;
pub use task::model::{NewTask, Task, TaskErrorInfo};
pub use task::source::TaskSource;
pub use task::status::{TaskKind, TaskStatus};
