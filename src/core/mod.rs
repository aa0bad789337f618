//! UI-independent runtime pieces: the shared request window and the task that
//! keeps it filled from the log file.

pub mod buffer;
pub mod monitor;
pub mod task_manager;

pub use buffer::{RequestBuffer, SharedBuffer};
pub use monitor::{Monitor, MonitorConfig, MonitorHandle};
