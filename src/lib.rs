//! LogBench: a live terminal viewer for Rails JSON logs.
//!
//! Lines are classified into requests, SQL queries, call-site lines and other
//! messages, then grouped by `request_id`. A background monitor tails the log
//! file into a bounded shared buffer which the TUI renders as a request list
//! and a detail pane.

#[doc(hidden)]
pub mod boot;
#[doc(hidden)]
pub mod cli;
pub mod core;
pub mod log;
pub mod tui;
pub mod utils;
