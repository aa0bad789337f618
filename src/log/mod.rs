pub mod classify;
pub mod entry;
pub mod parser;
pub mod source;
pub mod stats;

pub use classify::classify_line;
pub use entry::{CallLineEntry, Entry, EntryKind, EntryMeta, Params, QueryEntry, QueryOperation, Request};
pub use parser::{group_by_request, parse_lines, Collection};
pub use source::LogSource;
pub use stats::QueryStats;
