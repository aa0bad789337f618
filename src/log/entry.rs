use chrono::{DateTime, Utc};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumIter};

use crate::log::stats::QueryStats;

/// Discriminant of [`Entry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum EntryKind {
    Request,
    Query,
    CallLine,
    Other,
    Unknown,
}

/// Fields every classified line carries.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    /// The original line, trimmed.
    pub raw: String,
    /// The `message` text (colors kept), or the raw line when there is none.
    pub content: String,
}

/// One classified log line.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Request(Box<Request>),
    Query(QueryEntry),
    CallLine(CallLineEntry),
    Other(EntryMeta),
    Unknown(EntryMeta),
}

impl Entry {
    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::Request(_) => EntryKind::Request,
            Entry::Query(_) => EntryKind::Query,
            Entry::CallLine(_) => EntryKind::CallLine,
            Entry::Other(_) => EntryKind::Other,
            Entry::Unknown(_) => EntryKind::Unknown,
        }
    }

    pub fn meta(&self) -> &EntryMeta {
        match self {
            Entry::Request(req) => &req.meta,
            Entry::Query(q) => &q.meta,
            Entry::CallLine(c) => &c.meta,
            Entry::Other(meta) | Entry::Unknown(meta) => meta,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.meta().request_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.meta().timestamp
    }

    pub fn content(&self) -> &str {
        &self.meta().content
    }

    pub fn raw(&self) -> &str {
        &self.meta().raw
    }

    pub fn is_request(&self) -> bool {
        matches!(self, Entry::Request(_))
    }

    pub fn as_query(&self) -> Option<&QueryEntry> {
        match self {
            Entry::Query(q) => Some(q),
            _ => None,
        }
    }

    pub fn as_call_line(&self) -> Option<&CallLineEntry> {
        match self {
            Entry::CallLine(c) => Some(c),
            _ => None,
        }
    }
}

/// Request parameters as lograge wrote them.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    Structured(Value),
    /// A string payload that did not decode as JSON, kept verbatim.
    Raw(String),
}

/// One completed HTTP request and the lines logged while serving it.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub meta: EntryMeta,
    pub method: String,
    pub path: String,
    pub status: Option<u16>,
    pub duration_ms: Option<f64>,
    pub controller: Option<String>,
    pub action: Option<String>,
    pub params: Option<Params>,
    /// Non-request entries of the same parse batch, ascending by timestamp.
    ///
    /// Filled once when the batch is grouped. Lines for this request that
    /// arrive in a later tail batch are never attached here.
    pub related_logs: Vec<Entry>,
}

impl Request {
    pub fn request_id(&self) -> &str {
        &self.meta.request_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.meta.timestamp
    }

    pub fn queries(&self) -> impl Iterator<Item = &QueryEntry> {
        self.related_logs.iter().filter_map(Entry::as_query)
    }

    pub fn query_stats(&self) -> QueryStats {
        QueryStats::from_entries(&self.related_logs)
    }

    pub fn query_count(&self) -> usize {
        self.queries().count()
    }

    pub fn total_query_time(&self) -> f64 {
        self.queries().map(|q| q.duration_ms).sum()
    }

    pub fn cached_query_count(&self) -> usize {
        self.queries().filter(|q| q.cached).count()
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, Some(200..=299))
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self.status, Some(400..=499))
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self.status, Some(s) if s >= 500)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "UPPERCASE")]
pub enum QueryOperation {
    Select,
    Insert,
    Update,
    Delete,
    Transaction,
    Begin,
    Commit,
    Rollback,
    Savepoint,
    Unknown,
}

impl QueryOperation {
    /// Transaction control statements are summarised together.
    pub fn is_transaction_control(self) -> bool {
        matches!(
            self,
            QueryOperation::Transaction
                | QueryOperation::Begin
                | QueryOperation::Commit
                | QueryOperation::Rollback
                | QueryOperation::Savepoint
        )
    }
}

/// An SQL statement or a query-cache line.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryEntry {
    pub meta: EntryMeta,
    pub operation: QueryOperation,
    /// Timing text such as `1.2ms`.
    pub timing: Option<String>,
    pub duration_ms: f64,
    pub cached: bool,
}

impl QueryEntry {
    pub fn is_slow(&self, threshold_ms: f64) -> bool {
        self.duration_ms > threshold_ms
    }
}

/// The `↳ file:line:in 'method'` annotation Rails prints above a query.
#[derive(Debug, Clone, PartialEq)]
pub struct CallLineEntry {
    pub meta: EntryMeta,
    pub file_path: Option<String>,
    pub line_number: Option<u32>,
    pub method_name: Option<String>,
}
