use crate::log::entry::{Entry, QueryOperation};

/// Aggregate query numbers for one request, derived from its related logs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QueryStats {
    pub total_queries: usize,
    pub total_time_ms: f64,
    pub cached_queries: usize,
    pub select: usize,
    pub insert: usize,
    pub update: usize,
    pub delete: usize,
    pub transaction: usize,
}

impl QueryStats {
    pub fn from_entries(entries: &[Entry]) -> Self {
        let mut stats = QueryStats::default();
        for entry in entries {
            match entry {
                Entry::Query(query) => {
                    stats.total_queries += 1;
                    stats.total_time_ms += query.duration_ms;
                    if query.cached {
                        stats.cached_queries += 1;
                    }
                    match query.operation {
                        QueryOperation::Select => stats.select += 1,
                        QueryOperation::Insert => stats.insert += 1,
                        QueryOperation::Update => stats.update += 1,
                        QueryOperation::Delete => stats.delete += 1,
                        op if op.is_transaction_control() => stats.transaction += 1,
                        _ => {}
                    }
                }
                Entry::Request(_) | Entry::CallLine(_) | Entry::Other(_) | Entry::Unknown(_) => {}
            }
        }
        stats
    }

    /// `(count, label)` pairs for the non-zero operation buckets.
    pub fn breakdown(&self) -> Vec<(usize, &'static str)> {
        [
            (self.select, "SELECT"),
            (self.insert, "INSERT"),
            (self.update, "UPDATE"),
            (self.delete, "DELETE"),
            (self.transaction, "TRANSACTION"),
        ]
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .collect()
    }
}
