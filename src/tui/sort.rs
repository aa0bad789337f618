use std::cmp::Reverse;
use std::sync::Arc;

use strum::{Display, EnumIter, IntoEnumIterator};

use crate::log::entry::Request;

/// Request list ordering, cycled with `s`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "UPPERCASE")]
pub enum SortMode {
    #[default]
    Timestamp,
    /// Slowest first.
    Duration,
    Method,
    /// Highest status first.
    Status,
}

impl SortMode {
    pub fn cycle(self) -> Self {
        let modes: Vec<SortMode> = SortMode::iter().collect();
        let idx = modes.iter().position(|m| *m == self).unwrap_or(0);
        modes[(idx + 1) % modes.len()]
    }

    /// Stable sort; ties keep their incoming order.
    pub fn sort_requests(self, requests: &mut [Arc<Request>]) {
        match self {
            SortMode::Timestamp => requests.sort_by_key(|r| r.timestamp()),
            SortMode::Duration => requests.sort_by(|a, b| {
                let (a, b) = (a.duration_ms.unwrap_or(0.0), b.duration_ms.unwrap_or(0.0));
                b.total_cmp(&a)
            }),
            SortMode::Method => requests.sort_by(|a, b| a.method.cmp(&b.method)),
            SortMode::Status => requests.sort_by_key(|r| Reverse(r.status.unwrap_or(0))),
        }
    }
}
