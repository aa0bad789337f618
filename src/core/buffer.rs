//! Bounded window of parsed requests shared by the monitor and the UI.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::log::entry::Request;

pub const DEFAULT_RETENTION: usize = 1000;

pub type SharedBuffer = Arc<RwLock<RequestBuffer>>;

/// Requests in arrival order, holding at most `retention` of them.
#[derive(Debug)]
pub struct RequestBuffer {
    requests: Vec<Arc<Request>>,
    retention: usize,
    generation: u64,
}

impl RequestBuffer {
    pub fn new(retention: usize) -> Self {
        Self {
            requests: Vec::new(),
            retention: retention.max(1),
            generation: 0,
        }
    }

    pub fn shared(retention: usize) -> SharedBuffer {
        Arc::new(RwLock::new(Self::new(retention)))
    }

    /// Append one batch and drop the oldest requests beyond the retention
    /// bound. Returns how many were dropped.
    pub fn append_and_trim(&mut self, batch: Vec<Request>) -> usize {
        if batch.is_empty() {
            return 0;
        }
        self.requests.extend(batch.into_iter().map(Arc::new));
        self.generation += 1;

        // Trim oldest entries if we exceed the max
        if self.requests.len() > self.retention {
            let excess = self.requests.len() - self.retention;
            self.requests.drain(0..excess);
            return excess;
        }
        0
    }

    /// Cheap copy of the current window; requests are shared, not cloned.
    pub fn snapshot(&self) -> Vec<Arc<Request>> {
        self.requests.clone()
    }

    /// Bumped on every change, so readers can skip unchanged snapshots.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

impl Default for RequestBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::parser::Collection;

    fn batch(ids: std::ops::Range<usize>) -> Vec<Request> {
        let lines: Vec<String> = ids
            .map(|i| {
                format!(
                    r#"{{"method":"GET","path":"/r/{i}","status":200,"request_id":"id-{i}","timestamp":"2025-01-01T10:00:00Z"}}"#
                )
            })
            .collect();
        Collection::parse(lines).into_requests()
    }

    #[test]
    fn test_retention_drops_oldest_first() {
        let mut buffer = RequestBuffer::new(5);
        assert_eq!(buffer.append_and_trim(batch(0..3)), 0);
        assert_eq!(buffer.append_and_trim(batch(3..8)), 3);
        assert_eq!(buffer.len(), 5);

        let paths: Vec<String> = buffer.snapshot().iter().map(|r| r.path.clone()).collect();
        assert_eq!(paths, vec!["/r/3", "/r/4", "/r/5", "/r/6", "/r/7"]);
    }

    #[test]
    fn test_default_bound_is_one_thousand() {
        let mut buffer = RequestBuffer::default();
        buffer.append_and_trim(batch(0..1200));
        assert_eq!(buffer.len(), DEFAULT_RETENTION);
        assert_eq!(buffer.snapshot()[0].path, "/r/200");
    }

    #[test]
    fn test_generation_only_moves_on_change() {
        let mut buffer = RequestBuffer::new(10);
        assert_eq!(buffer.generation(), 0);
        buffer.append_and_trim(Vec::new());
        assert_eq!(buffer.generation(), 0);
        buffer.append_and_trim(batch(0..1));
        assert_eq!(buffer.generation(), 1);
    }

    #[test]
    fn test_zero_retention_keeps_newest_request() {
        let mut buffer = RequestBuffer::new(0);
        assert_eq!(buffer.retention(), 1);
        assert_eq!(buffer.append_and_trim(batch(0..3)), 2);
        assert_eq!(buffer.snapshot()[0].path, "/r/2");
    }
}
