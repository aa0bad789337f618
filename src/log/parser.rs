use std::collections::HashMap;

use crate::log::{
    classify::classify_line,
    entry::{Entry, QueryEntry, Request},
};

/// Classify every line of a batch, dropping blank and discarded lines.
pub fn parse_lines<I, S>(lines: I) -> Vec<Entry>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| classify_line(line.as_ref()))
        .collect()
}

/// Rebuild requests from one batch of entries.
///
/// Groups keep the order in which their request id first appeared. A group
/// without a request line is dropped; when an id carries several request lines
/// the first one wins and the rest are ignored.
pub fn group_by_request(entries: Vec<Entry>) -> Vec<Request> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, (Option<Request>, Vec<Entry>)> = HashMap::new();

    for entry in entries {
        let id = entry.request_id().to_string();
        let group = groups.entry(id.clone()).or_insert_with(|| {
            order.push(id);
            (None, Vec::new())
        });
        match entry {
            Entry::Request(request) => {
                if group.0.is_none() {
                    group.0 = Some(*request);
                } else {
                    log::debug!("ignoring repeated request line for {}", request.request_id());
                }
            }
            other => group.1.push(other),
        }
    }

    let mut requests: Vec<Request> = order
        .into_iter()
        .filter_map(|id| groups.remove(&id))
        .filter_map(|(request, mut related)| {
            let mut request = request?;
            related.sort_by_key(Entry::timestamp);
            request.related_logs = related;
            Some(request)
        })
        .collect();
    requests.sort_by_key(Request::timestamp);
    requests
}

/// The grouped requests of one parse batch, each carrying its related logs.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    entries: Vec<Entry>,
}

impl Collection {
    pub fn parse<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let flat = parse_lines(lines);
        let entries = group_by_request(flat)
            .into_iter()
            .map(|request| Entry::Request(Box::new(request)))
            .collect();
        Self { entries }
    }

    pub fn parse_str(text: &str) -> Self {
        Self::parse(text.lines())
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Requests ascending by timestamp.
    pub fn requests(&self) -> Vec<&Request> {
        let mut requests: Vec<&Request> = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                Entry::Request(request) => Some(request.as_ref()),
                _ => None,
            })
            .collect();
        requests.sort_by_key(|r| r.timestamp());
        requests
    }

    pub fn into_requests(self) -> Vec<Request> {
        let mut requests: Vec<Request> = self
            .entries
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Request(request) => Some(*request),
                _ => None,
            })
            .collect();
        requests.sort_by_key(Request::timestamp);
        requests
    }

    pub fn queries(&self) -> Vec<&QueryEntry> {
        self.requests()
            .into_iter()
            .flat_map(|request| request.queries())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::entry::{EntryKind, QueryOperation};

    const SELECT_BATCH: &str = r#"{"method":"GET","path":"/users","status":200,"duration":45.2,"controller":"UsersController","action":"index","request_id":"abc123","timestamp":"2025-01-01T10:00:00Z"}
{"message":"  \u001b[1m\u001b[36mUser Load (1.2ms)\u001b[0m  \u001b[1m\u001b[34mSELECT `users`.* FROM `users` WHERE `users`.`id` = 1 LIMIT 1\u001b[0m","request_id":"abc123","timestamp":"2025-01-01T10:00:01Z"}"#;

    #[test]
    fn test_select_scenario() {
        let collection = Collection::parse_str(SELECT_BATCH);
        let requests = collection.requests();
        assert_eq!(requests.len(), 1);
        let request = requests[0];
        assert_eq!(request.related_logs.len(), 1);
        assert_eq!(request.query_count(), 1);
        assert_eq!(request.total_query_time(), 1.2);
        assert_eq!(request.cached_query_count(), 0);
        assert_eq!(request.query_stats().select, 1);
    }

    #[test]
    fn test_cache_scenario() {
        let batch = r#"{"method":"GET","path":"/users","status":200,"request_id":"c1","timestamp":"2025-01-01T10:00:00Z"}
{"message":"CACHE User Load (0.1ms)  SELECT `users`.* FROM `users`","request_id":"c1","timestamp":"2025-01-01T10:00:01Z"}"#;
        let collection = Collection::parse_str(batch);
        let request = collection.requests()[0];
        assert_eq!(request.query_count(), 1);
        assert_eq!(request.cached_query_count(), 1);
        assert_eq!(request.total_query_time(), 0.1);
        assert_eq!(collection.queries().len(), 1);
    }

    #[test]
    fn test_related_logs_sorted_by_timestamp() {
        let batch = [
            r#"{"request_id":"r","message":"third","timestamp":"2025-01-01T10:00:03Z"}"#,
            r#"{"method":"POST","path":"/a","status":201,"request_id":"r","timestamp":"2025-01-01T10:00:04Z"}"#,
            r#"{"request_id":"r","message":"first","timestamp":"2025-01-01T10:00:01Z"}"#,
            r#"{"request_id":"r","message":"second","timestamp":"2025-01-01T10:00:02Z"}"#,
        ];
        let requests = Collection::parse(batch).into_requests();
        let contents: Vec<&str> = requests[0].related_logs.iter().map(Entry::content).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
        assert!(requests[0]
            .related_logs
            .iter()
            .all(|e| e.kind() == EntryKind::Other));
    }

    #[test]
    fn test_groups_without_request_are_dropped() {
        let batch = [
            r#"{"request_id":"orphan","message":"SELECT 1"}"#,
            r#"{"message":"no id"}"#,
            r#"{"method":"GET","path":"/","status":200,"request_id":"ok","timestamp":"2025-01-01T10:00:00Z"}"#,
        ];
        let collection = Collection::parse(batch);
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.requests()[0].request_id(), "ok");
    }

    #[test]
    fn test_first_request_wins_for_repeated_id() {
        let batch = [
            r#"{"method":"GET","path":"/first","status":200,"request_id":"dup","timestamp":"2025-01-01T10:00:00Z"}"#,
            r#"{"method":"GET","path":"/second","status":200,"request_id":"dup","timestamp":"2025-01-01T10:00:01Z"}"#,
        ];
        let requests = Collection::parse(batch).into_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "/first");
    }

    #[test]
    fn test_requests_sorted_by_timestamp() {
        let batch = [
            r#"{"method":"GET","path":"/late","status":200,"request_id":"b","timestamp":"2025-01-01T10:00:05Z"}"#,
            r#"{"method":"GET","path":"/early","status":200,"request_id":"a","timestamp":"2025-01-01T10:00:00Z"}"#,
        ];
        let paths: Vec<String> = Collection::parse(batch)
            .into_requests()
            .into_iter()
            .map(|r| r.path)
            .collect();
        assert_eq!(paths, vec!["/early", "/late"]);
    }

    #[test]
    fn test_mixed_operations_counted() {
        let batch = [
            r#"{"method":"POST","path":"/orders","status":302,"request_id":"m","timestamp":"2025-01-01T10:00:00Z"}"#,
            r#"{"request_id":"m","message":"TRANSACTION (0.1ms)  BEGIN","timestamp":"2025-01-01T10:00:01Z"}"#,
            r#"{"request_id":"m","message":"Order Create (2.0ms)  INSERT INTO `orders`","timestamp":"2025-01-01T10:00:02Z"}"#,
            r#"{"request_id":"m","message":"TRANSACTION (0.4ms)  COMMIT","timestamp":"2025-01-01T10:00:03Z"}"#,
            r#"{"request_id":"m","message":"Redirected to /orders/1","timestamp":"2025-01-01T10:00:04Z"}"#,
        ];
        let requests = Collection::parse(batch).into_requests();
        let stats = requests[0].query_stats();
        assert_eq!(stats.total_queries, 3);
        assert_eq!(stats.insert, 1);
        assert_eq!(stats.transaction, 2);
        assert!((stats.total_time_ms - 2.5).abs() < 1e-9);
        assert_eq!(
            stats.breakdown(),
            vec![(1, "INSERT"), (2, "TRANSACTION")]
        );
        let ops: Vec<QueryOperation> = requests[0].queries().map(|q| q.operation).collect();
        assert_eq!(ops[1], QueryOperation::Insert);
    }
}
