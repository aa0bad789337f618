//! Turns one raw JSON log line into exactly one typed [`Entry`].
//!
//! Lines that are not JSON objects, or that carry no `request_id`, cannot be
//! correlated with a request and are dropped here without raising an error.

use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use strum::IntoEnumIterator;

use crate::{
    log::entry::{CallLineEntry, Entry, EntryMeta, Params, QueryEntry, QueryOperation, Request},
    utils::ansi::strip_ansi,
};

pub const CACHE_MARKER: &str = "CACHE";
pub const CALL_LINE_MARKER: &str = "↳";

static TIMING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([0-9.]+)ms\)").expect("timing pattern is valid"));
static CALL_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"↳\s+(.+):(\d+):in\s+[`'](.+)'").expect("call line pattern is valid")
});

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Classify one line. `None` means the line is discarded.
pub fn classify_line(raw_line: &str) -> Option<Entry> {
    let raw = raw_line.trim();
    if raw.is_empty() {
        return None;
    }

    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            log::trace!("discarding non-JSON line: {err}");
            return None;
        }
    };
    let Value::Object(data) = value else {
        log::trace!("discarding JSON line that is not an object");
        return None;
    };
    let Some(request_id) = data.get("request_id").and_then(Value::as_str) else {
        log::trace!("discarding line without request_id");
        return None;
    };

    let message = data.get("message").and_then(Value::as_str);
    let meta = EntryMeta {
        request_id: request_id.to_string(),
        timestamp: parse_timestamp(data.get("timestamp").and_then(Value::as_str)),
        raw: raw.to_string(),
        content: message
            .map(|m| m.trim().to_string())
            .unwrap_or_else(|| raw.to_string()),
    };

    if is_request_line(&data) {
        return Some(Entry::Request(Box::new(build_request(meta, &data))));
    }

    let Some(message) = message else {
        return Some(Entry::Unknown(meta));
    };
    let clean = strip_ansi(message);

    if clean.contains(CACHE_MARKER) {
        return Some(Entry::Query(build_query(meta, &clean, true)));
    }
    if find_operation(&clean).is_some() {
        return Some(Entry::Query(build_query(meta, &clean, false)));
    }
    if clean.contains(CALL_LINE_MARKER) {
        return Some(Entry::CallLine(build_call_line(meta, &clean)));
    }
    Some(Entry::Other(meta))
}

fn present<'a>(data: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    data.get(key).filter(|v| !v.is_null() && *v != &Value::Bool(false))
}

fn is_request_line(data: &Map<String, Value>) -> bool {
    present(data, "method").is_some()
        && present(data, "path").is_some()
        && present(data, "status").is_some()
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn optional_string(data: &Map<String, Value>, key: &str) -> Option<String> {
    present(data, key).map(value_to_string)
}

fn build_request(meta: EntryMeta, data: &Map<String, Value>) -> Request {
    let status = present(data, "status").and_then(|v| match v {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    });
    let duration_ms = present(data, "duration").and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    });

    Request {
        meta,
        method: optional_string(data, "method").unwrap_or_default(),
        path: optional_string(data, "path").unwrap_or_default(),
        status,
        duration_ms,
        controller: optional_string(data, "controller"),
        action: optional_string(data, "action"),
        params: present(data, "params").map(parse_params),
        related_logs: Vec::new(),
    }
}

/// Structured payloads are kept as-is; strings are decoded when they hold
/// JSON and kept verbatim otherwise.
pub fn parse_params(value: &Value) -> Params {
    match value {
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(decoded) => Params::Structured(decoded),
            Err(_) => Params::Raw(text.clone()),
        },
        other => Params::Structured(other.clone()),
    }
}

/// First SQL keyword, in declaration order, contained in `text`.
pub fn find_operation(text: &str) -> Option<QueryOperation> {
    QueryOperation::iter()
        .filter(|op| *op != QueryOperation::Unknown)
        .find(|op| text.contains(op.as_ref()))
}

fn build_query(meta: EntryMeta, clean: &str, cached: bool) -> QueryEntry {
    let timing = TIMING
        .captures(clean)
        .and_then(|caps| caps.get(1))
        .map(|m| format!("{}ms", m.as_str()));
    let duration_ms = timing
        .as_deref()
        .and_then(|t| t.trim_end_matches("ms").parse::<f64>().ok())
        .unwrap_or(0.0);

    QueryEntry {
        meta,
        operation: find_operation(clean).unwrap_or(QueryOperation::Unknown),
        timing,
        duration_ms,
        cached,
    }
}

fn build_call_line(meta: EntryMeta, clean: &str) -> CallLineEntry {
    let caps = CALL_LINE.captures(clean);
    let group = |idx: usize| {
        caps.as_ref()
            .and_then(|c| c.get(idx))
            .map(|m| m.as_str().to_string())
    };

    CallLineEntry {
        file_path: group(1),
        line_number: group(2).and_then(|n| n.parse().ok()),
        method_name: group(3),
        meta,
    }
}

/// ISO-8601 timestamp, or the current time when missing or malformed.
pub fn parse_timestamp(value: Option<&str>) -> DateTime<Utc> {
    value
        .map(str::trim)
        .and_then(|s| {
            DateTime::parse_from_rfc3339(s)
                .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f %z"))
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NAIVE_FORMATS
                        .iter()
                        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                        .map(|naive| naive.and_utc())
                })
        })
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::entry::EntryKind;
    use chrono::TimeZone;

    #[test]
    fn test_request_line() {
        let line = r#"{"method":"GET","path":"/users","status":200,"duration":45.2,"controller":"UsersController","action":"index","request_id":"abc123","timestamp":"2025-01-01T10:00:00Z"}"#;
        let Some(Entry::Request(req)) = classify_line(line) else {
            panic!("expected a request");
        };
        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/users");
        assert_eq!(req.status, Some(200));
        assert_eq!(req.duration_ms, Some(45.2));
        assert_eq!(req.controller.as_deref(), Some("UsersController"));
        assert_eq!(req.action.as_deref(), Some("index"));
        assert_eq!(
            req.timestamp(),
            Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_discards_lines_without_request_id() {
        assert!(classify_line(r#"{"message":"SELECT 1"}"#).is_none());
        assert!(classify_line("not json at all").is_none());
        assert!(classify_line(r#"["request_id"]"#).is_none());
        assert!(classify_line("").is_none());
    }

    #[test]
    fn test_cache_line_wins_over_sql() {
        let line = r#"{"request_id":"a","message":"CACHE User Load (0.1ms)  SELECT `users`.* FROM `users`","timestamp":"2025-01-01T10:00:01Z"}"#;
        let entry = classify_line(line).unwrap();
        let query = entry.as_query().unwrap();
        assert!(query.cached);
        assert_eq!(query.duration_ms, 0.1);
        assert_eq!(query.timing.as_deref(), Some("0.1ms"));
        assert_eq!(query.operation, QueryOperation::Select);
    }

    #[test]
    fn test_colored_sql_line() {
        let line = r#"{"message":"  \u001b[1m\u001b[36mUser Load (1.2ms)\u001b[0m  \u001b[1m\u001b[34mSELECT `users`.* FROM `users` WHERE `users`.`id` = 1 LIMIT 1\u001b[0m","request_id":"abc123","timestamp":"2025-01-01T10:00:01Z"}"#;
        let entry = classify_line(line).unwrap();
        assert_eq!(entry.kind(), EntryKind::Query);
        let query = entry.as_query().unwrap();
        assert!(!query.cached);
        assert_eq!(query.duration_ms, 1.2);
        assert!(entry.content().starts_with("\u{1b}[1m"));
    }

    #[test]
    fn test_transaction_keywords() {
        let line = r#"{"request_id":"a","message":"TRANSACTION (0.3ms)  BEGIN"}"#;
        let entry = classify_line(line).unwrap();
        assert_eq!(entry.as_query().unwrap().operation, QueryOperation::Transaction);

        let line = r#"{"request_id":"a","message":"ROLLBACK"}"#;
        let entry = classify_line(line).unwrap();
        assert_eq!(entry.as_query().unwrap().operation, QueryOperation::Rollback);
        assert_eq!(entry.as_query().unwrap().duration_ms, 0.0);
    }

    #[test]
    fn test_call_line() {
        let line = r#"{"request_id":"a","message":"  ↳ app/controllers/users_controller.rb:10:in 'UsersController#show'"}"#;
        let entry = classify_line(line).unwrap();
        let call = entry.as_call_line().unwrap();
        assert_eq!(
            call.file_path.as_deref(),
            Some("app/controllers/users_controller.rb")
        );
        assert_eq!(call.line_number, Some(10));
        assert_eq!(call.method_name.as_deref(), Some("UsersController#show"));
    }

    #[test]
    fn test_other_and_unknown() {
        let other = classify_line(r#"{"request_id":"a","message":"Rendered users/index.html.erb"}"#);
        assert_eq!(other.unwrap().kind(), EntryKind::Other);

        let unknown = classify_line(r#"{"request_id":"a","level":"info"}"#).unwrap();
        assert_eq!(unknown.kind(), EntryKind::Unknown);
        assert_eq!(unknown.content(), unknown.raw());
    }

    #[test]
    fn test_params_variants() {
        let hash = serde_json::json!({"id": "1"});
        assert_eq!(parse_params(&hash), Params::Structured(hash.clone()));

        let encoded = Value::String(r#"{"id":"5"}"#.to_string());
        assert_eq!(
            parse_params(&encoded),
            Params::Structured(serde_json::json!({"id": "5"}))
        );

        let broken = Value::String("{invalid json".to_string());
        assert_eq!(parse_params(&broken), Params::Raw("{invalid json".to_string()));
    }

    #[test]
    fn test_timestamp_fallback() {
        let before = Utc::now();
        let ts = parse_timestamp(Some("yesterday-ish"));
        assert!(ts >= before);
        assert_eq!(
            parse_timestamp(Some("2025-01-01 10:00:00")),
            Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap()
        );
    }
}
