// SPDX-License-Identifier: Apache-2.0

//! Encoding of [`DeliveryRecord`]s into the Wavefront tracing line protocol.
//!
//! One span becomes a single newline-terminated line:
//!
//! ```text
//! "name" source="host" traceId=<uuid> spanId=<uuid> parent=<uuid> "k"="v" <start_ms> <duration_ms>
//! ```
//!
//! Spans that carry logs additionally produce a companion JSON document for
//! the spanLogs ingestion path, and are tagged `_spanLogs=true` so the
//! backend knows to look for it.

use crate::record::{DeliveryRecord, SpanLog};
use gethostname::gethostname;
use serde::Serialize;
use std::fmt::Write;
use uuid::Uuid;

/// Tag signalling that a spanLogs payload accompanies this span.
const SPAN_LOGS_TAG: &str = "_spanLogs";

#[derive(Serialize)]
struct SpanLogsPayload<'a> {
    #[serde(rename = "traceId")]
    trace_id: Uuid,
    #[serde(rename = "spanId")]
    span_id: Uuid,
    logs: &'a [SpanLog],
}

/// Resolves the origin host to report when a record does not carry one.
pub(crate) fn default_source() -> String {
    gethostname()
        .into_string()
        .unwrap_or_else(|_| "unknown".to_string())
}

fn sanitize(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\n' | '\r' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

/// Encodes one span into its line-protocol representation, newline included.
pub(crate) fn span_line(record: &DeliveryRecord, default_source: &str) -> String {
    let source = record.source.as_deref().unwrap_or(default_source);

    let mut line = String::with_capacity(128);
    let _ = write!(
        line,
        "\"{}\" source=\"{}\" traceId={} spanId={}",
        sanitize(&record.name),
        sanitize(source),
        record.trace_id,
        record.span_id,
    );
    for parent in &record.parents {
        let _ = write!(line, " parent={parent}");
    }
    for follows in &record.follows_from {
        let _ = write!(line, " followsFrom={follows}");
    }
    for (key, value) in &record.tags {
        let _ = write!(line, " \"{}\"=\"{}\"", sanitize(key), sanitize(value));
    }
    if !record.span_logs.is_empty() {
        let _ = write!(line, " \"{SPAN_LOGS_TAG}\"=\"true\"");
    }
    let _ = write!(line, " {} {}\n", record.start_ms, record.duration_ms);
    line
}

/// Encodes a span's logs into the spanLogs JSON payload, newline-terminated.
/// Returns `None` when the span has no logs.
pub(crate) fn span_logs_json(record: &DeliveryRecord) -> Option<String> {
    if record.span_logs.is_empty() {
        return None;
    }
    let payload = SpanLogsPayload {
        trace_id: record.trace_id,
        span_id: record.span_id,
        logs: &record.span_logs,
    };
    match serde_json::to_string(&payload) {
        Ok(mut json) => {
            json.push('\n');
            Some(json)
        }
        Err(err) => {
            tracing::warn!("Failed to serialize span logs, dropping them: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{span_line, span_logs_json};
    use crate::record::{DeliveryRecord, SpanLog};
    use std::collections::HashMap;
    use uuid::Uuid;

    fn test_record() -> DeliveryRecord {
        DeliveryRecord {
            name: "get.users".to_string(),
            start_ms: 1_700_000_000_123,
            duration_ms: 42,
            source: Some("web-1".to_string()),
            trace_id: Uuid::from_u64_pair(0x0123456789abcdef, 0),
            span_id: Uuid::from_u64_pair(0, 0x1111111111111111),
            parents: vec![Uuid::from_u64_pair(0, 0x2222222222222222)],
            follows_from: vec![],
            tags: vec![
                ("application".to_string(), "shop".to_string()),
                ("service".to_string(), "users".to_string()),
            ],
            span_logs: vec![],
        }
    }

    #[test]
    fn line_format() {
        let line = span_line(&test_record(), "fallback");
        assert_eq!(
            line,
            "\"get.users\" source=\"web-1\" \
             traceId=01234567-89ab-cdef-0000-000000000000 \
             spanId=00000000-0000-0000-1111-111111111111 \
             parent=00000000-0000-0000-2222-222222222222 \
             \"application\"=\"shop\" \"service\"=\"users\" \
             1700000000123 42\n"
        );
    }

    #[test]
    fn default_source_used_when_record_has_none() {
        let mut record = test_record();
        record.source = None;
        let line = span_line(&record, "fallback-host");
        assert!(line.contains("source=\"fallback-host\""));
    }

    #[test]
    fn quotes_and_newlines_sanitized() {
        let mut record = test_record();
        record.name = "say \"hi\"\nplease".to_string();
        let line = span_line(&record, "h");
        assert!(line.starts_with("\"say \\\"hi\\\" please\" "));
    }

    #[test]
    fn span_logs_tag_and_payload() {
        let mut record = test_record();
        assert!(span_logs_json(&record).is_none());
        assert!(!span_line(&record, "h").contains("_spanLogs"));

        record.span_logs = vec![SpanLog {
            timestamp_ms: 1_700_000_000_123,
            fields: HashMap::from([("event".to_string(), "retry".to_string())]),
        }];
        assert!(span_line(&record, "h").contains("\"_spanLogs\"=\"true\""));

        let json = span_logs_json(&record).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value["traceId"],
            "01234567-89ab-cdef-0000-000000000000".to_string()
        );
        assert_eq!(value["logs"][0]["timestamp"], 1_700_000_000_123i64);
        assert_eq!(value["logs"][0]["fields"]["event"], "retry");
    }
}
