// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// A timestamped attribute snapshot attached to a delivered span, serialized
/// into the spanLogs JSON payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SpanLog {
    #[serde(rename = "timestamp")]
    pub timestamp_ms: i64,
    pub fields: HashMap<String, String>,
}

/// The wire-shaped representation of one finished span, ready to hand to a
/// [`SpanSender`](crate::SpanSender).
///
/// A record is built fresh per span and discarded once transmitted; it has no
/// identity of its own beyond the trace/span UUIDs it carries.
#[derive(Clone, Debug, PartialEq)]
pub struct DeliveryRecord {
    pub name: String,
    pub start_ms: i64,
    pub duration_ms: i64,
    /// Origin host. `None` lets the transport fill in the local hostname.
    pub source: Option<String>,
    pub trace_id: Uuid,
    pub span_id: Uuid,
    /// Zero or one parent UUIDs in the current scope.
    pub parents: Vec<Uuid>,
    /// Reserved; never populated today.
    pub follows_from: Vec<Uuid>,
    pub tags: Vec<(String, String)>,
    pub span_logs: Vec<SpanLog>,
}
