// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

/// The kind of work a span describes, mirroring the OpenTelemetry span kinds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpanKind {
    #[default]
    Internal,
    Server,
    Client,
    Producer,
    Consumer,
}

/// A typed span attribute value.
///
/// Only the four scalar kinds map to Wavefront tags; `Bytes` and `Array`
/// values are skipped with a diagnostic rather than failing the span.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    Int(i64),
    Bool(bool),
    Double(f64),
    Str(String),
    Bytes(Vec<u8>),
    Array(Vec<AttributeValue>),
}

impl AttributeValue {
    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::Int(_) => "int",
            AttributeValue::Bool(_) => "bool",
            AttributeValue::Double(_) => "double",
            AttributeValue::Str(_) => "string",
            AttributeValue::Bytes(_) => "bytes",
            AttributeValue::Array(_) => "array",
        }
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Double(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Str(value.to_string())
    }
}

/// A timed event recorded on a span, carrying its own attribute set.
#[derive(Clone, Debug, PartialEq)]
pub struct SpanEvent {
    pub name: String,
    pub timestamp_unix_nano: i64,
    pub attributes: HashMap<String, AttributeValue>,
}

/// A finished span as produced by the instrumentation pipeline.
///
/// Identifiers are lowercase hex strings: 32 characters for the trace id,
/// 16 for span ids. The record is read-only to the exporter.
#[derive(Clone, Debug, PartialEq)]
pub struct SpanRecord {
    pub name: String,
    pub kind: SpanKind,
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub start_unix_nano: i64,
    pub end_unix_nano: i64,
    pub attributes: HashMap<String, AttributeValue>,
    pub events: Vec<SpanEvent>,
    pub instrumentation_name: Option<String>,
    pub instrumentation_version: Option<String>,
}

impl SpanRecord {
    /// A minimal record; callers fill in the remaining fields as needed.
    pub fn new(
        name: impl Into<String>,
        trace_id: impl Into<String>,
        span_id: impl Into<String>,
    ) -> Self {
        SpanRecord {
            name: name.into(),
            kind: SpanKind::default(),
            trace_id: trace_id.into(),
            span_id: span_id.into(),
            parent_span_id: None,
            start_unix_nano: 0,
            end_unix_nano: 0,
            attributes: HashMap::new(),
            events: Vec::new(),
            instrumentation_name: None,
            instrumentation_version: None,
        }
    }
}
