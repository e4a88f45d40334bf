// SPDX-License-Identifier: Apache-2.0

//! Mapping of typed span attributes onto Wavefront string tags and spanLogs.

use crate::span::{AttributeValue, SpanRecord};
use std::collections::HashMap;
use tracing::warn;
use wavefront_sender::SpanLog;

pub(crate) const APPLICATION_TAG: &str = "application";
pub(crate) const SERVICE_TAG: &str = "service";
pub(crate) const INSTRUMENTATION_NAME_TAG: &str = "instrumentation.name";
pub(crate) const INSTRUMENTATION_VERSION_TAG: &str = "instrumentation.version";

/// Renders an attribute value as a tag value. Non-scalar kinds have no tag
/// representation; they are skipped with a diagnostic so one odd attribute
/// never fails a span.
pub(crate) fn attribute_to_string(value: &AttributeValue) -> Option<String> {
    match value {
        AttributeValue::Int(v) => Some(v.to_string()),
        AttributeValue::Bool(v) => Some(v.to_string()),
        AttributeValue::Double(v) => Some(v.to_string()),
        AttributeValue::Str(v) => Some(v.clone()),
        other => {
            warn!("Unknown attribute type: {}. Skipping!", other.type_name());
            None
        }
    }
}

/// Builds the span's tag list. The `application` and `service` tags always
/// lead, followed by the instrumentation scope tags when the span carries
/// them, then one tag per mappable attribute.
pub(crate) fn extract_tags(
    span: &SpanRecord,
    application: &str,
    service: &str,
) -> Vec<(String, String)> {
    let mut tags = Vec::with_capacity(span.attributes.len() + 4);
    tags.push((APPLICATION_TAG.to_string(), application.to_string()));
    tags.push((SERVICE_TAG.to_string(), service.to_string()));
    if let Some(name) = &span.instrumentation_name {
        tags.push((INSTRUMENTATION_NAME_TAG.to_string(), name.clone()));
    }
    if let Some(version) = &span.instrumentation_version {
        tags.push((INSTRUMENTATION_VERSION_TAG.to_string(), version.clone()));
    }
    for (key, value) in &span.attributes {
        if let Some(value) = attribute_to_string(value) {
            tags.push((key.clone(), value));
        }
    }
    tags
}

/// Builds one [`SpanLog`] per timed event on the span.
///
/// The log timestamp is the span's own start time in milliseconds, not the
/// event's timestamp; downstream consumers depend on the historical behavior
/// (see DESIGN.md).
pub(crate) fn extract_span_logs(span: &SpanRecord) -> Vec<SpanLog> {
    span.events
        .iter()
        .map(|event| {
            let mut fields = HashMap::with_capacity(event.attributes.len());
            for (key, value) in &event.attributes {
                if let Some(value) = attribute_to_string(value) {
                    fields.insert(key.clone(), value);
                }
            }
            SpanLog {
                timestamp_ms: span.start_unix_nano / 1_000_000,
                fields,
            }
        })
        .collect()
}
