// SPDX-License-Identifier: Apache-2.0

//! Translation of one [`SpanRecord`] into the delivery shape the sender
//! transmits.

use crate::attributes::{extract_span_logs, extract_tags};
use crate::ids::make_uuid;
use crate::span::SpanRecord;
use crate::ExporterError;
use wavefront_sender::DeliveryRecord;

/// Id a span without a parent translates under: it still yields one parent
/// UUID, the all-zero one (see DESIGN.md).
const NO_PARENT_ID: &str = "0";

pub(crate) struct Translator {
    application: String,
    service: String,
    source: Option<String>,
}

impl Translator {
    pub(crate) fn new(application: String, service: String, source: Option<String>) -> Self {
        Translator {
            application,
            service,
            source,
        }
    }

    /// Builds the delivery record for one span. Only malformed identifiers
    /// fail translation; everything else degrades to skipped tags.
    pub(crate) fn translate(&self, span: &SpanRecord) -> Result<DeliveryRecord, ExporterError> {
        let parent_id = span.parent_span_id.as_deref().unwrap_or(NO_PARENT_ID);
        Ok(DeliveryRecord {
            name: span.name.clone(),
            start_ms: span.start_unix_nano / 1_000_000,
            duration_ms: (span.end_unix_nano - span.start_unix_nano) / 1_000_000,
            source: self.source.clone(),
            trace_id: make_uuid(&span.trace_id)?,
            span_id: make_uuid(&span.span_id)?,
            parents: vec![make_uuid(parent_id)?],
            follows_from: Vec::new(),
            tags: extract_tags(span, &self.application, &self.service),
            span_logs: extract_span_logs(span),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Translator;
    use crate::ids::{make_uuid, parse_hex};
    use crate::span::SpanRecord;
    use crate::ExporterError;
    use uuid::Uuid;

    fn translator() -> Translator {
        Translator::new("app".to_string(), "svc".to_string(), None)
    }

    fn test_span() -> SpanRecord {
        let mut span = SpanRecord::new(
            "client.span",
            "0123456789abcdef0000000000000000",
            "1111111111111111",
        );
        span.start_unix_nano = 1_700_000_000_123_456_789;
        span.end_unix_nano = 1_700_000_000_987_654_321;
        span
    }

    #[test]
    fn timestamps_truncate_to_milliseconds() {
        let record = translator().translate(&test_span()).unwrap();
        assert_eq!(record.start_ms, 1_700_000_000_123);
        // 864197532 ns of wall time, truncated not rounded
        assert_eq!(record.duration_ms, 864);
    }

    #[test]
    fn trace_uuid_splits_at_sixteen_characters() {
        let record = translator().translate(&test_span()).unwrap();
        let high = parse_hex("0123456789abcdef").unwrap() as u64;
        let low = parse_hex("0000000000000000").unwrap() as u64;
        assert_eq!(record.trace_id, Uuid::from_u64_pair(high, low));
        assert_eq!(
            record.span_id,
            Uuid::from_u64_pair(0, 0x1111111111111111)
        );
    }

    #[test]
    fn rootless_span_still_carries_one_parent_uuid() {
        let record = translator().translate(&test_span()).unwrap();
        assert_eq!(record.parents, vec![Uuid::from_u64_pair(0, 0)]);
        assert!(record.follows_from.is_empty());
    }

    #[test]
    fn parent_id_translates_into_parent_uuid() {
        let mut span = test_span();
        span.parent_span_id = Some("2222222222222222".to_string());
        let record = translator().translate(&span).unwrap();
        assert_eq!(
            record.parents,
            vec![make_uuid("2222222222222222").unwrap()]
        );
    }

    #[test]
    fn source_passes_through() {
        let translator = Translator::new(
            "app".to_string(),
            "svc".to_string(),
            Some("host-17".to_string()),
        );
        let record = translator.translate(&test_span()).unwrap();
        assert_eq!(record.source.as_deref(), Some("host-17"));

        let record = Translator::new("a".to_string(), "s".to_string(), None)
            .translate(&test_span())
            .unwrap();
        assert_eq!(record.source, None);
    }

    #[test]
    fn malformed_trace_id_fails_translation() {
        let mut span = test_span();
        span.trace_id = "0123456789abcdef0123456789abcdef0".to_string();
        let err = translator().translate(&span).unwrap_err();
        assert!(matches!(err, ExporterError::InvalidIdentifier(_)));
    }
}
