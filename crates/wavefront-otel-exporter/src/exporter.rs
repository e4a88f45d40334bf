// SPDX-License-Identifier: Apache-2.0

//! The export session: per-batch orchestration of translate-then-send, and
//! the batch-level outcome the caller observes.

use crate::span::SpanRecord;
use crate::translate::Translator;
use crate::ExporterError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};
use wavefront_sender::SpanSender;

/// Aggregate outcome of one export call.
///
/// The contract is deliberately coarse: callers see one outcome per batch
/// plus diagnostic logs, never per-span results. `RetryableFailure` asks the
/// caller to re-submit the whole batch; spans already delivered before the
/// fault are not undone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportOutcome {
    Success,
    RetryableFailure,
}

/// Exports batches of finished spans to Wavefront through a [`SpanSender`].
pub struct WavefrontSpanExporter {
    sender: Arc<dyn SpanSender>,
    translator: Translator,
    closed: AtomicBool,
}

impl std::fmt::Debug for WavefrontSpanExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WavefrontSpanExporter")
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl WavefrontSpanExporter {
    /// Wires an exporter to an already-constructed sender. Most callers go
    /// through [`ExporterBuilder`](crate::ExporterBuilder) instead.
    pub fn new(
        sender: Arc<dyn SpanSender>,
        application: String,
        service: String,
        source: Option<String>,
    ) -> Self {
        WavefrontSpanExporter {
            sender,
            translator: Translator::new(application, service, source),
            closed: AtomicBool::new(false),
        }
    }

    /// Exports one batch, strictly in input order.
    ///
    /// A transport fault on any span marks the whole batch
    /// [`ExportOutcome::RetryableFailure`] but does not stop the remaining
    /// spans from being attempted. Any other send fault is logged and
    /// absorbed. A malformed identifier aborts the batch with an error
    /// before further sends happen.
    pub async fn export(&self, spans: &[SpanRecord]) -> Result<ExportOutcome, ExporterError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ExporterError::Closed);
        }

        let mut outcome = ExportOutcome::Success;
        for span in spans {
            let record = self.translator.translate(span)?;
            debug!("Exporting span {:?}", record.name);
            match self.sender.send_span(record).await {
                Ok(()) => {}
                Err(err) if err.is_transport() => {
                    warn!("Error while sending span: {err}");
                    outcome = ExportOutcome::RetryableFailure;
                }
                Err(err) => {
                    warn!("Error while sending span: {err}");
                }
            }
        }
        Ok(outcome)
    }

    /// Flushes buffered spans and releases the sender. Safe to call once;
    /// later calls are no-ops and later exports fail with
    /// [`ExporterError::Closed`]. Faults here are logged and swallowed.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Err(err) = self.sender.flush().await {
            warn!("Error flushing Wavefront sender: {err}");
        }
        if let Err(err) = self.sender.close().await {
            warn!("Error closing Wavefront sender: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ExportOutcome, WavefrontSpanExporter};
    use crate::span::SpanRecord;
    use crate::ExporterError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::io;
    use std::sync::{Arc, Mutex};
    use wavefront_sender::{DeliveryRecord, SenderError, SpanSender};

    /// Scripted sender: pops one result per send, records what it was given.
    #[derive(Default)]
    struct MockSender {
        sent: Mutex<Vec<DeliveryRecord>>,
        script: Mutex<VecDeque<Option<SenderError>>>,
        flushed: Mutex<usize>,
        closed: Mutex<usize>,
    }

    impl MockSender {
        fn scripted(script: Vec<Option<SenderError>>) -> Arc<Self> {
            Arc::new(MockSender {
                script: Mutex::new(script.into()),
                ..Default::default()
            })
        }

        fn sent_names(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.name.clone())
                .collect()
        }
    }

    #[async_trait]
    impl SpanSender for MockSender {
        async fn send_span(&self, record: DeliveryRecord) -> Result<(), SenderError> {
            self.sent.lock().unwrap().push(record);
            match self.script.lock().unwrap().pop_front().flatten() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        async fn flush(&self) -> Result<(), SenderError> {
            *self.flushed.lock().unwrap() += 1;
            Ok(())
        }

        async fn close(&self) -> Result<(), SenderError> {
            *self.closed.lock().unwrap() += 1;
            Ok(())
        }
    }

    fn transport_fault() -> SenderError {
        SenderError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "write failed"))
    }

    fn exporter(sender: Arc<MockSender>) -> WavefrontSpanExporter {
        WavefrontSpanExporter::new(sender, "app".to_string(), "svc".to_string(), None)
    }

    fn test_span(name: &str, span_id: &str) -> SpanRecord {
        let mut span = SpanRecord::new(name, "0123456789abcdef0000000000000000", span_id);
        span.start_unix_nano = 1_000_000_000;
        span.end_unix_nano = 2_000_000_000;
        span
    }

    #[tokio::test]
    async fn clean_batch_succeeds() {
        let sender = MockSender::scripted(vec![]);
        let outcome = exporter(sender.clone())
            .export(&[
                test_span("one", "0000000000000001"),
                test_span("two", "0000000000000002"),
            ])
            .await
            .unwrap();
        assert_eq!(outcome, ExportOutcome::Success);
        assert_eq!(sender.sent_names(), ["one", "two"]);
    }

    #[tokio::test]
    async fn transport_fault_marks_batch_retryable_but_continues() {
        let sender = MockSender::scripted(vec![None, Some(transport_fault())]);
        let outcome = exporter(sender.clone())
            .export(&[
                test_span("one", "0000000000000001"),
                test_span("two", "0000000000000002"),
            ])
            .await
            .unwrap();
        assert_eq!(outcome, ExportOutcome::RetryableFailure);
        // the first span reached the sender before the fault
        assert_eq!(sender.sent_names(), ["one", "two"]);
    }

    #[tokio::test]
    async fn later_spans_still_attempted_after_early_fault() {
        let sender = MockSender::scripted(vec![Some(transport_fault())]);
        let outcome = exporter(sender.clone())
            .export(&[
                test_span("one", "0000000000000001"),
                test_span("two", "0000000000000002"),
                test_span("three", "0000000000000003"),
            ])
            .await
            .unwrap();
        assert_eq!(outcome, ExportOutcome::RetryableFailure);
        assert_eq!(sender.sent_names(), ["one", "two", "three"]);
    }

    #[tokio::test]
    async fn unclassified_fault_is_absorbed() {
        let sender = MockSender::scripted(vec![Some(SenderError::Rejected(400)), None]);
        let outcome = exporter(sender.clone())
            .export(&[
                test_span("one", "0000000000000001"),
                test_span("two", "0000000000000002"),
            ])
            .await
            .unwrap();
        // one span was dropped, yet the batch reports success by design
        assert_eq!(outcome, ExportOutcome::Success);
        assert_eq!(sender.sent_names(), ["one", "two"]);
    }

    #[tokio::test]
    async fn malformed_identifier_aborts_batch() {
        let sender = MockSender::scripted(vec![]);
        let exporter = exporter(sender.clone());

        let mut bad = test_span("bad", "0000000000000002");
        bad.trace_id = "zz".to_string();

        let err = exporter
            .export(&[test_span("good", "0000000000000001"), bad])
            .await
            .unwrap_err();
        assert!(matches!(err, ExporterError::InvalidIdentifier(_)));
        // spans translated before the bad one were already handed over
        assert_eq!(sender.sent_names(), ["good"]);
    }

    #[tokio::test]
    async fn shutdown_flushes_closes_and_blocks_further_exports() {
        let sender = MockSender::scripted(vec![]);
        let exporter = exporter(sender.clone());

        exporter.shutdown().await;
        assert_eq!(*sender.flushed.lock().unwrap(), 1);
        assert_eq!(*sender.closed.lock().unwrap(), 1);

        // second shutdown is a no-op
        exporter.shutdown().await;
        assert_eq!(*sender.closed.lock().unwrap(), 1);

        let err = exporter
            .export(&[test_span("late", "0000000000000001")])
            .await
            .unwrap_err();
        assert!(matches!(err, ExporterError::Closed));
        assert!(sender.sent_names().is_empty());
    }
}
