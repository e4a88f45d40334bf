// SPDX-License-Identifier: Apache-2.0

//! Direct-mode client: batches spans in memory and posts them straight to a
//! Wavefront cluster's direct ingestion endpoint with token authentication.

use crate::line::{default_source, span_line, span_logs_json};
use crate::record::DeliveryRecord;
use crate::{SenderError, SpanSender};
use async_trait::async_trait;
use reqwest::{header, StatusCode};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub const DEFAULT_MAX_QUEUE_SIZE: usize = 50_000;
pub const DEFAULT_BATCH_SIZE: usize = 10_000;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const TRACE_FORMAT: &str = "trace";
const SPAN_LOGS_FORMAT: &str = "spanLogs";

/// Settings for direct ingestion. `url` is the cluster base URL
/// (e.g. `https://example.wavefront.com`); `token` is the API token the
/// ingestion endpoint authenticates with.
#[derive(Clone, Debug)]
pub struct DirectClientConfig {
    pub url: String,
    pub token: String,
    pub max_queue_size: usize,
    pub batch_size: usize,
    pub message_size_bytes: usize,
    pub flush_interval: Duration,
}

impl DirectClientConfig {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        DirectClientConfig {
            url: url.into(),
            token: token.into(),
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            message_size_bytes: usize::MAX,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }

    pub fn max_queue_size(mut self, size: usize) -> Self {
        self.max_queue_size = size;
        self
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn message_size_bytes(mut self, bytes: usize) -> Self {
        self.message_size_bytes = bytes;
        self
    }

    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }
}

struct DirectInner {
    report_url: String,
    token: String,
    http: reqwest::Client,
    spans: Mutex<VecDeque<String>>,
    logs: Mutex<VecDeque<String>>,
    max_queue_size: usize,
    batch_size: usize,
    message_size_bytes: usize,
    closed: AtomicBool,
    source: String,
}

impl DirectInner {
    fn enqueue(&self, queue: &Mutex<VecDeque<String>>, line: String) -> Result<(), SenderError> {
        #[allow(clippy::expect_used)]
        let mut queue = queue.lock().expect("lock poisoned");
        if queue.len() >= self.max_queue_size {
            return Err(SenderError::QueueFull(self.max_queue_size));
        }
        queue.push_back(line);
        Ok(())
    }

    async fn flush_all(&self) -> Result<(), SenderError> {
        self.flush_queue(&self.spans, TRACE_FORMAT).await?;
        self.flush_queue(&self.logs, SPAN_LOGS_FORMAT).await
    }

    /// Drains one queue in `batch_size` chunks, splitting further to honor
    /// the message size cap. Rejected payloads (4xx) are dropped and reported
    /// after the drain; transport faults re-queue the unsent remainder and
    /// abort so the next flush cycle can retry it.
    async fn flush_queue(
        &self,
        queue: &Mutex<VecDeque<String>>,
        format: &str,
    ) -> Result<(), SenderError> {
        let mut rejected = None;
        loop {
            let batch: Vec<String> = {
                #[allow(clippy::expect_used)]
                let mut queue = queue.lock().expect("lock poisoned");
                if queue.is_empty() {
                    break;
                }
                let n = self.batch_size.min(queue.len());
                queue.drain(..n).collect()
            };

            let mut start = 0;
            while start < batch.len() {
                let mut end = start;
                let mut size = 0;
                while end < batch.len() {
                    // always take at least one line, even if oversized
                    if end > start && size + batch[end].len() > self.message_size_bytes {
                        break;
                    }
                    size += batch[end].len();
                    end += 1;
                }

                debug!("Posting {} {format} lines to {}", end - start, self.report_url);
                match self.post(format, batch[start..end].concat()).await {
                    Ok(()) => {}
                    Err(SenderError::Rejected(status)) => {
                        warn!(
                            "Ingestion endpoint rejected {} {format} lines with status {status}, dropping them",
                            end - start
                        );
                        rejected = Some(status);
                    }
                    Err(err) => {
                        #[allow(clippy::expect_used)]
                        let mut queue = queue.lock().expect("lock poisoned");
                        for line in batch[start..].iter().rev() {
                            queue.push_front(line.clone());
                        }
                        return Err(err);
                    }
                }
                start = end;
            }
        }
        match rejected {
            Some(status) => Err(SenderError::Rejected(status)),
            None => Ok(()),
        }
    }

    async fn post(&self, format: &str, body: String) -> Result<(), SenderError> {
        let response = self
            .http
            .post(&self.report_url)
            .query(&[("f", format)])
            .bearer_auth(&self.token)
            .header(header::CONTENT_TYPE, "text/plain")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        match response.error_for_status() {
            Ok(_) => Ok(()),
            Err(_) if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS => {
                Err(SenderError::Rejected(status.as_u16()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Direct-mode [`SpanSender`]: `send_span` only enqueues; a background task
/// drains the queues every flush interval, and `flush` drains them on demand.
pub struct DirectClient {
    inner: Arc<DirectInner>,
    flush_interval: Duration,
    flush_task: OnceCell<JoinHandle<()>>,
}

impl DirectClient {
    pub fn new(config: DirectClientConfig) -> Result<Self, SenderError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(DirectClient {
            inner: Arc::new(DirectInner {
                report_url: format!("{}/report", config.url.trim_end_matches('/')),
                token: config.token,
                http,
                spans: Mutex::new(VecDeque::new()),
                logs: Mutex::new(VecDeque::new()),
                max_queue_size: config.max_queue_size,
                batch_size: config.batch_size,
                message_size_bytes: config.message_size_bytes,
                closed: AtomicBool::new(false),
                source: default_source(),
            }),
            flush_interval: config.flush_interval,
            flush_task: OnceCell::new(),
        })
    }

    /// Starts the periodic flush task. Deferred to the first send so the
    /// client can be constructed outside a tokio runtime.
    async fn ensure_flush_task(&self) {
        self.flush_task
            .get_or_init(|| async {
                let inner = Arc::clone(&self.inner);
                let interval = self.flush_interval;
                tokio::spawn(async move {
                    let mut ticker = tokio::time::interval(interval);
                    ticker.tick().await; // first tick completes immediately
                    loop {
                        ticker.tick().await;
                        if let Err(err) = inner.flush_all().await {
                            warn!("Periodic direct ingestion flush failed: {err}");
                        }
                    }
                })
            })
            .await;
    }
}

#[async_trait]
impl SpanSender for DirectClient {
    async fn send_span(&self, record: DeliveryRecord) -> Result<(), SenderError> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(SenderError::Closed);
        }
        self.ensure_flush_task().await;

        self.inner
            .enqueue(&self.inner.spans, span_line(&record, &self.inner.source))?;
        if let Some(logs) = span_logs_json(&record) {
            self.inner.enqueue(&self.inner.logs, logs)?;
        }
        Ok(())
    }

    async fn flush(&self) -> Result<(), SenderError> {
        self.inner.flush_all().await
    }

    async fn close(&self) -> Result<(), SenderError> {
        self.inner.closed.store(true, Ordering::Release);
        if let Some(task) = self.flush_task.get() {
            task.abort();
        }
        self.inner.flush_all().await
    }
}
