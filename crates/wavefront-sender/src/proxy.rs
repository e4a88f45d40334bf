// SPDX-License-Identifier: Apache-2.0

//! Relay-mode client: forwards spans to a local Wavefront proxy process,
//! which owns the authenticated connection to the backend.

use crate::line::{default_source, span_line, span_logs_json};
use crate::record::DeliveryRecord;
use crate::{SenderError, SpanSender};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, OnceCell};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub const DEFAULT_METRICS_PORT: u16 = 2878;
pub const DEFAULT_TRACING_PORT: u16 = 30000;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);

/// Connection settings for a local Wavefront proxy.
///
/// Span traffic only uses `tracing_port`; the metrics and distribution ports
/// are carried so one config can describe the proxy's full listening surface.
#[derive(Clone, Debug)]
pub struct ProxyClientConfig {
    pub host: String,
    pub metrics_port: u16,
    pub distribution_port: Option<u16>,
    pub tracing_port: u16,
    pub flush_interval: Duration,
}

impl ProxyClientConfig {
    pub fn new(host: impl Into<String>) -> Self {
        ProxyClientConfig {
            host: host.into(),
            metrics_port: DEFAULT_METRICS_PORT,
            distribution_port: None,
            tracing_port: DEFAULT_TRACING_PORT,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }

    pub fn metrics_port(mut self, port: u16) -> Self {
        self.metrics_port = port;
        self
    }

    pub fn distribution_port(mut self, port: u16) -> Self {
        self.distribution_port = Some(port);
        self
    }

    pub fn tracing_port(mut self, port: u16) -> Self {
        self.tracing_port = port;
        self
    }

    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }
}

struct ProxyConnection {
    addr: String,
    writer: Mutex<Option<BufWriter<TcpStream>>>,
    closed: AtomicBool,
    source: String,
}

impl ProxyConnection {
    /// Writes through the current connection, dialing the proxy first if
    /// needed. A failed write drops the connection so the next send redials.
    async fn write(&self, data: &str) -> Result<(), SenderError> {
        let mut guard = self.writer.lock().await;
        let mut writer = match guard.take() {
            Some(writer) => writer,
            None => {
                debug!("Connecting to Wavefront proxy at {}", self.addr);
                BufWriter::new(TcpStream::connect(&self.addr).await?)
            }
        };
        match writer.write_all(data.as_bytes()).await {
            Ok(()) => {
                *guard = Some(writer);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn flush(&self) -> Result<(), SenderError> {
        let mut guard = self.writer.lock().await;
        if let Some(writer) = guard.as_mut() {
            if let Err(err) = writer.flush().await {
                *guard = None;
                return Err(err.into());
            }
        }
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), SenderError> {
        let mut guard = self.writer.lock().await;
        if let Some(mut writer) = guard.take() {
            writer.flush().await?;
            writer.into_inner().shutdown().await?;
        }
        Ok(())
    }
}

/// Relay-mode [`SpanSender`]: writes line-protocol spans to the proxy's
/// tracing port over a lazily-dialed TCP connection, with a background task
/// flushing the write buffer on the configured interval.
pub struct ProxyClient {
    conn: Arc<ProxyConnection>,
    flush_interval: Duration,
    flush_task: OnceCell<JoinHandle<()>>,
}

impl ProxyClient {
    pub fn new(config: ProxyClientConfig) -> Self {
        ProxyClient {
            conn: Arc::new(ProxyConnection {
                addr: format!("{}:{}", config.host, config.tracing_port),
                writer: Mutex::new(None),
                closed: AtomicBool::new(false),
                source: default_source(),
            }),
            flush_interval: config.flush_interval,
            flush_task: OnceCell::new(),
        }
    }

    /// Starts the periodic flush task. Deferred to the first send so the
    /// client can be constructed outside a tokio runtime.
    async fn ensure_flush_task(&self) {
        self.flush_task
            .get_or_init(|| async {
                let conn = Arc::clone(&self.conn);
                let interval = self.flush_interval;
                tokio::spawn(async move {
                    let mut ticker = tokio::time::interval(interval);
                    ticker.tick().await; // first tick completes immediately
                    loop {
                        ticker.tick().await;
                        if let Err(err) = conn.flush().await {
                            warn!("Periodic proxy flush failed: {err}");
                        }
                    }
                })
            })
            .await;
    }
}

#[async_trait]
impl SpanSender for ProxyClient {
    async fn send_span(&self, record: DeliveryRecord) -> Result<(), SenderError> {
        if self.conn.closed.load(Ordering::Acquire) {
            return Err(SenderError::Closed);
        }
        self.ensure_flush_task().await;

        self.conn
            .write(&span_line(&record, &self.conn.source))
            .await?;
        if let Some(logs) = span_logs_json(&record) {
            self.conn.write(&logs).await?;
        }
        Ok(())
    }

    async fn flush(&self) -> Result<(), SenderError> {
        self.conn.flush().await
    }

    async fn close(&self) -> Result<(), SenderError> {
        self.conn.closed.store(true, Ordering::Release);
        if let Some(task) = self.flush_task.get() {
            task.abort();
        }
        self.conn.shutdown().await
    }
}
