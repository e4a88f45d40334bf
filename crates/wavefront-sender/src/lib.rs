// SPDX-License-Identifier: Apache-2.0

//! Clients for shipping finished trace spans to Wavefront.
//!
//! Two transports are provided: [`ProxyClient`] forwards spans to a local
//! Wavefront proxy over its tracing TCP port, and [`DirectClient`] batches
//! spans and posts them straight to a cluster's direct ingestion endpoint.
//! Both implement the [`SpanSender`] capability and own their buffering,
//! flush timers and network behavior.

use async_trait::async_trait;

pub mod direct;
mod line;
pub mod proxy;
mod record;

pub use direct::{DirectClient, DirectClientConfig};
pub use proxy::{ProxyClient, ProxyClientConfig};
pub use record::{DeliveryRecord, SpanLog};

use std::io;

/// Errors surfaced by a [`SpanSender`].
///
/// Transport-level variants indicate a transient delivery problem the caller
/// may retry; [`SenderError::Rejected`] means the backend refused the payload
/// and retrying the same data will not help.
#[derive(Debug, thiserror::Error)]
pub enum SenderError {
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("span buffer is full ({0} entries)")]
    QueueFull(usize),
    #[error("ingestion endpoint rejected payload with status {0}")]
    Rejected(u16),
    #[error("sender is closed")]
    Closed,
}

impl SenderError {
    /// True for faults worth re-submitting the same data for: broken
    /// connections, write failures, throttling, and local buffer exhaustion.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SenderError::Io(_) | SenderError::Http(_) | SenderError::QueueFull(_)
        )
    }
}

/// Capability boundary for span delivery.
///
/// Implementations are shared behind an `Arc` and must tolerate concurrent
/// calls; all buffering and timeout policy lives behind this trait.
#[async_trait]
pub trait SpanSender: Send + Sync {
    /// Hands one span over for transmission. Depending on the transport this
    /// may write to a socket immediately or only enqueue for a later flush.
    async fn send_span(&self, record: DeliveryRecord) -> Result<(), SenderError>;

    /// Pushes any buffered spans out to the backend.
    async fn flush(&self) -> Result<(), SenderError>;

    /// Flushes remaining spans and releases the underlying connection. The
    /// sender accepts no further spans afterwards.
    async fn close(&self) -> Result<(), SenderError>;
}
