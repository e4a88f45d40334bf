// SPDX-License-Identifier: Apache-2.0

//! Exports finished OpenTelemetry trace spans to Wavefront.
//!
//! The exporter translates each [`SpanRecord`] into the backend's delivery
//! shape (128-bit UUID identifiers, string tags, spanLogs) and hands it to a
//! [`wavefront_sender::SpanSender`] — either the proxy client or the direct
//! ingestion client, selected through [`ExporterBuilder`] or the key/value
//! [`from_settings`](ExporterBuilder::from_settings) factory.
//!
//! ```no_run
//! use wavefront_otel_exporter::{ExporterBuilder, ProxyConfig};
//!
//! # fn main() -> Result<(), wavefront_otel_exporter::ExporterError> {
//! let exporter = ExporterBuilder::new()
//!     .application("shop")
//!     .service("checkout")
//!     .proxy(ProxyConfig::new("localhost"))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

mod attributes;
pub mod config;
mod exporter;
mod ids;
mod span;
mod translate;

pub use config::{DirectConfig, ExporterBuilder, ProxyConfig};
pub use exporter::{ExportOutcome, WavefrontSpanExporter};
pub use span::{AttributeValue, SpanEvent, SpanKind, SpanRecord};
pub use wavefront_sender::{DeliveryRecord, SenderError, SpanLog, SpanSender};

/// Errors surfaced by exporter construction and export calls.
#[derive(Debug, thiserror::Error)]
pub enum ExporterError {
    /// Invalid or contradictory configuration, detected at build time.
    #[error("invalid exporter configuration: {0}")]
    Configuration(String),
    /// A malformed trace or span identifier. Aborts the enclosing batch:
    /// corrupt identifiers point at an upstream bug, not a transient fault.
    #[error("invalid trace or span identifier: {0:?}")]
    InvalidIdentifier(String),
    /// The exporter was already shut down.
    #[error("exporter is shut down")]
    Closed,
}
