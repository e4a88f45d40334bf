// SPDX-License-Identifier: Apache-2.0

//! Exporter configuration: the programmatic builder and the key/value
//! factory surface used by auto-instrumentation hosts.

use crate::exporter::WavefrontSpanExporter;
use crate::ExporterError;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use wavefront_sender::{DirectClient, ProxyClient};

pub use wavefront_sender::{DirectClientConfig as DirectConfig, ProxyClientConfig as ProxyConfig};

pub const DEFAULT_APPLICATION: &str = "(unknown application)";
pub const DEFAULT_SERVICE: &str = "(unknown service)";
const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 5;

const PROXY_KEY: &str = "wavefront.proxy";
const URL_KEY: &str = "wavefront.url";
const TOKEN_KEY: &str = "wavefront.token";
const TRACE_PORT_KEY: &str = "wavefront.traceport";
const METRICS_PORT_KEY: &str = "wavefront.metricsport";
const DISTRIBUTION_PORT_KEY: &str = "wavefront.distributionport";
const FLUSH_INTERVAL_KEY: &str = "wavefront.flushinterval";
const HOST_KEY: &str = "wavefront.host";
const MAX_QUEUE_SIZE_KEY: &str = "wavefront.maxqueuesize";
const BATCH_SIZE_KEY: &str = "wavefront.batchsize";
const MESSAGE_SIZE_KEY: &str = "wavefront.messagesize";
const APPLICATION_KEY: &str = "application";
const SERVICE_KEY: &str = "service";

/// Builder for a [`WavefrontSpanExporter`].
///
/// Exactly one transport must be selected before [`build`](Self::build):
/// [`proxy`](Self::proxy) for a local Wavefront proxy, or
/// [`direct`](Self::direct) for authenticated direct ingestion. Selecting
/// both, or neither, is a configuration error.
#[derive(Default)]
pub struct ExporterBuilder {
    application: Option<String>,
    service: Option<String>,
    source: Option<String>,
    proxy: Option<ProxyConfig>,
    direct: Option<DirectConfig>,
}

impl ExporterBuilder {
    pub fn new() -> Self {
        ExporterBuilder::default()
    }

    pub fn application(mut self, application: impl Into<String>) -> Self {
        self.application = Some(application.into());
        self
    }

    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Origin host to report on every span. Unset, the transport infers the
    /// local hostname.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn proxy(mut self, config: ProxyConfig) -> Self {
        self.proxy = Some(config);
        self
    }

    pub fn direct(mut self, config: DirectConfig) -> Self {
        self.direct = Some(config);
        self
    }

    /// Wires the configured transport and returns a ready exporter.
    ///
    /// Builds the one sender the exporter owns for its lifetime; it does not
    /// probe connectivity — unreachable endpoints surface on export.
    pub fn build(self) -> Result<WavefrontSpanExporter, ExporterError> {
        let sender: Arc<dyn wavefront_sender::SpanSender> = match (self.proxy, self.direct) {
            (Some(_), Some(_)) => {
                return Err(ExporterError::Configuration(format!(
                    "settings {PROXY_KEY} and {URL_KEY} are mutually exclusive"
                )));
            }
            (None, None) => {
                return Err(ExporterError::Configuration(format!(
                    "either {PROXY_KEY} or {URL_KEY} needs to be specified"
                )));
            }
            (Some(proxy), None) => Arc::new(ProxyClient::new(proxy)),
            (None, Some(direct)) => {
                if direct.token.is_empty() {
                    return Err(ExporterError::Configuration(format!(
                        "setting {TOKEN_KEY} must be specified for direct connections"
                    )));
                }
                Arc::new(DirectClient::new(direct).map_err(|err| {
                    ExporterError::Configuration(format!(
                        "failed to build direct ingestion client: {err}"
                    ))
                })?)
            }
        };

        Ok(WavefrontSpanExporter::new(
            sender,
            self.application
                .unwrap_or_else(|| DEFAULT_APPLICATION.to_string()),
            self.service.unwrap_or_else(|| DEFAULT_SERVICE.to_string()),
            self.source,
        ))
    }

    /// Builds an exporter from an externally-supplied key/value map, the
    /// surface auto-instrumentation hosts configure through.
    pub fn from_settings(
        settings: &HashMap<String, String>,
    ) -> Result<WavefrontSpanExporter, ExporterError> {
        let mut builder = ExporterBuilder::new()
            .application(get_string(settings, APPLICATION_KEY, DEFAULT_APPLICATION))
            .service(get_string(settings, SERVICE_KEY, DEFAULT_SERVICE));
        if let Some(host) = settings.get(HOST_KEY) {
            builder = builder.source(host.clone());
        }

        let flush_interval = Duration::from_secs(get_parsed(
            settings,
            FLUSH_INTERVAL_KEY,
            DEFAULT_FLUSH_INTERVAL_SECS,
        )?);

        match (settings.get(PROXY_KEY), settings.get(URL_KEY)) {
            (Some(_), Some(_)) => Err(ExporterError::Configuration(format!(
                "settings {PROXY_KEY} and {URL_KEY} are mutually exclusive"
            ))),
            (Some(proxy_host), None) => {
                let mut proxy = ProxyConfig::new(proxy_host.clone())
                    .metrics_port(get_parsed(
                        settings,
                        METRICS_PORT_KEY,
                        wavefront_sender::proxy::DEFAULT_METRICS_PORT,
                    )?)
                    .tracing_port(get_parsed(
                        settings,
                        TRACE_PORT_KEY,
                        wavefront_sender::proxy::DEFAULT_TRACING_PORT,
                    )?)
                    .flush_interval(flush_interval);
                if settings.contains_key(DISTRIBUTION_PORT_KEY) {
                    proxy = proxy.distribution_port(get_parsed(settings, DISTRIBUTION_PORT_KEY, 0)?);
                }
                builder.proxy(proxy).build()
            }
            (None, Some(url)) => {
                let token = settings.get(TOKEN_KEY).cloned().ok_or_else(|| {
                    ExporterError::Configuration(format!(
                        "setting {TOKEN_KEY} must be specified for direct connections"
                    ))
                })?;
                let direct = DirectConfig::new(url.clone(), token)
                    .max_queue_size(get_parsed(
                        settings,
                        MAX_QUEUE_SIZE_KEY,
                        wavefront_sender::direct::DEFAULT_MAX_QUEUE_SIZE,
                    )?)
                    .batch_size(get_parsed(
                        settings,
                        BATCH_SIZE_KEY,
                        wavefront_sender::direct::DEFAULT_BATCH_SIZE,
                    )?)
                    .message_size_bytes(get_parsed(settings, MESSAGE_SIZE_KEY, usize::MAX)?)
                    .flush_interval(flush_interval);
                builder.direct(direct).build()
            }
            (None, None) => Err(ExporterError::Configuration(format!(
                "either {PROXY_KEY} or {URL_KEY} needs to be specified"
            ))),
        }
    }
}

fn get_string(settings: &HashMap<String, String>, key: &str, default: &str) -> String {
    settings
        .get(key)
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

fn get_parsed<T: FromStr>(
    settings: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, ExporterError> {
    match settings.get(key) {
        None => Ok(default),
        Some(raw) => raw.parse::<T>().map_err(|_| {
            ExporterError::Configuration(format!("setting {key} has invalid value {raw:?}"))
        }),
    }
}
