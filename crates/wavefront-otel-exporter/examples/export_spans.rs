// SPDX-License-Identifier: Apache-2.0

//! Exports a pair of spans to a Wavefront proxy listening on localhost.
//!
//! Run with: `cargo run --example export_spans`

use std::collections::HashMap;
use wavefront_otel_exporter::{
    AttributeValue, ExporterBuilder, ProxyConfig, SpanKind, SpanRecord,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let exporter = ExporterBuilder::new()
        .application("demo-application")
        .service("demo-service")
        .proxy(ProxyConfig::new("localhost"))
        .build()?;

    let now_nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_nanos() as i64;

    let mut client_span = SpanRecord::new(
        "client.span",
        "0123456789abcdef0000000000000000",
        "0000000000000001",
    );
    client_span.kind = SpanKind::Client;
    client_span.start_unix_nano = now_nanos;
    client_span.end_unix_nano = now_nanos + 1_000_000;

    let mut server_span = SpanRecord::new(
        "server.span",
        "0123456789abcdef0000000000000000",
        "0000000000000002",
    );
    server_span.kind = SpanKind::Server;
    server_span.parent_span_id = Some("0000000000000001".to_string());
    server_span.start_unix_nano = now_nanos + 2_000_000;
    server_span.end_unix_nano = now_nanos + 3_000_000;
    server_span.attributes = HashMap::from([
        ("http.status_code".to_string(), AttributeValue::Int(200)),
        ("http.method".to_string(), AttributeValue::from("GET")),
    ]);

    let outcome = exporter.export(&[client_span, server_span]).await?;
    println!("export outcome: {outcome:?}");

    exporter.shutdown().await;
    Ok(())
}
