//! Track a handful of events against an ingestion endpoint and flush.
//!
//! Usage:
//!   WEIR_ENDPOINT=http://localhost:8080/v1 cargo run --bin track-and-flush

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use weir::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let endpoint =
        std::env::var("WEIR_ENDPOINT").unwrap_or_else(|_| "http://localhost:8080/v1".to_string());

    let transport = Arc::new(HttpTransport::new(HttpConfig::new(&endpoint))?);
    let buffer = StreamBuffer::new(
        transport,
        EngineConfig::new()
            .max_record_count(5)
            .flush_interval(Duration::from_secs(10)),
    );

    println!("Tracking events against {endpoint}");

    for i in 0..3 {
        buffer.track(
            "page_views",
            serde_json::json!({ "path": "/pricing", "visit": i }),
        )?;
    }
    buffer.track("signups", serde_json::json!({ "plan": "starter" }))?;

    for (stream, result) in buffer.flush().await {
        match result {
            Ok(delivery) => println!("{stream}: delivered ({})", delivery.status),
            Err(err) => eprintln!("{stream}: failed: {err}"),
        }
    }

    buffer.stop();
    Ok(())
}
