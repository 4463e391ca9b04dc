//! # Weir
//!
//! Client-side event buffering and delivery: callers submit named records one
//! at a time, weir accumulates them per stream, decides when a batch is full
//! enough to send, and delivers it to a remote ingestion endpoint with
//! bounded, backoff-based retry on transient failure.
//!
//! ## Overview
//!
//! - **Per-stream accumulation**: records are queued per logical destination
//!   and flushed independently.
//! - **Dual triggers**: a stream flushes as soon as it reaches the record
//!   count or serialized byte-size threshold.
//! - **Periodic flush**: a ticker bounds the staleness of records that never
//!   hit a trigger.
//! - **Bounded retry**: transient failures (5xx, connection errors) back off
//!   exponentially with jitter up to a ceiling; everything else fails fast.
//! - **Race-free hand-off**: a queue is swapped out for an empty one before
//!   its batch goes in flight, so concurrent `track` calls never lose or
//!   duplicate records.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use weir::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = Arc::new(HttpTransport::new(
//!         HttpConfig::new("https://ingest.example.com/v1")
//!             .with_api_key(std::env::var("INGEST_API_KEY")?),
//!     )?);
//!
//!     let buffer = StreamBuffer::new(transport, EngineConfig::new().max_record_count(20));
//!
//!     buffer.track("clicks", serde_json::json!({"page": "/pricing"}).to_string())?;
//!     buffer.track("clicks", "already-serialized")?;
//!
//!     // Force out whatever is still buffered and inspect the outcomes
//!     for (stream, result) in buffer.flush().await {
//!         match result {
//!             Ok(delivery) => println!("{stream}: {}", delivery.status),
//!             Err(err) => eprintln!("{stream}: {err}"),
//!         }
//!     }
//!
//!     buffer.stop();
//!     Ok(())
//! }
//! ```

pub mod prelude;

pub use weir_engine::{
    EngineConfig, FlushError, FlushResult, Record, RetryPolicy, RetryState, StreamBuffer,
    TrackError,
};
pub use weir_transport::{
    Delivery, HttpConfig, HttpTransport, Method, SendOptions, Transport, TransportError,
};
