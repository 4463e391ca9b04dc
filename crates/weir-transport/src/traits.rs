use crate::error::TransportError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Trait for delivering a batch of records to a remote ingestion endpoint
///
/// Implementations own framing, headers, and authentication; callers only
/// supply the stream name, the record batch, and a delivery method hint.
/// Record order in `records` must be preserved on the wire so the caller can
/// correlate per-record outcomes in the response body with submission order.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one batch of wire-form records to the named stream
    async fn send(
        &self,
        stream: &str,
        records: &[String],
        options: &SendOptions,
    ) -> Result<Delivery, TransportError>;
}

/// Outcome of a successful send
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub status: u16,
    pub body: String,
}

/// HTTP method used for delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Post,
    Get,
}

impl Default for Method {
    fn default() -> Self {
        Method::Post
    }
}

/// Per-send delivery options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendOptions {
    pub method: Method,
}

impl SendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }
}
