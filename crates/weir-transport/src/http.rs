use crate::error::TransportError;
use crate::traits::{Delivery, Method, SendOptions, Transport};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the HTTP transport
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl HttpConfig {
    /// Create a config pointing at an ingestion endpoint base URL,
    /// e.g. "https://ingest.example.com/v1"
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// HTTP client for remote ingestion endpoints
///
/// Posts each batch as a JSON array of wire-form records to
/// `{endpoint}/{stream}`. A `Method::Get` hint sends the serialized batch in
/// a `data` query parameter instead, for endpoints that only accept GET.
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpTransport {
    pub fn new(config: HttpConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::Config(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }

    fn stream_url(&self, stream: &str) -> String {
        format!("{}/{}", self.endpoint, stream)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        stream: &str,
        records: &[String],
        options: &SendOptions,
    ) -> Result<Delivery, TransportError> {
        let url = self.stream_url(stream);

        let request = match options.method {
            Method::Post => self.client.post(&url).json(&records),
            Method::Get => {
                let payload = serde_json::to_string(records)
                    .map_err(|e| TransportError::Config(e.to_string()))?;
                self.client.get(&url).query(&[("data", payload)])
            }
        };

        let request = match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read response body".to_string());

        if status.is_success() {
            tracing::debug!(stream = stream, status = status.as_u16(), "batch accepted");
            Ok(Delivery {
                status: status.as_u16(),
                body,
            })
        } else {
            tracing::debug!(
                stream = stream,
                status = status.as_u16(),
                "batch rejected by endpoint"
            );
            Err(TransportError::Http {
                status: status.as_u16(),
                body,
            })
        }
    }
}
