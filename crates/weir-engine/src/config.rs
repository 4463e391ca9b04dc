use crate::retry::RetryPolicy;
use std::time::Duration;
use weir_transport::{Method, SendOptions};

const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(10);
const DEFAULT_MAX_RECORD_COUNT: usize = 20;
const DEFAULT_MAX_BATCH_BYTES: usize = 10 * 1024;

/// Engine settings, immutable after construction
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Period of the unconditional all-streams flush
    pub flush_interval: Duration,
    /// Count trigger: flush a stream once it holds this many records
    pub max_record_count: usize,
    /// Size trigger: flush a stream once its serialized records reach this
    /// many bytes (UTF-8)
    pub max_batch_bytes: usize,
    /// Delivery options forwarded to the transport
    pub send_options: SendOptions,
    /// Backoff settings for transient delivery failures
    pub retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            max_record_count: DEFAULT_MAX_RECORD_COUNT,
            max_batch_bytes: DEFAULT_MAX_BATCH_BYTES,
            send_options: SendOptions::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    pub fn max_record_count(mut self, count: usize) -> Self {
        self.max_record_count = count;
        self
    }

    pub fn max_batch_bytes(mut self, bytes: usize) -> Self {
        self.max_batch_bytes = bytes;
        self
    }

    pub fn send_method(mut self, method: Method) -> Self {
        self.send_options.method = method;
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }
}
