use thiserror::Error;
use weir_transport::{Delivery, TransportError};

/// Outcome of one flushed batch
pub type FlushResult = Result<Delivery, FlushError>;

/// Synchronous validation errors from `track`
///
/// These are the only errors `track` surfaces; everything transport-related
/// comes back through the flush path.
#[derive(Error, Debug)]
pub enum TrackError {
    #[error("stream name must be non-empty")]
    InvalidStream,

    #[error("record must be non-empty")]
    InvalidRecord,

    #[error("failed to serialize record: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Terminal failure of one flushed batch
#[derive(Error, Debug)]
pub enum FlushError {
    /// The endpoint rejected the batch; retrying would not help
    #[error("delivery rejected: {0}")]
    Terminal(#[source] TransportError),

    /// The endpoint kept failing transiently until the retry ceiling
    ///
    /// Distinct from `Terminal` so callers can tell "server never came back"
    /// from "server rejected the batch".
    #[error("retry budget exhausted after {attempts} attempts: {last}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        last: TransportError,
    },
}

impl FlushError {
    /// Status code for the failure; exhausted retries report as 408
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Terminal(err) => err.status(),
            Self::RetryExhausted { .. } => Some(408),
        }
    }
}
