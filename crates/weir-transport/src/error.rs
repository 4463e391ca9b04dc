use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("server returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid transport configuration: {0}")]
    Config(String),
}

impl TransportError {
    /// HTTP status of the failure, if the server produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the failure is worth retrying
    ///
    /// Server-side failures (status >= 500) and connection-level errors that
    /// never produced a status are transient; everything else (4xx,
    /// validation, auth, bad configuration) is terminal.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status >= 500,
            Self::Network(_) => true,
            Self::Config(_) => false,
        }
    }
}
