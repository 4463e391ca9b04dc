pub mod buffer;
pub mod config;
pub mod error;
pub mod record;
pub mod retry;

pub use buffer::StreamBuffer;
pub use config::EngineConfig;
pub use error::{FlushError, FlushResult, TrackError};
pub use record::Record;
pub use retry::{RetryPolicy, RetryState};
