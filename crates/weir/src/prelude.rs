//! Prelude module for convenient imports
//!
//! Import everything you need with:
//! ```rust
//! use weir::prelude::*;
//! ```

pub use crate::{
    Delivery, EngineConfig, FlushError, FlushResult, HttpConfig, HttpTransport, Method, Record,
    RetryPolicy, SendOptions, StreamBuffer, TrackError, Transport, TransportError,
};
