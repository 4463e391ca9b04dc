pub mod error;
pub mod http;
pub mod traits;

pub use error::TransportError;
pub use http::{HttpConfig, HttpTransport};
pub use traits::{Delivery, Method, SendOptions, Transport};
