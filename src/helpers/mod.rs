pub mod http_client;
pub mod retry;

pub use http_client::{Transport, TransportError};
pub use retry::RetryHandler;
