//! Transport layer
//!
//! Request/response types, the transport error taxonomy, and the
//! [`Transport`] seam the playback client delegates to.

mod client;
mod error;
mod message;
mod options;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use serde_json::{Map, Value};

pub use client::{HyperTransport, DEFAULT_POOL_IDLE_TIMEOUT_SECS, DEFAULT_POOL_MAX_IDLE_PER_HOST};
pub use error::{ErrorKind, TransportError};
pub use message::{Headers, Request, Response};
pub use options::RequestOptions;

/// Result of one exchange with a transport
pub type Outcome = std::result::Result<Response, TransportError>;

/// Something that can carry a request to a server and bring back its outcome
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request
    async fn send(&self, request: Request, options: &RequestOptions) -> Outcome;

    /// Resolved transport configuration
    fn config(&self) -> Map<String, Value> {
        Map::new()
    }
}
