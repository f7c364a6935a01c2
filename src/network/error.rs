//! Transport error taxonomy
//!
//! Error kinds form a closed registry. Each entry has a stable identifier
//! used in recordings and a flag telling whether errors of that kind carry
//! the HTTP response that triggered them.

use hyper::StatusCode;
use thiserror::Error;

use super::message::{Request, Response};

/// Class of transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Connection could not be established
    Connect,
    /// Request could not be sent or its response could not be read
    Request,
    /// The transport's own timeout elapsed
    Timeout,
    /// Redirect limit exceeded
    TooManyRedirects,
    /// Error status outside the 4xx and 5xx ranges
    BadResponse,
    /// 4xx status
    Client,
    /// 5xx status
    Server,
}

struct KindEntry {
    id: &'static str,
    kind: ErrorKind,
    carries_response: bool,
}

// Indexed by `ErrorKind` discriminant.
const REGISTRY: [KindEntry; 7] = [
    KindEntry {
        id: "connect",
        kind: ErrorKind::Connect,
        carries_response: false,
    },
    KindEntry {
        id: "request",
        kind: ErrorKind::Request,
        carries_response: false,
    },
    KindEntry {
        id: "timeout",
        kind: ErrorKind::Timeout,
        carries_response: false,
    },
    KindEntry {
        id: "too_many_redirects",
        kind: ErrorKind::TooManyRedirects,
        carries_response: false,
    },
    KindEntry {
        id: "bad_response",
        kind: ErrorKind::BadResponse,
        carries_response: true,
    },
    KindEntry {
        id: "client",
        kind: ErrorKind::Client,
        carries_response: true,
    },
    KindEntry {
        id: "server",
        kind: ErrorKind::Server,
        carries_response: true,
    },
];

impl ErrorKind {
    fn entry(self) -> &'static KindEntry {
        &REGISTRY[self as usize]
    }

    /// Identifier written to recordings
    #[must_use]
    pub fn id(self) -> &'static str {
        self.entry().id
    }

    /// Resolve a recorded identifier
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        REGISTRY
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.kind)
    }

    /// Whether errors of this kind belong to the response-bearing family
    #[must_use]
    pub fn carries_response(self) -> bool {
        self.entry().carries_response
    }

    /// Every registered kind
    pub fn all() -> impl Iterator<Item = Self> {
        REGISTRY.iter().map(|entry| entry.kind)
    }

    /// Kind of the error raised for an error status
    #[must_use]
    pub fn for_status(status: u16) -> Self {
        match status {
            400..=499 => Self::Client,
            500..=599 => Self::Server,
            _ => Self::BadResponse,
        }
    }
}

/// Failure reported by a transport
///
/// Carries the request that failed and, for response-bearing kinds only, the
/// response that was received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    kind: ErrorKind,
    message: String,
    request: Request,
    response: Option<Response>,
}

impl TransportError {
    /// Rebuild an error of any kind
    ///
    /// `response` is kept only when `kind` carries a response and dropped otherwise.
    #[must_use]
    pub fn rebuild(
        kind: ErrorKind,
        message: impl Into<String>,
        request: Request,
        response: Response,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            request,
            response: kind.carries_response().then_some(response),
        }
    }

    fn without_response(kind: ErrorKind, message: impl Into<String>, request: Request) -> Self {
        Self {
            kind,
            message: message.into(),
            request,
            response: None,
        }
    }

    /// Connection failure
    #[must_use]
    pub fn connect(message: impl Into<String>, request: Request) -> Self {
        Self::without_response(ErrorKind::Connect, message, request)
    }

    /// Generic send/receive failure
    #[must_use]
    pub fn request_failed(message: impl Into<String>, request: Request) -> Self {
        Self::without_response(ErrorKind::Request, message, request)
    }

    /// Transport timeout
    #[must_use]
    pub fn timeout(message: impl Into<String>, request: Request) -> Self {
        Self::without_response(ErrorKind::Timeout, message, request)
    }

    /// Redirect limit exceeded
    #[must_use]
    pub fn too_many_redirects(message: impl Into<String>, request: Request) -> Self {
        Self::without_response(ErrorKind::TooManyRedirects, message, request)
    }

    /// Error raised for an error status received from the server
    #[must_use]
    pub fn from_status(request: Request, response: Response) -> Self {
        let kind = ErrorKind::for_status(response.status);
        let label = match kind {
            ErrorKind::Client => "Client error",
            ErrorKind::Server => "Server error",
            _ => "Unsuccessful request",
        };
        let reason = StatusCode::from_u16(response.status)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or("");
        let message = format!(
            "{label}: `{} {}` resulted in a `{} {reason}` response",
            request.method, request.uri, response.status
        );

        Self {
            kind,
            message,
            request,
            response: Some(response),
        }
    }

    /// Error kind
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Error message
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Request that failed
    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Response that triggered the error, for response-bearing kinds
    #[must_use]
    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    /// Status of the carried response
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.response.as_ref().map(|response| response.status)
    }
}
