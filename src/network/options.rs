//! Per-request options

use std::time::Duration;

use bytes::Bytes;
use hyper::Method;

use super::message::Request;

/// Options applied to a single request
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Extra request headers
    pub headers: Vec<(String, String)>,
    /// Query parameters appended to the URI
    pub query: Vec<(String, String)>,
    /// Raw request body
    pub body: Option<Bytes>,
    /// JSON request body, used when `body` is not set
    pub json: Option<serde_json::Value>,
    /// Override of the transport's `http_errors` setting
    pub http_errors: Option<bool>,
    /// Override of the transport's timeout
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    /// Empty options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set a raw body
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set a JSON body
    #[must_use]
    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.json = Some(value);
        self
    }

    /// Whether 4xx/5xx responses are raised as errors
    #[must_use]
    pub fn http_errors(mut self, enabled: bool) -> Self {
        self.http_errors = Some(enabled);
        self
    }

    /// Set a timeout for this request
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the request these options describe
    #[must_use]
    pub fn build_request(&self, method: Method, uri: &str) -> Request {
        let mut request = Request::new(method, append_query(uri, &self.query));

        for (name, value) in &self.headers {
            request.headers.append(name.as_str(), value.as_str());
        }

        if let Some(body) = &self.body {
            request.body = body.clone();
        } else if let Some(json) = &self.json {
            request.body = Bytes::from(json.to_string());
            if !request.headers.contains("Content-Type") {
                request.headers.append("Content-Type", "application/json");
            }
        }

        request
    }
}

/// Append encoded query parameters to a URI
fn append_query(uri: &str, query: &[(String, String)]) -> String {
    let mut uri = uri.to_string();

    if !query.is_empty() {
        uri.push(if uri.contains('?') { '&' } else { '?' });
        for (i, (key, value)) in query.iter().enumerate() {
            if i > 0 {
                uri.push('&');
            }
            uri.push_str(&urlencoding::encode(key));
            uri.push('=');
            uri.push_str(&urlencoding::encode(value));
        }
    }

    uri
}
