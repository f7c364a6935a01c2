//! Default transport on top of hyper's pooled client

use std::time::Duration;

use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::Uri;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::error::TransportError;
use super::message::{Headers, Request, Response};
use super::options::RequestOptions;
use super::{Outcome, Transport};
use crate::{PlaybackError, Result};

/// Default idle timeout of pooled connections
pub const DEFAULT_POOL_IDLE_TIMEOUT_SECS: u64 = 90;

/// Default number of idle connections kept per host
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 10;

/// Settings resolved from the pass-through configuration options
#[derive(Debug, Clone, PartialEq)]
struct TransportSettings {
    base_uri: Option<String>,
    headers: Headers,
    http_errors: bool,
    timeout: Option<Duration>,
    pool_idle_timeout: Duration,
    pool_max_idle_per_host: usize,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            base_uri: None,
            headers: Headers::new(),
            http_errors: true,
            timeout: None,
            pool_idle_timeout: Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT_SECS),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
        }
    }
}

impl TransportSettings {
    fn from_options(options: &Map<String, Value>) -> Result<Self> {
        let mut settings = Self::default();

        if let Some(value) = options.get("base_uri") {
            let base = value
                .as_str()
                .ok_or_else(|| invalid_option("base_uri", "a string"))?;
            settings.base_uri = Some(base.to_string());
        }

        if let Some(value) = options.get("headers") {
            settings.headers = serde_json::from_value(value.clone())
                .map_err(|_| invalid_option("headers", "an object of strings or string lists"))?;
        }

        if let Some(value) = options.get("http_errors") {
            settings.http_errors = value
                .as_bool()
                .ok_or_else(|| invalid_option("http_errors", "a boolean"))?;
        }

        if let Some(value) = options.get("timeout_ms") {
            let millis = value
                .as_u64()
                .ok_or_else(|| invalid_option("timeout_ms", "a non-negative integer"))?;
            settings.timeout = Some(Duration::from_millis(millis));
        }

        if let Some(value) = options.get("pool_idle_timeout_secs") {
            let secs = value
                .as_u64()
                .ok_or_else(|| invalid_option("pool_idle_timeout_secs", "a non-negative integer"))?;
            settings.pool_idle_timeout = Duration::from_secs(secs);
        }

        if let Some(value) = options.get("pool_max_idle_per_host") {
            let max = value
                .as_u64()
                .ok_or_else(|| invalid_option("pool_max_idle_per_host", "a non-negative integer"))?;
            settings.pool_max_idle_per_host = usize::try_from(max).unwrap_or(usize::MAX);
        }

        Ok(settings)
    }

    fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(
            "base_uri".to_string(),
            self.base_uri.clone().map_or(Value::Null, Value::String),
        );
        map.insert(
            "headers".to_string(),
            serde_json::to_value(&self.headers).unwrap_or_default(),
        );
        map.insert("http_errors".to_string(), Value::Bool(self.http_errors));
        map.insert(
            "timeout_ms".to_string(),
            self.timeout
                .map_or(Value::Null, |timeout| Value::from(timeout.as_millis() as u64)),
        );
        map.insert(
            "pool_idle_timeout_secs".to_string(),
            Value::from(self.pool_idle_timeout.as_secs()),
        );
        map.insert(
            "pool_max_idle_per_host".to_string(),
            Value::from(self.pool_max_idle_per_host as u64),
        );
        map
    }

    fn resolve_uri(&self, uri: &str) -> String {
        if uri.contains("://") {
            return uri.to_string();
        }

        match &self.base_uri {
            Some(base) if uri.is_empty() => base.clone(),
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                uri.trim_start_matches('/')
            ),
            None => uri.to_string(),
        }
    }

    /// Resolve the URI against the base and add default headers the request lacks
    fn prepare(&self, mut request: Request) -> Request {
        request.uri = self.resolve_uri(&request.uri);
        for (name, values) in self.headers.iter() {
            if !request.headers.contains(name) {
                request.headers.insert(name, values.to_vec());
            }
        }
        request
    }
}

fn invalid_option(name: &str, expected: &str) -> PlaybackError {
    PlaybackError::ConfigError(format!("Transport option '{name}' must be {expected}"))
}

/// HTTP transport backed by hyper's pooled client
pub struct HyperTransport {
    client: Client<HttpConnector, Full<Bytes>>,
    settings: TransportSettings,
}

impl HyperTransport {
    /// Create a transport with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(TransportSettings::default())
    }

    /// Create a transport from pass-through configuration options
    ///
    /// Unrecognized keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns error if a recognized option has the wrong type
    pub fn from_options(options: &Map<String, Value>) -> Result<Self> {
        Ok(Self::with_settings(TransportSettings::from_options(options)?))
    }

    fn with_settings(settings: TransportSettings) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(settings.pool_idle_timeout)
            .pool_max_idle_per_host(settings.pool_max_idle_per_host)
            .build_http();

        Self { client, settings }
    }

    async fn exchange(&self, request: &Request) -> Outcome {
        let uri = request.uri.parse::<Uri>().map_err(|e| {
            TransportError::request_failed(format!("Invalid URI '{}': {e}", request.uri), request.clone())
        })?;

        let mut builder = hyper::Request::builder()
            .method(request.method.clone())
            .uri(uri);
        for (name, values) in request.headers.iter() {
            for value in values {
                builder = builder.header(name, value.as_str());
            }
        }

        let http_request = builder
            .body(Full::new(request.body.clone()))
            .map_err(|e| {
                TransportError::request_failed(format!("Failed to build request: {e}"), request.clone())
            })?;

        let response = self.client.request(http_request).await.map_err(|e| {
            warn!("Request failed: {e}");
            if e.is_connect() {
                TransportError::connect(format!("Connection failed: {e}"), request.clone())
            } else {
                TransportError::request_failed(format!("Request failed: {e}"), request.clone())
            }
        })?;

        let status = response.status().as_u16();
        let headers = Headers::from_header_map(response.headers());

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| {
                TransportError::request_failed(
                    format!("Failed to read response body: {e}"),
                    request.clone(),
                )
            })?
            .to_bytes();

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn send(&self, request: Request, options: &RequestOptions) -> Outcome {
        let request = self.settings.prepare(request);
        debug!("Sending {} {}", request.method, request.uri);

        let result = match options.timeout.or(self.settings.timeout) {
            Some(limit) => match tokio::time::timeout(limit, self.exchange(&request)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("Request timed out: {} {}", request.method, request.uri);
                    Err(TransportError::timeout(
                        format!("Request timed out after {} ms", limit.as_millis()),
                        request.clone(),
                    ))
                }
            },
            None => self.exchange(&request).await,
        };
        let response = result?;

        let http_errors = options.http_errors.unwrap_or(self.settings.http_errors);
        if http_errors && response.status >= 400 {
            debug!("{} {} -> {} raised as error", request.method, request.uri, response.status);
            return Err(TransportError::from_status(request, response));
        }

        Ok(response)
    }

    fn config(&self) -> Map<String, Value> {
        self.settings.to_map()
    }
}
