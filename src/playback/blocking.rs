//! Synchronous facade over [`PlaybackClient`]

use std::path::PathBuf;

use hyper::Method;
use serde_json::{Map, Value};
use tokio::runtime::{Builder, Runtime};

use super::PlaybackClient;
use crate::config::{ClientConfig, Mode};
use crate::network::{Request, RequestOptions, Response, Transport};
use crate::Result;

/// Blocking record/playback client
///
/// Drives a [`PlaybackClient`] on its own current-thread runtime. Must not be
/// used from within an async context.
pub struct BlockingClient {
    // Dropped before the runtime
    inner: PlaybackClient,
    runtime: Runtime,
}

impl BlockingClient {
    /// Create a client over the default hyper transport
    ///
    /// # Errors
    ///
    /// Returns error if the runtime cannot be started or the client cannot be created
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::from_client(PlaybackClient::new(config)?)
    }

    /// Create a client over a custom transport
    ///
    /// # Errors
    ///
    /// Returns error if the runtime cannot be started or the client cannot be created
    pub fn with_transport<T>(config: ClientConfig, transport: T) -> Result<Self>
    where
        T: Transport + 'static,
    {
        Self::from_client(PlaybackClient::with_transport(config, transport)?)
    }

    /// Wrap an existing client
    ///
    /// # Errors
    ///
    /// Returns error if the runtime cannot be started
    pub fn from_client(inner: PlaybackClient) -> Result<Self> {
        Ok(Self {
            inner,
            runtime: build_runtime()?,
        })
    }

    /// See [`PlaybackClient::request`]
    ///
    /// # Errors
    ///
    /// Same as [`PlaybackClient::request`]
    pub fn request(&mut self, method: Method, uri: &str, options: RequestOptions) -> Result<Response> {
        self.runtime.block_on(self.inner.request(method, uri, options))
    }

    /// See [`PlaybackClient::send`]
    ///
    /// # Errors
    ///
    /// Same as [`PlaybackClient::send`]
    pub fn send(&mut self, request: Request, options: RequestOptions) -> Result<Response> {
        self.runtime.block_on(self.inner.send(request, options))
    }

    /// See [`PlaybackClient::call`]
    ///
    /// # Errors
    ///
    /// Same as [`PlaybackClient::call`]
    pub fn call(&mut self, verb: &str, uri: &str, options: RequestOptions) -> Result<Response> {
        self.runtime.block_on(self.inner.call(verb, uri, options))
    }

    /// See [`PlaybackClient::end_recording`]
    ///
    /// # Errors
    ///
    /// Same as [`PlaybackClient::end_recording`]
    pub fn end_recording(&mut self) -> Result<()> {
        self.inner.end_recording()
    }

    /// See [`PlaybackClient::change_record_location_and_file`]
    ///
    /// # Errors
    ///
    /// Same as [`PlaybackClient::change_record_location_and_file`]
    pub fn change_record_location_and_file(
        &mut self,
        location: impl Into<PathBuf>,
        file_name: impl Into<String>,
    ) -> Result<()> {
        self.inner.change_record_location_and_file(location, file_name)
    }

    /// See [`PlaybackClient::switch_mode`]
    ///
    /// # Errors
    ///
    /// Same as [`PlaybackClient::switch_mode`]
    pub fn switch_mode(&mut self, mode: Mode) -> Result<()> {
        self.inner.switch_mode(mode)
    }

    /// Current mode
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.inner.mode()
    }

    /// Number of outcomes waiting in the queue
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.pending()
    }

    /// See [`PlaybackClient::config`]
    #[must_use]
    pub fn config(&self) -> Map<String, Value> {
        self.inner.config()
    }

    /// See [`PlaybackClient::config_value`]
    #[must_use]
    pub fn config_value(&self, name: &str) -> Option<Value> {
        self.inner.config_value(name)
    }

    /// Flush any active recording and release the client
    ///
    /// # Errors
    ///
    /// Returns error if the recording file cannot be written
    pub fn close(self) -> Result<()> {
        self.inner.close()
    }

    /// Unwrap the async client
    #[must_use]
    pub fn into_inner(self) -> PlaybackClient {
        self.inner
    }
}

fn build_runtime() -> Result<Runtime> {
    Ok(Builder::new_current_thread().enable_all().build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::fake::ScriptedTransport;
    use crate::PlaybackError;
    use tempfile::TempDir;

    #[test]
    fn test_blocking_record_then_playback() {
        let dir = TempDir::new().unwrap();

        let mut recorder = BlockingClient::with_transport(
            ClientConfig::new(Mode::Record).with_record_location(dir.path()),
            ScriptedTransport::new(vec![
                Ok(Response::new(200).with_body("one")),
                Ok(Response::new(200).with_body("two")),
            ]),
        )
        .unwrap();
        recorder.call("get", "/one", RequestOptions::new()).unwrap();
        recorder.call("post", "/two", RequestOptions::new()).unwrap();
        assert_eq!(recorder.pending(), 2);
        recorder.close().unwrap();

        let mut player = BlockingClient::with_transport(
            ClientConfig::new(Mode::Playback).with_record_location(dir.path()),
            ScriptedTransport::new(vec![]),
        )
        .unwrap();
        assert_eq!(player.request(Method::GET, "/", RequestOptions::new()).unwrap().text(), "one");
        assert_eq!(
            player
                .send(Request::new(Method::GET, "/"), RequestOptions::new())
                .unwrap()
                .text(),
            "two"
        );
        assert!(matches!(
            player.request(Method::GET, "/", RequestOptions::new()),
            Err(PlaybackError::PlaybackExhausted)
        ));
    }

    #[test]
    fn test_blocking_new_builds_hyper_transport() {
        let client = BlockingClient::new(
            ClientConfig::new(Mode::Live).with_option("base_uri", "http://localhost:8080"),
        )
        .unwrap();

        assert_eq!(client.mode(), Mode::Live);
        assert_eq!(
            client.config_value("base_uri"),
            Some(Value::from("http://localhost:8080"))
        );
        assert_eq!(client.config_value("http_errors"), Some(Value::Bool(true)));
    }
}
