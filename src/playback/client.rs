//! Mode-switching HTTP client

use std::collections::VecDeque;
use std::path::PathBuf;

use hyper::Method;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, Mode};
use crate::network::{
    HyperTransport, Outcome, Request, RequestOptions, Response, Transport,
};
use crate::storage::{codec, RecordingStore};
use crate::{PlaybackError, Result};

use super::verb_method;

/// HTTP client that passes requests through, records them, or plays them back
///
/// In [`Mode::Record`] every outcome, success or transport error, is queued
/// and returned unchanged. The queue is written to the recording file by
/// [`end_recording`](Self::end_recording), [`close`](Self::close), or when
/// the client is dropped. In [`Mode::Playback`] the queue is loaded from the
/// recording file at construction and consumed front to back, one entry per
/// request, whatever the request is.
pub struct PlaybackClient {
    config: ClientConfig,
    queue: VecDeque<Outcome>,
    transport: Box<dyn Transport>,
    finalized: bool,
}

impl PlaybackClient {
    /// Create a client over the default hyper transport
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or, in playback mode,
    /// the recording cannot be loaded
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HyperTransport::from_options(&config.options)?;
        Self::from_parts(config, Box::new(transport))
    }

    /// Create a client over a custom transport
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or, in playback mode,
    /// the recording cannot be loaded
    pub fn with_transport<T>(config: ClientConfig, transport: T) -> Result<Self>
    where
        T: Transport + 'static,
    {
        Self::from_parts(config, Box::new(transport))
    }

    pub(crate) fn from_parts(config: ClientConfig, transport: Box<dyn Transport>) -> Result<Self> {
        config.validate()?;

        let queue = Self::initial_queue(&config)?;
        let client = Self {
            config,
            queue,
            transport,
            finalized: false,
        };

        debug!("Created playback client in {:?} mode", client.config.mode);
        Ok(client)
    }

    /// Current mode
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.config.mode
    }

    /// Number of outcomes waiting in the queue
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Path of the recording file, if a location is configured
    #[must_use]
    pub fn record_path(&self) -> Option<PathBuf> {
        self.config.record_path()
    }

    /// Build a request from `options` and dispatch it
    ///
    /// # Errors
    ///
    /// Returns the transport error (live, recorded or replayed), or
    /// `PlaybackExhausted` when no recorded exchange is left
    pub async fn request(
        &mut self,
        method: Method,
        uri: &str,
        options: RequestOptions,
    ) -> Result<Response> {
        let request = options.build_request(method, uri);
        self.dispatch(request, &options).await
    }

    /// Dispatch a prepared request
    ///
    /// # Errors
    ///
    /// Same as [`request`](Self::request)
    pub async fn send(&mut self, request: Request, options: RequestOptions) -> Result<Response> {
        self.dispatch(request, &options).await
    }

    /// Dispatch by verb name (`get`, `head`, `put`, `post`, `patch`, `delete`)
    ///
    /// # Errors
    ///
    /// Returns `UnknownVerb` for a name outside the verb table, otherwise same
    /// as [`request`](Self::request)
    pub async fn call(
        &mut self,
        verb: &str,
        uri: &str,
        options: RequestOptions,
    ) -> Result<Response> {
        let method =
            verb_method(verb).ok_or_else(|| PlaybackError::UnknownVerb(verb.to_string()))?;
        self.request(method, uri, options).await
    }

    async fn dispatch(&mut self, request: Request, options: &RequestOptions) -> Result<Response> {
        let outcome = match self.config.mode {
            Mode::Playback => {
                debug!("Playback: {} {} ({} left)", request.method, request.uri, self.queue.len());
                self.queue
                    .pop_front()
                    .ok_or(PlaybackError::PlaybackExhausted)?
            }
            Mode::Live | Mode::Record => self.transport.send(request, options).await,
        };

        if self.config.mode.is_record() {
            self.queue.push_back(outcome.clone());
            debug!("Recorded exchange #{}", self.queue.len());
        }

        outcome.map_err(PlaybackError::from)
    }

    /// Transport configuration merged with this client's pass-through options
    ///
    /// The client's options win on key collisions.
    #[must_use]
    pub fn config(&self) -> Map<String, Value> {
        let mut merged = self.transport.config();
        merged.extend(self.config.options.clone());
        merged
    }

    /// A single configuration value
    #[must_use]
    pub fn config_value(&self, name: &str) -> Option<Value> {
        self.config().remove(name)
    }

    /// Flush the recording and switch to live mode
    ///
    /// Does nothing unless recording, so calling it twice writes once. When
    /// the write fails the client keeps recording with its queue intact, so a
    /// later call or the drop-time flush can still save it.
    ///
    /// # Errors
    ///
    /// Returns error if the recording file cannot be written
    pub fn end_recording(&mut self) -> Result<()> {
        if !self.config.mode.is_record() {
            return Ok(());
        }

        let path = self.config.record_path().ok_or_else(|| {
            PlaybackError::ConfigError("Cannot save recording without a record location".to_string())
        })?;
        let records = codec::encode_all(&self.queue);
        RecordingStore::save(&path, &records)?;

        self.config.mode = Mode::Live;
        self.queue.clear();

        info!("Recording ended: {} exchanges saved", records.len());
        Ok(())
    }

    /// Point the client at another recording file
    ///
    /// An active recording is flushed to the old file first and then resumes
    /// into the new one. In playback mode the new file is loaded; if that
    /// fails the client keeps its current file and queue.
    ///
    /// # Errors
    ///
    /// Returns error if the new location is invalid, the old recording cannot
    /// be written, or the new recording cannot be loaded
    pub fn change_record_location_and_file(
        &mut self,
        location: impl Into<PathBuf>,
        file_name: impl Into<String>,
    ) -> Result<()> {
        let mut next = self.config.clone();
        next.record_location = Some(location.into());
        next.record_file_name = file_name.into();
        next.validate()?;

        self.end_recording()?;
        self.commit(next)
    }

    /// Change mode explicitly
    ///
    /// An active recording is flushed first. Entering playback loads the
    /// recording file; if that fails the client stays in its current mode.
    ///
    /// # Errors
    ///
    /// Returns error if the mode needs a missing record location, the active
    /// recording cannot be written, or the recording cannot be loaded
    pub fn switch_mode(&mut self, mode: Mode) -> Result<()> {
        let mut next = self.config.clone();
        next.mode = mode;
        next.validate()?;

        self.end_recording()?;
        self.commit(next)
    }

    /// Flush any active recording and release the client
    ///
    /// # Errors
    ///
    /// Returns error if the recording file cannot be written
    pub fn close(mut self) -> Result<()> {
        self.finalized = true;
        self.end_recording()
    }

    /// Adopt `config` together with the queue it starts with
    fn commit(&mut self, config: ClientConfig) -> Result<()> {
        let queue = Self::initial_queue(&config)?;
        self.config = config;
        self.queue = queue;
        Ok(())
    }

    /// Empty for live and record, the decoded recording for playback
    fn initial_queue(config: &ClientConfig) -> Result<VecDeque<Outcome>> {
        if !config.mode.is_playback() {
            return Ok(VecDeque::new());
        }

        let path = config.record_path().ok_or_else(|| {
            PlaybackError::ConfigError("Playback mode requires a record location".to_string())
        })?;
        let records = RecordingStore::load(&path)?;
        let queue = codec::decode_all(&records)?;

        info!(
            "Loaded {} exchanges for playback from {}",
            queue.len(),
            path.display()
        );
        Ok(queue)
    }
}

impl Drop for PlaybackClient {
    fn drop(&mut self) {
        if self.finalized {
            return;
        }
        self.finalized = true;

        if let Err(e) = self.end_recording() {
            warn!("Failed to save recording on drop: {e}");
        }
    }
}
