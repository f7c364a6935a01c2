//! Error types for http-playback

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::network::TransportError;

/// Result type for http-playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// Errors that can occur while recording or replaying HTTP traffic
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Failure reported by the underlying transport, live or replayed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Playback requested a response but no recorded exchange is left
    #[error("Playback exhausted: no recorded exchange left to replay")]
    PlaybackExhausted,

    /// Recording file does not exist
    #[error("Recording file not found: {}", .0.display())]
    RecordingNotFound(PathBuf),

    /// Recording file content is not a valid exchange array
    #[error("Malformed recording: {0}")]
    MalformedRecording(String),

    /// A recorded error kind has no constructor in the kind registry
    #[error("Unknown error kind: {0}")]
    UnknownErrorKind(String),

    /// A verb name that is not in the verb table
    #[error("Unknown HTTP verb: {0}")]
    UnknownVerb(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl PlaybackError {
    /// The transport error behind this failure, if any
    #[must_use]
    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}
