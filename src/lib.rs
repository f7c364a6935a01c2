//! http-playback - record HTTP interactions once, replay them in tests
//!
//! A [`PlaybackClient`] wraps an HTTP transport and runs in one of three
//! modes: live (pass-through), record (pass-through plus capture to a JSON
//! file), or playback (serve captured outcomes in order, no network).

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation,
    clippy::multiple_crate_versions
)]

pub mod config;
pub mod error;
pub mod factory;
pub mod network;
pub mod playback;
pub mod storage;

pub use config::{ClientConfig, Mode};
pub use error::{PlaybackError, Result};
pub use factory::{ClientHandle, ClientRegistry};
pub use network::{Request, RequestOptions, Response, Transport, TransportError};
pub use playback::{BlockingClient, PlaybackClient};
