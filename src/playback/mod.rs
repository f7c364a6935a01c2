//! Record/playback client
//!
//! [`PlaybackClient`] is the async client; [`BlockingClient`] wraps it for
//! synchronous callers.

mod blocking;
mod client;

use hyper::Method;

pub use blocking::BlockingClient;
pub use client::PlaybackClient;

/// Verb names accepted by [`PlaybackClient::call`]
static VERBS: [(&str, Method); 6] = [
    ("get", Method::GET),
    ("head", Method::HEAD),
    ("put", Method::PUT),
    ("post", Method::POST),
    ("patch", Method::PATCH),
    ("delete", Method::DELETE),
];

/// Look up the method for a verb name, ignoring case
#[must_use]
pub fn verb_method(verb: &str) -> Option<Method> {
    VERBS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(verb))
        .map(|(_, method)| method.clone())
}
