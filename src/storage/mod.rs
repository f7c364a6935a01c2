//! Recording persistence: the exchange codec, the JSON file format and file access

pub mod codec;
mod format;
mod store;

pub use format::{
    BodyEncoding, ErrorSnapshot, ExchangeRecord, RequestSnapshot, ResponseSnapshot,
    SENTINEL_STATUS,
};
pub use store::RecordingStore;

/// Default recording file name
pub const DEFAULT_RECORD_FILE_NAME: &str = "saveState.json";
