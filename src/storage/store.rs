//! Recording file access

use std::fs;
use std::io;
use std::path::{Path, PathBuf, MAIN_SEPARATOR, MAIN_SEPARATOR_STR};

use tracing::{debug, info};

use super::format::ExchangeRecord;
use crate::{PlaybackError, Result};

/// Stateless reader/writer of recording files
pub struct RecordingStore;

impl RecordingStore {
    /// Join a directory and a file name with the platform separator
    ///
    /// Both `/` and `\` in either input are replaced by the platform separator.
    #[must_use]
    pub fn resolve_path(directory: &Path, file_name: &str) -> PathBuf {
        let joined = format!("{}{MAIN_SEPARATOR}{file_name}", directory.to_string_lossy());
        PathBuf::from(joined.replace(['/', '\\'], MAIN_SEPARATOR_STR))
    }

    /// Read a recording file
    ///
    /// # Errors
    ///
    /// Returns `RecordingNotFound` if the file does not exist, `Io` if it cannot be read
    pub fn read(path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                PlaybackError::RecordingNotFound(path.to_path_buf())
            } else {
                PlaybackError::Io(e)
            }
        })
    }

    /// Write a recording file, creating its parent directories
    ///
    /// # Errors
    ///
    /// Returns error if a directory or the file cannot be written
    pub fn write(path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            if !parent.is_dir() {
                debug!("Creating recording directory: {}", parent.display());
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, bytes)?;
        Ok(())
    }

    /// Read and parse a recording file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not a valid exchange array
    pub fn load(path: &Path) -> Result<Vec<ExchangeRecord>> {
        let bytes = Self::read(path)?;
        let records: Vec<ExchangeRecord> = serde_json::from_slice(&bytes).map_err(|e| {
            PlaybackError::MalformedRecording(format!("{}: {e}", path.display()))
        })?;

        debug!("Loaded {} exchanges from {}", records.len(), path.display());
        Ok(records)
    }

    /// Serialize and write records
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written
    pub fn save(path: &Path, records: &[ExchangeRecord]) -> Result<()> {
        let bytes = serde_json::to_vec(records).map_err(io::Error::from)?;
        Self::write(path, &bytes)?;

        info!("Saved {} exchanges to {}", records.len(), path.display());
        Ok(())
    }
}
