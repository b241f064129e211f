//! core/error.rs
//! Error type shared by the core.
//!
//! - Tag failures never leave `core::tags` (callers get default metadata).
//! - `IndexOutOfRange` means the caller broke the playlist contract.
//! - Persistence failures are logged by the session, never fatal.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// File extension is not one we know how to read.
    #[error("unsupported format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// File unreadable, or its tag block could not be parsed.
    #[error("could not read metadata from {}: {reason}", path.display())]
    MetadataRead { path: PathBuf, reason: String },

    /// `set_current_index` with an index past the end of the playlist.
    #[error("playlist index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Saving/loading/deleting the session playlist failed.
    #[error("playlist persistence failed for {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Playlist file could not be understood.
    #[error("playlist parse error: {0}")]
    PlaylistParse(String),

    /// Unknown settings key or wrong value type.
    #[error("settings error: {0}")]
    Settings(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn metadata_read(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::MetadataRead {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
