//! core/tags/mod.rs
//!
//! Tag reading for the two supported containers.
//! Public API:
//! - [`TagSource`] opens a file as MP3 or FLAC and exposes raw tags / picture / stream facts.
//! - [`read_tags`] returns the raw pieces, or an error.
//! - [`read_track_metadata`] returns a `TrackMetadata` (non-fatal on read failure).

mod flac;
mod mp3;
pub mod mpeg;
mod normalize;
mod util;

use std::path::Path;

use tracing::{debug, warn};

use super::error::{Error, Result};
use super::types::{ContainerKind, Picture, RawTags, TechnicalInfo, TrackMetadata};

pub use flac::FlacTags;
pub use mp3::Mp3Tags;
pub use normalize::normalize;
pub use util::MULTI_VALUE_SEPARATOR;

/// One opened file, whichever container it is.
pub enum TagSource {
    Mp3(Mp3Tags),
    Flac(FlacTags),
}

impl TagSource {
    pub fn open(path: &Path) -> Result<Self> {
        match ContainerKind::from_path(path) {
            Some(ContainerKind::Mp3) => Ok(Self::Mp3(Mp3Tags::read(path)?)),
            Some(ContainerKind::Flac) => Ok(Self::Flac(FlacTags::read(path)?)),
            None => Err(Error::UnsupportedFormat(path.to_path_buf())),
        }
    }

    pub fn kind(&self) -> ContainerKind {
        match self {
            Self::Mp3(_) => ContainerKind::Mp3,
            Self::Flac(_) => ContainerKind::Flac,
        }
    }

    pub fn raw_tags(&self) -> RawTags {
        match self {
            Self::Mp3(t) => t.raw_tags(),
            Self::Flac(t) => t.raw_tags(),
        }
    }

    pub fn technical(&self) -> TechnicalInfo {
        match self {
            Self::Mp3(t) => t.technical(),
            Self::Flac(t) => t.technical(),
        }
    }

    pub fn first_picture(&self) -> Option<Picture> {
        match self {
            Self::Mp3(t) => t.picture(),
            Self::Flac(t) => t.picture(),
        }
    }
}

/// Everything the normalizer needs from one file.
#[derive(Debug, Clone, Default)]
pub struct ExtractedTags {
    pub raw: RawTags,
    pub technical: TechnicalInfo,
    pub picture: Option<Picture>,
}

pub fn read_tags(path: &Path) -> Result<ExtractedTags> {
    let source = TagSource::open(path)?;
    let out = ExtractedTags {
        raw: source.raw_tags(),
        technical: source.technical(),
        picture: source.first_picture(),
    };
    debug!(
        path = %path.display(),
        kind = ?source.kind(),
        tags = out.raw.len(),
        picture = out.picture.is_some(),
        "tags read"
    );
    Ok(out)
}

/// Read and normalize one file.
///
/// - Never fails: unreadable files give the defaulted record
/// - Returns (metadata, read_failed)
pub fn read_track_metadata(path: &Path) -> (TrackMetadata, bool) {
    match read_tags(path) {
        Ok(t) => (normalize(t.raw, t.technical, t.picture), false),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "metadata read failed, using defaults");
            (TrackMetadata::default(), true)
        }
    }
}
