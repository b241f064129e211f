//! Core data types shared between core logic and its callers.
//!
//! Rule of thumb:
//! - These structs should be “boring bags of data”
//! - No filesystem code
//! - No tag parsing code
//!
//! `TrackMetadata` is what the player shows for ONE audio file.
//! `PlaylistEntry` is what the playlist remembers about ONE audio file.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Flat tag map as read from a file.
///
/// Keys are lower-case "easy" names (`album`, `artist`, `tracknumber`, ...).
/// BTreeMap keeps them sorted for the full tag view.
pub type RawTags = BTreeMap<String, String>;

/// Name of the built-in image shown when a file has no embedded cover.
pub const PLACEHOLDER_ARTWORK: &str = "nocover.png";

/// Value shown for album/artist/title/track number when the tag is missing.
pub const UNKNOWN_FIELD: &str = "??";

/// The two containers we read tags from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Mp3,
    Flac,
}

impl ContainerKind {
    /// Decide the container from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("mp3") {
            Some(Self::Mp3)
        } else if ext.eq_ignore_ascii_case("flac") {
            Some(Self::Flac)
        } else {
            None
        }
    }
}

/// One embedded picture, as stored in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picture {
    pub data: Vec<u8>,
    pub mime_type: Option<String>,
}

/// Stream facts that do not live in the tag block.
///
/// - `bitrate_*` only for lossy (MP3) sources
/// - `bits_per_sample` only for lossless (FLAC) sources
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TechnicalInfo {
    pub sample_rate_hz: u32,
    pub bitrate_kbps: Option<u32>,
    pub bitrate_mode: Option<String>,
    pub bits_per_sample: Option<u32>,
}

/// Cover art to display. Never "nothing": files without a picture get the placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Artwork {
    Embedded {
        data: Vec<u8>,
        mime_type: Option<String>,
    },
    #[default]
    Placeholder,
}

impl Artwork {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }

    /// Raw picture bytes, or None when the placeholder should be drawn.
    pub fn embedded_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Embedded { data, .. } => Some(data),
            Self::Placeholder => None,
        }
    }
}

impl From<Option<Picture>> for Artwork {
    fn from(picture: Option<Picture>) -> Self {
        match picture {
            Some(p) => Self::Embedded {
                data: p.data,
                mime_type: p.mime_type,
            },
            None => Self::Placeholder,
        }
    }
}

/// Canonical metadata record, identical in shape for MP3 and FLAC.
///
/// Produced fresh per extraction; only lives as long as the display needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    pub album: String,
    pub artist: String,
    pub title: String,
    pub track_number: String,
    pub date: String,
    pub genre: String,
    pub description: String,

    pub sample_rate_hz: u32,
    pub bitrate_kbps: Option<u32>,
    pub bitrate_mode: Option<String>,
    pub bits_per_sample: Option<u32>,

    pub artwork: Artwork,

    /// Every raw tag, sorted by key.
    pub all_tags: RawTags,
}

impl Default for TrackMetadata {
    fn default() -> Self {
        Self {
            album: UNKNOWN_FIELD.to_string(),
            artist: UNKNOWN_FIELD.to_string(),
            title: UNKNOWN_FIELD.to_string(),
            track_number: UNKNOWN_FIELD.to_string(),
            date: String::new(),
            genre: String::new(),
            description: String::new(),

            sample_rate_hz: 0,
            bitrate_kbps: None,
            bitrate_mode: None,
            bits_per_sample: None,

            artwork: Artwork::Placeholder,
            all_tags: RawTags::new(),
        }
    }
}

impl TrackMetadata {
    /// "{track} - {artist} - {album} - {title}", used as the window title.
    pub fn window_title(&self) -> String {
        format!(
            "{} - {} - {} - {}",
            self.track_number, self.artist, self.album, self.title
        )
    }

    pub fn sample_rate_label(&self) -> String {
        format!("{} Hz", self.sample_rate_hz)
    }

    /// "320 kb/s", or empty for sources without a bitrate.
    pub fn bitrate_label(&self) -> String {
        self.bitrate_kbps
            .map(|kbps| format!("{kbps} kb/s"))
            .unwrap_or_default()
    }

    pub fn bits_per_sample_label(&self) -> String {
        self.bits_per_sample
            .map(|b| b.to_string())
            .unwrap_or_default()
    }
}

/// One line of the playlist.
///
/// `source_uri` is a local path or a `file://` URI, exactly as it will be written
/// to the playlist file. `display_name` is its file-name part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub source_uri: String,
    pub display_name: String,
}

const FILE_URI_PREFIX: &str = "file://";

impl PlaylistEntry {
    /// Entry for a local file. Relative paths are made absolute against the
    /// working directory (no filesystem access).
    pub fn from_path(path: &Path) -> Self {
        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        Self::from_uri(&path.to_string_lossy())
    }

    pub fn from_uri(uri: &str) -> Self {
        let local = uri.strip_prefix(FILE_URI_PREFIX).unwrap_or(uri);
        let display_name = Path::new(local)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| local.to_string());

        Self {
            source_uri: uri.to_string(),
            display_name,
        }
    }

    /// Local filesystem path for the transport.
    pub fn path(&self) -> PathBuf {
        let local = self
            .source_uri
            .strip_prefix(FILE_URI_PREFIX)
            .unwrap_or(&self.source_uri);
        PathBuf::from(local)
    }
}

/// How `advance()`/`retreat()` pick the next entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackMode {
    #[default]
    Sequential,
    LoopAll,
    LoopOne,
    Shuffle,
}

impl PlaybackMode {
    /// Fixed cycle: Sequential -> LoopAll -> LoopOne -> Shuffle -> Sequential.
    pub fn cycled(self) -> Self {
        match self {
            Self::Sequential => Self::LoopAll,
            Self::LoopAll => Self::LoopOne,
            Self::LoopOne => Self::Shuffle,
            Self::Shuffle => Self::Sequential,
        }
    }
}

impl fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sequential => "sequential",
            Self::LoopAll => "loop all",
            Self::LoopOne => "loop one",
            Self::Shuffle => "shuffle",
        };
        f.write_str(name)
    }
}
