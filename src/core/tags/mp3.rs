//! core/tags/mp3.rs
//! Read ID3v2 frames from an MP3 and expose them under the "easy" tag names.
//!
//! - A file with no ID3 tag is fine (empty raw tags).
//! - Only frames with a known easy name end up in the raw map.
//! - Multi-valued text frames (NUL separated) are concatenated.
//! - Stream facts (sample rate / bitrate) come from the MPEG frame probe, not the tag.

use std::path::Path;

use id3::frame::Content;
use id3::{ErrorKind, Tag};

use super::super::error::{Error, Result};
use super::super::types::{Picture, RawTags, TechnicalInfo};
use super::mpeg::{self, MpegStreamInfo};
use super::util::collect_joined;

/// Text frame id -> easy name.
fn easy_key(frame_id: &str) -> Option<&'static str> {
    let key = match frame_id {
        "TALB" => "album",
        "TBPM" => "bpm",
        "TCMP" => "compilation",
        "TCOM" => "composer",
        "TCON" => "genre",
        "TCOP" => "copyright",
        "TDOR" => "originaldate",
        "TDRC" => "date",
        "TENC" => "encodedby",
        "TEXT" => "lyricist",
        "TIT2" => "title",
        "TIT3" => "version",
        "TLAN" => "language",
        "TLEN" => "length",
        "TMED" => "media",
        "TMOO" => "mood",
        "TOLY" => "author",
        "TPE1" => "artist",
        "TPE2" => "albumartist",
        "TPE3" => "conductor",
        "TPE4" => "arranger",
        "TPOS" => "discnumber",
        "TPUB" => "organization",
        "TRCK" => "tracknumber",
        "TSO2" => "albumartistsort",
        "TSOA" => "albumsort",
        "TSOC" => "composersort",
        "TSOP" => "artistsort",
        "TSOT" => "titlesort",
        "TSRC" => "isrc",
        "TSST" => "discsubtitle",
        _ => return None,
    };
    Some(key)
}

/// TXXX description -> easy name.
fn easy_user_key(description: &str) -> Option<&'static str> {
    let key = match description {
        "MusicBrainz Artist Id" => "musicbrainz_artistid",
        "MusicBrainz Album Id" => "musicbrainz_albumid",
        "MusicBrainz Album Artist Id" => "musicbrainz_albumartistid",
        "MusicBrainz Release Track Id" => "musicbrainz_releasetrackid",
        "MusicBrainz Release Group Id" => "musicbrainz_releasegroupid",
        "MusicBrainz Album Type" => "musicbrainz_albumtype",
        "MusicBrainz Album Status" => "musicbrainz_albumstatus",
        "MusicBrainz Album Release Country" => "releasecountry",
        "ASIN" => "asin",
        "BARCODE" => "barcode",
        "CATALOGNUMBER" => "catalognumber",
        d if d.eq_ignore_ascii_case("replaygain_track_gain") => "replaygain_track_gain",
        d if d.eq_ignore_ascii_case("replaygain_track_peak") => "replaygain_track_peak",
        d if d.eq_ignore_ascii_case("replaygain_album_gain") => "replaygain_album_gain",
        d if d.eq_ignore_ascii_case("replaygain_album_peak") => "replaygain_album_peak",
        _ => return None,
    };
    Some(key)
}

fn values(text: &str) -> impl Iterator<Item = &str> {
    text.split('\0').filter(|v| !v.is_empty())
}

pub struct Mp3Tags {
    tag: Option<Tag>,
    stream: Option<MpegStreamInfo>,
}

impl Mp3Tags {
    pub fn read(path: &Path) -> Result<Self> {
        let tag = match Tag::read_from_path(path) {
            Ok(tag) => Some(tag),
            Err(e) if matches!(e.kind, ErrorKind::NoTag) => None,
            Err(e) => return Err(Error::metadata_read(path, e)),
        };

        let stream = mpeg::probe_file(path).map_err(|e| Error::metadata_read(path, e))?;

        Ok(Self { tag, stream })
    }

    pub fn raw_tags(&self) -> RawTags {
        let Some(tag) = &self.tag else {
            return RawTags::new();
        };

        let mut pairs: Vec<(&'static str, &str)> = Vec::new();
        let mut year: Vec<&str> = Vec::new();

        for frame in tag.frames() {
            match frame.content() {
                Content::Text(text) => {
                    if let Some(key) = easy_key(frame.id()) {
                        pairs.extend(values(text).map(|v| (key, v)));
                    } else if frame.id() == "TYER" {
                        year.extend(values(text));
                    }
                }
                Content::ExtendedText(ext) => {
                    if let Some(key) = easy_user_key(&ext.description) {
                        pairs.extend(values(&ext.value).map(|v| (key, v)));
                    }
                }
                Content::Link(url) if frame.id() == "WOAR" => {
                    pairs.push(("website", url.as_str()))
                }
                _ => {}
            }
        }

        let mut raw = collect_joined(pairs);

        // ID3v2.3 keeps the year in TYER; only use it when there is no TDRC.
        if !raw.contains_key("date") && !year.is_empty() {
            raw.extend(collect_joined(year.into_iter().map(|v| ("date", v))));
        }

        raw
    }

    /// First APIC (or v2.2 PIC) frame.
    pub fn picture(&self) -> Option<Picture> {
        let tag = self.tag.as_ref()?;
        tag.frames()
            .filter(|f| f.id() == "APIC" || f.id() == "PIC")
            .find_map(|f| match f.content() {
                Content::Picture(p) => Some(Picture {
                    data: p.data.clone(),
                    mime_type: Some(p.mime_type.clone()).filter(|m| !m.is_empty()),
                }),
                _ => None,
            })
    }

    pub fn technical(&self) -> TechnicalInfo {
        match &self.stream {
            Some(s) => TechnicalInfo {
                sample_rate_hz: s.sample_rate,
                bitrate_kbps: Some(s.bitrate_kbps),
                bitrate_mode: Some(s.mode.as_str().to_string()),
                bits_per_sample: None,
            },
            None => TechnicalInfo::default(),
        }
    }
}
