//! core/tags/normalize.rs
//! Raw tag map + stream facts -> `TrackMetadata`.
//!
//! Pure: no IO, same input always gives the same record.

use super::super::types::{Artwork, Picture, RawTags, TechnicalInfo, TrackMetadata, UNKNOWN_FIELD};

fn field_or(raw: &RawTags, key: &str, default: &str) -> String {
    raw.get(key)
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

pub fn normalize(raw: RawTags, technical: TechnicalInfo, picture: Option<Picture>) -> TrackMetadata {
    TrackMetadata {
        album: field_or(&raw, "album", UNKNOWN_FIELD),
        artist: field_or(&raw, "artist", UNKNOWN_FIELD),
        title: field_or(&raw, "title", UNKNOWN_FIELD),
        track_number: field_or(&raw, "tracknumber", UNKNOWN_FIELD),
        date: field_or(&raw, "date", ""),
        genre: field_or(&raw, "genre", ""),
        description: field_or(&raw, "description", ""),

        sample_rate_hz: technical.sample_rate_hz,
        bitrate_kbps: technical.bitrate_kbps,
        bitrate_mode: technical.bitrate_mode,
        bits_per_sample: technical.bits_per_sample,

        artwork: Artwork::from(picture),
        all_tags: raw,
    }
}
