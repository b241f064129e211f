//! core/tags/flac.rs
//! Vorbis comments, pictures and STREAMINFO facts from a FLAC file (via symphonia).

use std::fs::File;
use std::path::Path;

use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{Limit, MetadataOptions, MetadataRevision, Value};
use symphonia::core::probe::Hint;
use symphonia::default::get_probe;
use tracing::debug;

use super::super::error::{Error, Result};
use super::super::types::{Picture, RawTags, TechnicalInfo};
use super::util::collect_joined;

pub struct FlacTags {
    comments: Vec<(String, String)>,
    pictures: Vec<Picture>,
    sample_rate: u32,
    bits_per_sample: Option<u32>,
}

impl FlacTags {
    /// Read comments, pictures and stream facts.
    ///
    /// The FLAC demuxer needs at least one audio frame after the metadata
    /// blocks: a file that stops right after them is a read error, even when
    /// its comment block is intact.
    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::metadata_read(path, e))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        hint.with_extension("flac");

        let meta_opts = MetadataOptions {
            limit_visual_bytes: Limit::Maximum(16 * 1024 * 1024),
            ..Default::default()
        };

        let mut probed = get_probe()
            .format(&hint, mss, &FormatOptions::default(), &meta_opts)
            .map_err(|e| Error::metadata_read(path, e))?;

        let mut out = Self {
            comments: Vec::new(),
            pictures: Vec::new(),
            sample_rate: 0,
            bits_per_sample: None,
        };

        // Anything found while probing (before the FLAC reader took over).
        if let Some(mut m) = probed.metadata.get() {
            if let Some(rev) = m.skip_to_latest() {
                out.absorb(rev);
            }
        }

        {
            let mut m = probed.format.metadata();
            if let Some(rev) = m.skip_to_latest() {
                out.absorb(rev);
            }
        }

        if let Some(track) = probed.format.default_track() {
            let cp = &track.codec_params;
            out.sample_rate = cp.sample_rate.unwrap_or(0);
            out.bits_per_sample = cp.bits_per_sample;
        }

        debug!(
            path = %path.display(),
            comments = out.comments.len(),
            pictures = out.pictures.len(),
            sample_rate = out.sample_rate,
            "flac metadata read"
        );

        Ok(out)
    }

    fn absorb(&mut self, rev: &MetadataRevision) {
        for tag in rev.tags() {
            let key = tag.key.trim().to_ascii_lowercase();
            if key.is_empty() {
                continue;
            }
            let value = match &tag.value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            self.comments.push((key, value));
        }

        for visual in rev.visuals() {
            self.pictures.push(Picture {
                data: visual.data.to_vec(),
                mime_type: Some(visual.media_type.clone()).filter(|m| !m.is_empty()),
            });
        }
    }

    pub fn raw_tags(&self) -> RawTags {
        collect_joined(self.comments.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    pub fn picture(&self) -> Option<Picture> {
        self.pictures.first().cloned()
    }

    pub fn technical(&self) -> TechnicalInfo {
        TechnicalInfo {
            sample_rate_hz: self.sample_rate,
            bitrate_kbps: None,
            bitrate_mode: None,
            bits_per_sample: self.bits_per_sample,
        }
    }
}
