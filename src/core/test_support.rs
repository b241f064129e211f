//! core/test_support.rs
//! Fixtures for unit tests: scratch directories and tiny MP3/FLAC files built in memory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use id3::{Tag, TagLike, Version};

static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

/// Scratch directory under the system temp dir, removed on drop.
pub(crate) struct TempDir {
    path: PathBuf,
}

impl TempDir {
    pub(crate) fn new(label: &str) -> Self {
        let n = NEXT_DIR.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "mosaic-test-{label}-{}-{n}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("create temp dir");
        Self { path }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Write `bytes` at `rel` (parents created) and return the full path.
    pub(crate) fn write(&self, rel: &str, bytes: &[u8]) -> PathBuf {
        let full = self.path.join(rel);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).expect("create fixture parent");
        }
        fs::write(&full, bytes).expect("write fixture");
        full
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// MPEG-1 Layer III, 44.1 kHz, stereo, no CRC.
/// `bitrate_index` 9 = 128 kb/s, 14 = 320 kb/s.
pub(crate) fn mpeg_frames(count: usize, bitrate_index: u8) -> Vec<u8> {
    let kbps: u32 = match bitrate_index {
        9 => 128,
        14 => 320,
        _ => panic!("unsupported fixture bitrate index {bitrate_index}"),
    };
    let frame_len = (144 * kbps * 1000 / 44_100) as usize;

    let mut out = Vec::with_capacity(frame_len * count);
    for _ in 0..count {
        out.extend_from_slice(&[0xFF, 0xFB, bitrate_index << 4, 0x00]);
        out.resize(out.len() + frame_len - 4, 0);
    }
    out
}

/// An MP3 file: optional ID3v2.4 tag followed by a few 320 kb/s frames.
pub(crate) fn mp3_bytes(tag: Option<&Tag>) -> Vec<u8> {
    let mut out = Vec::new();
    if let Some(tag) = tag {
        tag.write_to(&mut out, Version::Id3v24).expect("write id3 fixture");
    }
    out.extend(mpeg_frames(4, 14));
    out
}

/// The tags carried by the reference MP3 fixture.
pub(crate) fn ghosts_mp3_tag() -> Tag {
    let mut tag = Tag::new();
    tag.set_album("Ghosts I-IV");
    tag.set_artist("Nine Inch Nails");
    tag.set_title("1 Ghosts I");
    tag.set_track(1);
    tag.set_genre("Ambient");
    tag
}

fn flac_block(out: &mut Vec<u8>, kind: u8, last: bool, body: &[u8]) {
    let header = if last { 0x80 | kind } else { kind };
    let len = body.len() as u32;
    out.push(header);
    out.extend_from_slice(&len.to_be_bytes()[1..]);
    out.extend_from_slice(body);
}

fn streaminfo(sample_rate: u32, channels: u8, bits_per_sample: u8) -> Vec<u8> {
    let mut body = Vec::with_capacity(34);
    body.extend_from_slice(&4096u16.to_be_bytes()); // min block
    body.extend_from_slice(&4096u16.to_be_bytes()); // max block
    body.extend_from_slice(&[0, 0, 0]); // min frame size (unknown)
    body.extend_from_slice(&[0, 0, 0]); // max frame size (unknown)

    let packed: u64 = (u64::from(sample_rate) << 44)
        | (u64::from(channels - 1) << 41)
        | (u64::from(bits_per_sample - 1) << 36);
    body.extend_from_slice(&packed.to_be_bytes());
    body.extend_from_slice(&[0u8; 16]); // md5
    body
}

fn vorbis_comment(comments: &[(&str, &str)]) -> Vec<u8> {
    let vendor = b"mosaic test";
    let mut body = Vec::new();
    body.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
    body.extend_from_slice(vendor);
    body.extend_from_slice(&(comments.len() as u32).to_le_bytes());
    for (key, value) in comments {
        let field = format!("{key}={value}");
        body.extend_from_slice(&(field.len() as u32).to_le_bytes());
        body.extend_from_slice(field.as_bytes());
    }
    body
}

fn picture_block(mime: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&3u32.to_be_bytes()); // front cover
    body.extend_from_slice(&(mime.len() as u32).to_be_bytes());
    body.extend_from_slice(mime.as_bytes());
    body.extend_from_slice(&0u32.to_be_bytes()); // description
    body.extend_from_slice(&1u32.to_be_bytes()); // width
    body.extend_from_slice(&1u32.to_be_bytes()); // height
    body.extend_from_slice(&24u32.to_be_bytes()); // depth
    body.extend_from_slice(&0u32.to_be_bytes()); // indexed colors
    body.extend_from_slice(&(data.len() as u32).to_be_bytes());
    body.extend_from_slice(data);
    body
}

/// FLAC CRC-8 (poly 0x07), over a frame header.
fn crc8(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |mut crc, &b| {
        crc ^= b;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 { (crc << 1) ^ 0x07 } else { crc << 1 };
        }
        crc
    })
}

/// FLAC CRC-16 (poly 0x8005), over a whole frame.
fn crc16(bytes: &[u8]) -> u16 {
    bytes.iter().fold(0u16, |mut crc, &b| {
        crc ^= u16::from(b) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 { (crc << 1) ^ 0x8005 } else { crc << 1 };
        }
        crc
    })
}

/// One 4096-sample frame of digital silence: fixed block size, 44.1 kHz,
/// two independent channels, 16 bit, frame number 0, two CONSTANT subframes.
fn silent_flac_frame() -> Vec<u8> {
    let mut frame = vec![0xFF, 0xF8, 0xC9, 0x18, 0x00];
    frame.push(crc8(&frame));
    for _ in 0..2 {
        frame.extend_from_slice(&[0x00, 0x00, 0x00]); // CONSTANT, value 0
    }
    let crc = crc16(&frame);
    frame.extend_from_slice(&crc.to_be_bytes());
    frame
}

/// The metadata blocks of a FLAC file (44.1 kHz, stereo, 16 bit), no audio.
/// `comments` empty means no VORBIS_COMMENT block at all.
pub(crate) fn flac_metadata_only(
    comments: &[(&str, &str)],
    picture: Option<(&str, &[u8])>,
) -> Vec<u8> {
    let mut out = b"fLaC".to_vec();

    let has_comments = !comments.is_empty();
    let has_picture = picture.is_some();

    flac_block(
        &mut out,
        0,
        !has_comments && !has_picture,
        &streaminfo(44_100, 2, 16),
    );
    if has_comments {
        flac_block(&mut out, 4, !has_picture, &vorbis_comment(comments));
    }
    if let Some((mime, data)) = picture {
        flac_block(&mut out, 6, true, &picture_block(mime, data));
    }
    out
}

/// A playable FLAC file: metadata blocks followed by one silent frame.
pub(crate) fn flac_bytes(comments: &[(&str, &str)], picture: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut out = flac_metadata_only(comments, picture);
    out.extend(silent_flac_frame());
    out
}

/// An ID3v2.4 tag whose only TIT2 frame has an invalid text encoding byte,
/// followed by normal MPEG frames.
pub(crate) fn corrupt_id3_mp3_bytes() -> Vec<u8> {
    let body = [0x09, b'a', b'b', b'c', b'd'];

    let mut frame = b"TIT2".to_vec();
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(&[0x00, 0x00]);
    frame.extend_from_slice(&body);

    let mut out = b"ID3\x04\x00\x00".to_vec();
    out.extend_from_slice(&(frame.len() as u32).to_be_bytes()); // < 128: synchsafe as is
    out.extend(frame);
    out.extend(mpeg_frames(4, 14));
    out
}
