//! core/tags/mpeg.rs
//! Stream facts for MP3 files, read from the first MPEG audio frame.
//!
//! - Skips a leading ID3v2 tag, then scans for a frame sync.
//! - A candidate frame only counts if the next frame also parses
//!   (or the probe window ends first).
//! - Layer III frames may carry a Xing/Info or VBRI header:
//!   `Info` means CBR, `Xing`/`VBRI` mean VBR, a LAME extension can refine it to ABR.
//!   Frame and byte counts from those headers give the average bitrate.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use super::util::{be_u32, synchsafe_u32};

/// How much audio data (after the ID3v2 tag) we look at for a frame header.
const PROBE_WINDOW: u64 = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegVersion {
    V1,
    V2,
    V2_5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitrateMode {
    Unknown,
    Cbr,
    Vbr,
    Abr,
}

impl BitrateMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Cbr => "CBR",
            Self::Vbr => "VBR",
            Self::Abr => "ABR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MpegStreamInfo {
    pub version: MpegVersion,
    pub layer: u8,
    pub sample_rate: u32,
    pub bitrate_kbps: u32,
    pub mode: BitrateMode,
    pub channels: u8,
}

// kb/s, indexed by the 4-bit bitrate field (0 = free format, 15 = invalid).
const BITRATES_V1_L1: [u32; 15] = [
    0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448,
];
const BITRATES_V1_L2: [u32; 15] = [
    0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384,
];
const BITRATES_V1_L3: [u32; 15] = [
    0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320,
];
const BITRATES_V2_L1: [u32; 15] = [
    0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256,
];
const BITRATES_V2_L23: [u32; 15] = [
    0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160,
];

#[derive(Debug, Clone, Copy)]
struct FrameHeader {
    version: MpegVersion,
    layer: u8,
    bitrate_kbps: u32,
    sample_rate: u32,
    mono: bool,
    frame_len: usize,
}

impl FrameHeader {
    fn parse(b: &[u8]) -> Option<Self> {
        let b = b.get(..4)?;
        if b[0] != 0xFF || b[1] & 0xE0 != 0xE0 {
            return None;
        }

        let version = match (b[1] >> 3) & 0b11 {
            0 => MpegVersion::V2_5,
            2 => MpegVersion::V2,
            3 => MpegVersion::V1,
            _ => return None,
        };
        let layer = match (b[1] >> 1) & 0b11 {
            1 => 3,
            2 => 2,
            3 => 1,
            _ => return None,
        };

        let bitrate_index = usize::from(b[2] >> 4);
        // Free-format streams are not supported.
        if bitrate_index == 0 || bitrate_index == 15 {
            return None;
        }
        let rate_index = usize::from((b[2] >> 2) & 0b11);
        if rate_index == 3 {
            return None;
        }
        let padding = u32::from((b[2] >> 1) & 1);
        let mono = b[3] >> 6 == 0b11;

        let table = match (version, layer) {
            (MpegVersion::V1, 1) => &BITRATES_V1_L1,
            (MpegVersion::V1, 2) => &BITRATES_V1_L2,
            (MpegVersion::V1, _) => &BITRATES_V1_L3,
            (_, 1) => &BITRATES_V2_L1,
            _ => &BITRATES_V2_L23,
        };
        let bitrate_kbps = table[bitrate_index];

        let sample_rate = match version {
            MpegVersion::V1 => [44_100, 48_000, 32_000][rate_index],
            MpegVersion::V2 => [22_050, 24_000, 16_000][rate_index],
            MpegVersion::V2_5 => [11_025, 12_000, 8_000][rate_index],
        };

        let bps = bitrate_kbps * 1000;
        let frame_len: u32 = match layer {
            1 => (12 * bps / sample_rate + padding) * 4,
            3 if version != MpegVersion::V1 => 72 * bps / sample_rate + padding,
            _ => 144 * bps / sample_rate + padding,
        };

        Some(Self {
            version,
            layer,
            bitrate_kbps,
            sample_rate,
            mono,
            frame_len: frame_len as usize,
        })
    }

    fn samples_per_frame(&self) -> u64 {
        match (self.layer, self.version) {
            (1, _) => 384,
            (3, MpegVersion::V2 | MpegVersion::V2_5) => 576,
            _ => 1152,
        }
    }

    /// Offset of a Xing/Info header inside a Layer III frame (after the side info).
    fn xing_offset(&self) -> usize {
        let side_info = match (self.version, self.mono) {
            (MpegVersion::V1, false) => 32,
            (MpegVersion::V1, true) => 17,
            (_, false) => 17,
            (_, true) => 9,
        };
        4 + side_info
    }

    fn average_kbps(&self, frames: u32, bytes: u32) -> Option<u32> {
        if frames == 0 {
            return None;
        }
        let bits = u64::from(bytes) * 8 * u64::from(self.sample_rate);
        let samples = u64::from(frames) * self.samples_per_frame();
        u32::try_from(bits / samples / 1000).ok()
    }

    /// Bitrate and mode, refined by any Xing/Info/VBRI header in `frame`.
    fn bitrate_and_mode(&self, frame: &[u8]) -> (u32, BitrateMode) {
        if self.layer != 3 {
            return (self.bitrate_kbps, BitrateMode::Unknown);
        }

        let at = self.xing_offset();
        match frame.get(at..at + 4) {
            Some(b"Xing") | Some(b"Info") => {
                let is_info = &frame[at..at + 4] == b"Info";
                let mut mode = if is_info {
                    BitrateMode::Cbr
                } else {
                    BitrateMode::Vbr
                };

                let Some(flags) = be_u32(frame, at + 4) else {
                    return (self.bitrate_kbps, mode);
                };
                let mut pos = at + 8;
                let mut frames = None;
                let mut bytes = None;
                if flags & 0x1 != 0 {
                    frames = be_u32(frame, pos);
                    pos += 4;
                }
                if flags & 0x2 != 0 {
                    bytes = be_u32(frame, pos);
                    pos += 4;
                }
                if flags & 0x4 != 0 {
                    pos += 100; // seek table
                }
                if flags & 0x8 != 0 {
                    pos += 4; // quality
                }

                if frame.get(pos..pos + 4) == Some(b"LAME".as_slice()) {
                    if let Some(method) = frame.get(pos + 9).map(|b| b & 0x0F) {
                        mode = match method {
                            1 | 8 => BitrateMode::Cbr,
                            2 | 9 => BitrateMode::Abr,
                            3..=6 => BitrateMode::Vbr,
                            _ => mode,
                        };
                    }
                }

                if mode == BitrateMode::Cbr {
                    return (self.bitrate_kbps, mode);
                }
                let kbps = match (frames, bytes) {
                    (Some(f), Some(b)) => self.average_kbps(f, b),
                    _ => None,
                };
                (kbps.unwrap_or(self.bitrate_kbps), mode)
            }
            _ => {
                // VBRI sits at a fixed offset of 32 bytes after the header.
                if frame.get(36..40) == Some(b"VBRI".as_slice()) {
                    let bytes = be_u32(frame, 36 + 10);
                    let frames = be_u32(frame, 36 + 14);
                    let kbps = match (frames, bytes) {
                        (Some(f), Some(b)) => self.average_kbps(f, b),
                        _ => None,
                    };
                    return (kbps.unwrap_or(self.bitrate_kbps), BitrateMode::Vbr);
                }
                (self.bitrate_kbps, BitrateMode::Unknown)
            }
        }
    }

    fn into_info(self, frame: &[u8]) -> MpegStreamInfo {
        let (bitrate_kbps, mode) = self.bitrate_and_mode(frame);
        MpegStreamInfo {
            version: self.version,
            layer: self.layer,
            sample_rate: self.sample_rate,
            bitrate_kbps,
            mode,
            channels: if self.mono { 1 } else { 2 },
        }
    }
}

/// Total size of an ID3v2 tag at the start of `head`, header (and footer) included.
pub(crate) fn id3v2_len(head: &[u8]) -> Option<u64> {
    if head.len() < 10 || &head[..3] != b"ID3" {
        return None;
    }
    let body = u64::from(synchsafe_u32(&head[6..10])?);
    let footer = if head[5] & 0x10 != 0 { 10 } else { 0 };
    Some(10 + body + footer)
}

/// Find the first confirmed MPEG frame in `buf`.
pub fn probe(buf: &[u8]) -> Option<MpegStreamInfo> {
    let mut i = 0;
    while i + 4 <= buf.len() {
        if buf[i] == 0xFF {
            if let Some(header) = FrameHeader::parse(&buf[i..]) {
                let next = i + header.frame_len;
                let confirmed = next + 4 > buf.len() || FrameHeader::parse(&buf[next..]).is_some();
                if confirmed {
                    return Some(header.into_info(&buf[i..]));
                }
            }
        }
        i += 1;
    }
    None
}

/// Probe an MP3 file on disk. `Ok(None)` when no MPEG frame was found.
pub fn probe_file(path: &Path) -> io::Result<Option<MpegStreamInfo>> {
    let mut file = File::open(path)?;

    let mut head = Vec::with_capacity(10);
    (&mut file).take(10).read_to_end(&mut head)?;
    let skip = id3v2_len(&head).unwrap_or(0);

    file.seek(SeekFrom::Start(skip))?;
    let mut buf = Vec::new();
    file.take(PROBE_WINDOW).read_to_end(&mut buf)?;

    Ok(probe(&buf))
}
