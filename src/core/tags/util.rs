//! core/tags/util.rs
//! Small helpers shared by the MP3 and FLAC readers.

use super::super::types::RawTags;

/// Separator used when one tag key carries several values.
///
/// Empty on purpose: existing playlists and displays expect the values to be
/// concatenated as-is (e.g. two ARTIST comments "A" and "B" become "AB").
pub const MULTI_VALUE_SEPARATOR: &str = "";

/// Collect `(key, value)` pairs into a `RawTags`, joining repeated keys in
/// order of appearance with [`MULTI_VALUE_SEPARATOR`].
pub(crate) fn collect_joined<I, K, V>(pairs: I) -> RawTags
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: AsRef<str>,
{
    let mut out = RawTags::new();
    for (key, value) in pairs {
        let value = value.as_ref();
        out.entry(key.into())
            .and_modify(|existing: &mut String| {
                existing.push_str(MULTI_VALUE_SEPARATOR);
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    out
}

/// Decode a 28-bit "synchsafe" integer (ID3v2 header sizes).
pub(crate) fn synchsafe_u32(bytes: &[u8]) -> Option<u32> {
    let b = bytes.get(..4)?;
    if b.iter().any(|&x| x & 0x80 != 0) {
        return None;
    }
    Some(
        (u32::from(b[0]) << 21)
            | (u32::from(b[1]) << 14)
            | (u32::from(b[2]) << 7)
            | u32::from(b[3]),
    )
}

/// Read a big-endian u32 at `at`, if the slice is long enough.
pub(crate) fn be_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let b = bytes.get(at..at.checked_add(4)?)?;
    Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}
