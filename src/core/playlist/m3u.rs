//! core/playlist/m3u.rs
//! Plain M3U: one path or URI per line, playback order.

/// One entry per line, `\n` terminated.
pub fn write<'a>(uris: impl IntoIterator<Item = &'a str>) -> Vec<u8> {
    let mut out = String::new();
    for uri in uris {
        out.push_str(uri);
        out.push('\n');
    }
    out.into_bytes()
}

/// Non-blank, non-comment lines in order. `#EXTM3U` / `#EXTINF` lines are comments here.
///
/// Only the line terminator is stripped: leading and trailing spaces belong
/// to the entry. Entries written by the player are absolute, so they never
/// start with `#`.
pub fn parse(bytes: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    text.lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
