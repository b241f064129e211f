//! core/playlist/pls.rs
//! PLS import (`[playlist]` section, `FileN=` entries). Read-only.

use super::super::error::{Error, Result};

/// `FileN` values ordered by N. `TitleN`, `LengthN`, `NumberOfEntries` and
/// `Version` are ignored.
pub fn parse(bytes: &[u8]) -> Result<Vec<String>> {
    let text = String::from_utf8_lossy(bytes);
    let mut lines = text
        .lines()
        .map(|l| l.trim_start_matches('\u{feff}').trim())
        .filter(|l| !l.is_empty() && !l.starts_with(';'));

    match lines.next() {
        Some(header) if header.eq_ignore_ascii_case("[playlist]") => {}
        _ => return Err(Error::PlaylistParse("missing [playlist] header".into())),
    }

    let mut files: Vec<(u32, String)> = Vec::new();
    for line in lines {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let Some(n) = key
            .get(..4)
            .filter(|prefix| prefix.eq_ignore_ascii_case("file"))
            .and_then(|_| key[4..].parse::<u32>().ok())
        else {
            continue;
        };
        let value = value.trim();
        if !value.is_empty() {
            files.push((n, value.to_string()));
        }
    }

    files.sort_by_key(|(n, _)| *n);
    Ok(files.into_iter().map(|(_, v)| v).collect())
}
