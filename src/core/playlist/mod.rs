//! core/playlist/mod.rs
//!
//! The playlist the transport follows.
//!
//! - `entries` is replaced wholesale by every open action (never merged)
//! - `current` is None iff `entries` is empty
//! - `advance()` / `retreat()` obey the playback mode; they only move `current`
//! - Playlist files: M3U read/write, PLS read

pub mod m3u;
pub mod pls;

use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::error::{Error, Result};
use super::library;
use super::types::{PlaybackMode, PlaylistEntry};

/// Elapsed time after which "previous" restarts the current track instead.
pub const RESTART_THRESHOLD: Duration = Duration::from_secs(5);

pub struct PlaylistStore {
    entries: Vec<PlaylistEntry>,
    current: Option<usize>,
    mode: PlaybackMode,
    restart_threshold: Duration,
    rng: StdRng,
}

impl Default for PlaylistStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaylistStore {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic shuffle (tests, reproducible sessions).
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            entries: Vec::new(),
            current: None,
            mode: PlaybackMode::default(),
            restart_threshold: RESTART_THRESHOLD,
            rng,
        }
    }

    pub fn entries(&self) -> &[PlaylistEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_entry(&self) -> Option<&PlaylistEntry> {
        self.current.and_then(|i| self.entries.get(i))
    }

    pub fn playback_mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn set_playback_mode(&mut self, mode: PlaybackMode) {
        self.mode = mode;
    }

    /// Sequential -> LoopAll -> LoopOne -> Shuffle -> Sequential.
    pub fn cycle_playback_mode(&mut self) -> PlaybackMode {
        self.mode = self.mode.cycled();
        debug!(mode = %self.mode, "playback mode changed");
        self.mode
    }

    pub fn restart_threshold(&self) -> Duration {
        self.restart_threshold
    }

    pub fn set_restart_threshold(&mut self, threshold: Duration) {
        self.restart_threshold = threshold;
    }

    // ---------------------------------------------------------------------
    // Bulk replacement
    // ---------------------------------------------------------------------

    /// Install `entries` as the whole playlist. Returns the new current index
    /// (0, or None when empty); the caller starts transport of that entry.
    pub fn replace_all(&mut self, entries: Vec<PlaylistEntry>) -> Option<usize> {
        self.entries = entries;
        self.current = if self.entries.is_empty() { None } else { Some(0) };
        info!(entries = self.entries.len(), "playlist replaced");
        self.current
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.current = None;
    }

    /// Explicitly selected files: audio only, natural-sorted.
    pub fn ingest_files(&mut self, paths: impl IntoIterator<Item = PathBuf>) -> Option<usize> {
        let entries = library::select_audio(paths)
            .iter()
            .map(|p| PlaylistEntry::from_path(p))
            .collect();
        self.replace_all(entries)
    }

    /// Every audio file under `root` (one level, or the whole tree).
    pub fn ingest_directory(&mut self, root: &Path, recursive: bool) -> Result<Option<usize>> {
        let entries = directory_entries(root, recursive)?;
        Ok(self.replace_all(entries))
    }

    // ---------------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------------

    /// Move forward according to the playback mode.
    ///
    /// Returns the new current index, or None when there is nowhere to go
    /// (empty playlist, or end of list in `Sequential`). A None leaves
    /// `current` untouched.
    pub fn advance(&mut self) -> Option<usize> {
        self.step(true)
    }

    /// Move backward according to the playback mode. Same contract as `advance`.
    pub fn retreat(&mut self) -> Option<usize> {
        self.step(false)
    }

    fn step(&mut self, forward: bool) -> Option<usize> {
        let cur = self.current?;
        let len = self.entries.len();

        let next = match self.mode {
            PlaybackMode::Sequential => {
                if forward {
                    (cur + 1 < len).then_some(cur + 1)
                } else {
                    cur.checked_sub(1)
                }
            }
            PlaybackMode::LoopAll => Some(if forward {
                (cur + 1) % len
            } else {
                (cur + len - 1) % len
            }),
            PlaybackMode::LoopOne => Some(cur),
            PlaybackMode::Shuffle => Some(self.random_other(cur, len)),
        };

        if let Some(i) = next {
            self.current = Some(i);
            debug!(index = i, mode = %self.mode, "playlist moved");
        }
        next
    }

    /// Uniform pick among the indices other than `cur` (or `cur` if it is the only one).
    fn random_other(&mut self, cur: usize, len: usize) -> usize {
        if len < 2 {
            return cur;
        }
        let pick = self.rng.gen_range(0..len - 1);
        if pick >= cur { pick + 1 } else { pick }
    }

    /// Explicit jump (double-click on an entry).
    pub fn set_current_index(&mut self, index: usize) -> Result<()> {
        if index >= self.entries.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        self.current = Some(index);
        Ok(())
    }

    /// True: restart the current track. False: go to the previous entry.
    pub fn should_restart_vs_retreat(&self, elapsed: Duration) -> bool {
        elapsed >= self.restart_threshold
    }

    // ---------------------------------------------------------------------
    // Serialization
    // ---------------------------------------------------------------------

    /// M3U text of all entries in current order.
    pub fn serialize(&self) -> Vec<u8> {
        m3u::write(self.entries.iter().map(|e| e.source_uri.as_str()))
    }

    /// Entries of an M3U file. Entries pointing at missing files are kept.
    pub fn deserialize(bytes: &[u8]) -> Vec<PlaylistEntry> {
        m3u::parse(bytes)
            .iter()
            .map(|uri| PlaylistEntry::from_uri(uri))
            .collect()
    }
}

/// Directory contents as playlist entries, natural-sorted per level.
pub fn directory_entries(root: &Path, recursive: bool) -> Result<Vec<PlaylistEntry>> {
    Ok(library::scan_directory(root, recursive)?
        .iter()
        .map(|p| PlaylistEntry::from_path(p))
        .collect())
}

/// Read an `.m3u` or `.pls` file from disk.
///
/// Relative entries are resolved against the playlist's own directory;
/// URIs (`file://...`) and absolute paths are kept as written.
pub fn load_playlist_file(path: &Path) -> Result<Vec<PlaylistEntry>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let bytes = std::fs::read(path)?;
    let lines = match ext.as_deref() {
        Some("m3u") => m3u::parse(&bytes),
        Some("pls") => pls::parse(&bytes)?,
        _ => return Err(Error::UnsupportedFormat(path.to_path_buf())),
    };

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    let entries: Vec<PlaylistEntry> = lines
        .iter()
        .map(|line| resolve_entry(base, line))
        .collect();

    debug!(path = %path.display(), entries = entries.len(), "playlist file loaded");
    Ok(entries)
}

fn resolve_entry(base: &Path, line: &str) -> PlaylistEntry {
    if line.contains("://") || Path::new(line).is_absolute() {
        PlaylistEntry::from_uri(line)
    } else {
        PlaylistEntry::from_path(&base.join(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::TempDir;

    fn entries(uris: &[&str]) -> Vec<PlaylistEntry> {
        uris.iter().map(|u| PlaylistEntry::from_uri(u)).collect()
    }

    fn store_with(uris: &[&str], mode: PlaybackMode) -> PlaylistStore {
        let mut store = PlaylistStore::with_seed(7);
        store.replace_all(entries(uris));
        store.set_playback_mode(mode);
        store
    }

    #[test]
    fn replace_all_sets_index() {
        let mut store = PlaylistStore::with_seed(1);
        assert_eq!(store.current_index(), None);

        assert_eq!(store.replace_all(entries(&["/a.mp3", "/b.mp3"])), Some(0));
        assert_eq!(store.current_entry().unwrap().display_name, "a.mp3");

        store.set_current_index(1).unwrap();
        assert_eq!(store.replace_all(entries(&["/c.mp3"])), Some(0));
        assert_eq!(store.len(), 1);

        store.clear();
        assert_eq!(store.current_index(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn empty_playlist_never_moves() {
        let mut store = PlaylistStore::with_seed(1);
        store.replace_all(Vec::new());
        for mode in [
            PlaybackMode::Sequential,
            PlaybackMode::LoopAll,
            PlaybackMode::LoopOne,
            PlaybackMode::Shuffle,
        ] {
            store.set_playback_mode(mode);
            assert_eq!(store.advance(), None);
            assert_eq!(store.retreat(), None);
            assert_eq!(store.current_index(), None);
        }
    }

    #[test]
    fn sequential_stops_at_the_ends() {
        let mut store = store_with(&["/1.mp3", "/2.mp3", "/3.mp3"], PlaybackMode::Sequential);
        assert_eq!(store.retreat(), None);
        assert_eq!(store.current_index(), Some(0));
        assert_eq!(store.advance(), Some(1));
        assert_eq!(store.advance(), Some(2));
        assert_eq!(store.advance(), None);
        assert_eq!(store.current_index(), Some(2));
        assert_eq!(store.retreat(), Some(1));
    }

    #[test]
    fn loop_all_wraps() {
        let mut store = store_with(&["/1.mp3", "/2.mp3"], PlaybackMode::LoopAll);
        assert_eq!(store.retreat(), Some(1));
        assert_eq!(store.advance(), Some(0));
        assert_eq!(store.advance(), Some(1));
        assert_eq!(store.advance(), Some(0));
    }

    #[test]
    fn loop_one_stays_put() {
        let mut store = store_with(&["/1.mp3", "/2.mp3"], PlaybackMode::LoopOne);
        store.set_current_index(1).unwrap();
        assert_eq!(store.advance(), Some(1));
        assert_eq!(store.retreat(), Some(1));
    }

    #[test]
    fn shuffle_never_repeats_current() {
        let mut store = store_with(&["/1", "/2", "/3", "/4", "/5"], PlaybackMode::Shuffle);
        let mut seen = [false; 5];
        for _ in 0..200 {
            let before = store.current_index().unwrap();
            let after = store.advance().unwrap();
            assert_ne!(before, after);
            assert!(after < 5);
            seen[after] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn shuffle_single_entry_stays() {
        let mut store = store_with(&["/only.mp3"], PlaybackMode::Shuffle);
        assert_eq!(store.advance(), Some(0));
        assert_eq!(store.retreat(), Some(0));
    }

    #[test]
    fn mode_cycle_is_fixed() {
        let mut store = PlaylistStore::with_seed(1);
        assert_eq!(store.cycle_playback_mode(), PlaybackMode::LoopAll);
        assert_eq!(store.cycle_playback_mode(), PlaybackMode::LoopOne);
        assert_eq!(store.cycle_playback_mode(), PlaybackMode::Shuffle);
        assert_eq!(store.cycle_playback_mode(), PlaybackMode::Sequential);
    }

    #[test]
    fn jump_out_of_range_is_rejected() {
        let mut store = store_with(&["/1.mp3", "/2.mp3"], PlaybackMode::Sequential);
        assert!(matches!(
            store.set_current_index(2),
            Err(Error::IndexOutOfRange { index: 2, len: 2 })
        ));
        assert_eq!(store.current_index(), Some(0));
        store.set_current_index(1).unwrap();
        assert_eq!(store.current_index(), Some(1));
    }

    #[test]
    fn restart_threshold() {
        let mut store = PlaylistStore::with_seed(1);
        assert!(!store.should_restart_vs_retreat(Duration::from_millis(4_999)));
        assert!(store.should_restart_vs_retreat(Duration::from_secs(5)));

        store.set_restart_threshold(Duration::from_secs(2));
        assert!(store.should_restart_vs_retreat(Duration::from_secs(3)));
    }

    #[test]
    fn serialize_round_trip() {
        let list = entries(&[
            "/music/Ghosts/10 Ghosts II.flac",
            "/music/Ghosts/2 Ghosts I.mp3",
            "file:///music/other/a b.mp3",
        ]);
        let mut store = PlaylistStore::with_seed(1);
        store.replace_all(list.clone());

        let bytes = store.serialize();
        assert_eq!(PlaylistStore::deserialize(&bytes), list);
    }

    #[test]
    fn round_trip_keeps_odd_file_names() {
        let list: Vec<PlaylistEntry> = [
            "/music/song.mp3 ",
            "/music/ lead.mp3",
            "#1 Hit.mp3",
            " padded.flac",
        ]
        .iter()
        .map(|p| PlaylistEntry::from_path(Path::new(p)))
        .collect();
        assert!(list.iter().all(|e| e.path().is_absolute()));

        let mut store = PlaylistStore::with_seed(1);
        store.replace_all(list.clone());
        assert_eq!(PlaylistStore::deserialize(&store.serialize()), list);
    }

    #[test]
    fn missing_files_survive_deserialize() {
        let parsed = PlaylistStore::deserialize(b"/gone/away.mp3\n");
        assert_eq!(parsed, entries(&["/gone/away.mp3"]));
    }

    #[test]
    fn ingest_directory_replaces() {
        let dir = TempDir::new("playlist-dir");
        dir.write("10.mp3", b"x");
        dir.write("2.mp3", b"x");
        dir.write("1.mp3", b"x");

        let mut store = store_with(&["/old.mp3"], PlaybackMode::LoopAll);
        assert_eq!(store.ingest_directory(dir.path(), false).unwrap(), Some(0));

        let names: Vec<_> = store.entries().iter().map(|e| e.display_name.as_str()).collect();
        assert_eq!(names, vec!["1.mp3", "2.mp3", "10.mp3"]);
        assert_eq!(store.playback_mode(), PlaybackMode::LoopAll);
    }

    #[test]
    fn ingest_nested_tree() {
        let dir = TempDir::new("playlist-tree");
        dir.write("a/2.flac", b"x");
        dir.write("a/1.flac", b"x");
        dir.write("b/1.mp3", b"x");

        let mut store = PlaylistStore::with_seed(1);
        assert_eq!(store.ingest_directory(dir.path(), false).unwrap(), None);
        assert!(store.is_empty());

        assert_eq!(store.ingest_directory(dir.path(), true).unwrap(), Some(0));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn ingest_files_filters_and_sorts() {
        let mut store = PlaylistStore::with_seed(1);
        let first = store.ingest_files(vec![
            PathBuf::from("/m/10.mp3"),
            PathBuf::from("/m/cover.jpg"),
            PathBuf::from("/m/9.flac"),
        ]);
        assert_eq!(first, Some(0));
        let names: Vec<_> = store.entries().iter().map(|e| e.display_name.as_str()).collect();
        assert_eq!(names, vec!["9.flac", "10.mp3"]);
    }

    #[test]
    fn playlist_files_resolve_relative_entries() {
        let dir = TempDir::new("playlist-files");
        let m3u = dir.write("lists/mix.m3u", b"#EXTM3U\nsongs/1.mp3\n/abs/2.flac\nfile:///x/3.mp3\n");
        let pls = dir.write("lists/mix.pls", b"[playlist]\nFile1=songs/1.mp3\nNumberOfEntries=1\n");

        let from_m3u = load_playlist_file(&m3u).unwrap();
        let base = dir.path().join("lists");
        assert_eq!(from_m3u[0].path(), base.join("songs/1.mp3"));
        assert_eq!(from_m3u[1].source_uri, "/abs/2.flac");
        assert_eq!(from_m3u[2].source_uri, "file:///x/3.mp3");

        let from_pls = load_playlist_file(&pls).unwrap();
        assert_eq!(from_pls.len(), 1);
        assert_eq!(from_pls[0].path(), base.join("songs/1.mp3"));

        let txt = dir.write("lists/mix.txt", b"");
        assert!(matches!(
            load_playlist_file(&txt),
            Err(Error::UnsupportedFormat(_))
        ));
    }
}
