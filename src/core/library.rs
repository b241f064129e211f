//! core/library.rs
//! Filesystem side of playlist building: which files count, and how directories are walked.
//!
//! - Only `.mp3` / `.flac` are audio; everything else is skipped silently.
//! - Each directory level is natural-sorted before it is appended.
//! - Recursive walks go top-down: a directory's files, then its subdirectories
//!   (also natural-sorted, so the order is stable from run to run).

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::error::Result;
use super::natsort::{natural_path_cmp, sort_paths};

pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac"];
pub const PLAYLIST_EXTENSIONS: &[&str] = &["m3u", "pls"];

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| allowed.iter().any(|a| ext.eq_ignore_ascii_case(a)))
        .unwrap_or(false)
}

pub fn is_audio(path: &Path) -> bool {
    has_extension(path, AUDIO_EXTENSIONS)
}

pub fn is_playlist(path: &Path) -> bool {
    has_extension(path, PLAYLIST_EXTENSIONS)
}

/// Keep only audio files from an explicit selection, in natural order.
pub fn select_audio(paths: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = paths
        .into_iter()
        .filter(|p| {
            let keep = is_audio(p);
            if !keep {
                debug!(path = %p.display(), "skipping unsupported file");
            }
            keep
        })
        .collect();
    sort_paths(&mut out);
    out
}

/// List audio files under `root`.
///
/// - `recursive == false`: only files directly inside `root`
/// - `recursive == true`: the whole subtree
///
/// Failing to read `root` itself is an error; unreadable subdirectories are
/// logged and skipped.
pub fn scan_directory(root: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let subdirs = read_level(root, &mut out)?;

    if recursive {
        for dir in subdirs {
            walk_dir(&dir, &mut out);
        }
    }

    debug!(root = %root.display(), recursive, found = out.len(), "directory scanned");
    Ok(out)
}

fn walk_dir(dir: &Path, out: &mut Vec<PathBuf>) {
    match read_level(dir, out) {
        Ok(subdirs) => {
            for sub in subdirs {
                walk_dir(&sub, out);
            }
        }
        Err(e) => warn!(dir = %dir.display(), error = %e, "skipping unreadable directory"),
    }
}

/// Append this level's audio files (sorted) to `out`, return its subdirectories (sorted).
fn read_level(dir: &Path, out: &mut Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut dirs = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        // Symlinked directories are not followed (no cycles).
        if file_type.is_dir() {
            dirs.push(path);
        } else if (file_type.is_file() || (file_type.is_symlink() && path.is_file()))
            && is_audio(&path)
        {
            files.push(path);
        }
    }

    sort_paths(&mut files);
    dirs.sort_by(|a, b| natural_path_cmp(a, b));

    out.extend(files);
    Ok(dirs)
}
