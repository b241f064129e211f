//! core/natsort.rs
//! Natural ordering for file names and paths.
//!
//! Digit runs compare as numbers, so "2 Ghosts I" sorts before "10 Ghosts II".
//! Everything else compares as plain text, case-sensitive: "Zebra" sorts
//! before "apple".
//! Paths compare component by component.
//!
//! The same comparator orders explicitly selected files, one directory level,
//! and every level of a recursive walk.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy)]
enum Chunk<'a> {
    Num(&'a str),
    Text(&'a str),
}

/// Splits a string into alternating digit / non-digit runs.
struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Chunk<'a>> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();

        let end = self
            .rest
            .find(|c: char| c.is_ascii_digit() != digits)
            .unwrap_or(self.rest.len());

        let (head, tail) = self.rest.split_at(end);
        self.rest = tail;

        Some(if digits {
            Chunk::Num(head)
        } else {
            Chunk::Text(head)
        })
    }
}

/// Compare two digit runs by value without parsing (no overflow on long runs).
fn cmp_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn cmp_chunks(a: Chunk<'_>, b: Chunk<'_>) -> Ordering {
    match (a, b) {
        (Chunk::Num(x), Chunk::Num(y)) => cmp_numeric(x, y),
        (Chunk::Num(_), Chunk::Text(_)) => Ordering::Less,
        (Chunk::Text(_), Chunk::Num(_)) => Ordering::Greater,
        (Chunk::Text(x), Chunk::Text(y)) => x.cmp(y),
    }
}

/// Natural comparison of two names.
///
/// Total order: names that are "naturally equal" ("01" vs "1")
/// fall back to plain byte order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = Chunks { rest: a };
    let mut right = Chunks { rest: b };

    loop {
        match (left.next(), right.next()) {
            (None, None) => break,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = cmp_chunks(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }

    a.cmp(b)
}

/// Natural comparison of two paths, one component at a time.
pub fn natural_path_cmp(a: &Path, b: &Path) -> Ordering {
    let mut left = a.components();
    let mut right = b.components();

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = natural_cmp(
                    &x.as_os_str().to_string_lossy(),
                    &y.as_os_str().to_string_lossy(),
                );
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

pub fn sort_paths(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| natural_path_cmp(a, b));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(names: &[&str]) -> Vec<String> {
        let mut v: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        v.sort_by(|a, b| natural_cmp(a, b));
        v
    }

    #[test]
    fn numbers_sort_by_value() {
        assert_eq!(
            sorted(&["10.mp3", "2.mp3", "1.mp3"]),
            vec!["1.mp3", "2.mp3", "10.mp3"]
        );
    }

    #[test]
    fn embedded_numbers_in_titles() {
        assert_eq!(
            sorted(&["10 Ghosts II.flac", "2 Ghosts I.flac", "1 Ghosts I.flac"]),
            vec!["1 Ghosts I.flac", "2 Ghosts I.flac", "10 Ghosts II.flac"]
        );
    }

    #[test]
    fn uppercase_sorts_before_lowercase() {
        assert_eq!(
            sorted(&["beta.mp3", "Gamma.mp3", "alpha.mp3", "Zed 2.mp3", "Zed 10.mp3"]),
            vec!["Gamma.mp3", "Zed 2.mp3", "Zed 10.mp3", "alpha.mp3", "beta.mp3"]
        );
    }

    #[test]
    fn leading_zeros_and_ties_are_total() {
        assert_ne!(natural_cmp("track 007", "track 7"), Ordering::Equal);
        assert_eq!(natural_cmp("track 007", "track 8"), Ordering::Less);
        assert_eq!(natural_cmp("a", "A"), Ordering::Greater);
        assert_eq!(natural_cmp("same", "same"), Ordering::Equal);
    }

    #[test]
    fn long_digit_runs_do_not_overflow() {
        let big = "99999999999999999999999999";
        let bigger = "100000000000000000000000000";
        assert_eq!(natural_cmp(big, bigger), Ordering::Less);
    }

    #[test]
    fn prefix_sorts_first() {
        assert_eq!(natural_cmp("song", "song 2"), Ordering::Less);
        assert_eq!(natural_cmp("1", "a"), Ordering::Less);
    }

    #[test]
    fn paths_compare_per_component() {
        let mut paths = vec![
            PathBuf::from("music/disc 10/1.mp3"),
            PathBuf::from("music/disc 2/10.mp3"),
            PathBuf::from("music/disc 2/9.mp3"),
        ];
        sort_paths(&mut paths);
        assert_eq!(
            paths,
            vec![
                PathBuf::from("music/disc 2/9.mp3"),
                PathBuf::from("music/disc 2/10.mp3"),
                PathBuf::from("music/disc 10/1.mp3"),
            ]
        );
    }
}
