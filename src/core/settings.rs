//! core/settings.rs
//! User settings: a small JSON file under the config dir, read by dotted key.
//!
//! - Missing or unreadable file -> defaults (logged)
//! - Missing keys -> their section defaults
//! - The rest of the core reads settings only through [`SettingsProvider`]

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::{Error, Result};

pub const APP_NAME: &str = "mosaic";
pub const SETTINGS_FILE: &str = "settings.json";

/// Per-user config directory (`~/.config/mosaic` on Linux).
pub fn config_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// What the session and persistence layer need to know.
pub trait SettingsProvider {
    fn media_library_path(&self) -> String;
    fn show_library_on_start(&self) -> bool;
    fn recursive_directory(&self) -> bool;
    fn save_playlist_on_close(&self) -> bool;
    fn show_playlist_on_start(&self) -> bool;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaLibrarySettings {
    pub media_library_path: String,
    pub show_on_start: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOptions {
    pub recursive_directory: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistSettings {
    pub save_on_close: bool,
    pub show_on_start: bool,
}

impl Default for PlaylistSettings {
    fn default() -> Self {
        Self {
            save_on_close: true,
            show_on_start: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub media_library: MediaLibrarySettings,
    pub file_options: FileOptions,
    pub playlist: PlaylistSettings,
}

/// A single setting value, as seen through the key/value interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Text(String),
    Flag(bool),
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Flag(b) => write!(f, "{b}"),
        }
    }
}

impl SettingValue {
    /// Parse a command-line value for `key` ("true"/"false" for flags).
    pub fn parse_for(key: &str, raw: &str) -> Result<Self> {
        match Settings::default().get(key) {
            Some(Self::Text(_)) => Ok(Self::Text(raw.to_string())),
            Some(Self::Flag(_)) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(Self::Flag(true)),
                "false" | "0" | "no" | "off" => Ok(Self::Flag(false)),
                other => Err(Error::Settings(format!("{key} expects true/false, got {other:?}"))),
            },
            None => Err(Error::Settings(format!("unknown key {key}"))),
        }
    }
}

impl Settings {
    pub const KEYS: &'static [&'static str] = &[
        "media_library.media_library_path",
        "media_library.show_on_start",
        "file_options.recursive_directory",
        "playlist.save_on_close",
        "playlist.show_on_start",
    ];

    pub fn default_path() -> PathBuf {
        config_dir().join(SETTINGS_FILE)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Settings(format!("{}: {e}", path.display())))
    }

    /// Like `load`, but a missing or broken file gives the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(s) => s,
            Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no settings file, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "settings unreadable, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Settings(e.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<SettingValue> {
        let value = match key {
            "media_library.media_library_path" => {
                SettingValue::Text(self.media_library.media_library_path.clone())
            }
            "media_library.show_on_start" => SettingValue::Flag(self.media_library.show_on_start),
            "file_options.recursive_directory" => {
                SettingValue::Flag(self.file_options.recursive_directory)
            }
            "playlist.save_on_close" => SettingValue::Flag(self.playlist.save_on_close),
            "playlist.show_on_start" => SettingValue::Flag(self.playlist.show_on_start),
            _ => return None,
        };
        Some(value)
    }

    pub fn set(&mut self, key: &str, value: SettingValue) -> Result<()> {
        match (key, value) {
            ("media_library.media_library_path", SettingValue::Text(s)) => {
                self.media_library.media_library_path = s
            }
            ("media_library.show_on_start", SettingValue::Flag(b)) => {
                self.media_library.show_on_start = b
            }
            ("file_options.recursive_directory", SettingValue::Flag(b)) => {
                self.file_options.recursive_directory = b
            }
            ("playlist.save_on_close", SettingValue::Flag(b)) => self.playlist.save_on_close = b,
            ("playlist.show_on_start", SettingValue::Flag(b)) => self.playlist.show_on_start = b,
            (key, value) => {
                return Err(match self.get(key) {
                    Some(_) => Error::Settings(format!("wrong value type for {key}: {value:?}")),
                    None => Error::Settings(format!("unknown key {key}")),
                });
            }
        }
        Ok(())
    }
}

impl SettingsProvider for Settings {
    fn media_library_path(&self) -> String {
        self.media_library.media_library_path.clone()
    }

    fn show_library_on_start(&self) -> bool {
        self.media_library.show_on_start
    }

    fn recursive_directory(&self) -> bool {
        self.file_options.recursive_directory
    }

    fn save_playlist_on_close(&self) -> bool {
        self.playlist.save_on_close
    }

    fn show_playlist_on_start(&self) -> bool {
        self.playlist.show_on_start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::TempDir;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.media_library_path(), "");
        assert!(!s.recursive_directory());
        assert!(s.save_playlist_on_close());
        assert!(!s.show_playlist_on_start());
        assert!(!s.show_library_on_start());
    }

    #[test]
    fn every_key_is_readable() {
        let s = Settings::default();
        for key in Settings::KEYS {
            assert!(s.get(key).is_some(), "{key}");
        }
        assert_eq!(s.get("playlist.nope"), None);
    }

    #[test]
    fn set_checks_key_and_type() {
        let mut s = Settings::default();
        s.set("file_options.recursive_directory", SettingValue::Flag(true))
            .unwrap();
        assert!(s.recursive_directory());

        s.set(
            "media_library.media_library_path",
            SettingValue::Text("/music".into()),
        )
        .unwrap();
        assert_eq!(s.media_library_path(), "/music");

        assert!(matches!(
            s.set("playlist.save_on_close", SettingValue::Text("yes".into())),
            Err(Error::Settings(_))
        ));
        assert!(matches!(
            s.set("bogus", SettingValue::Flag(true)),
            Err(Error::Settings(_))
        ));
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new("settings-save");
        let path = dir.path().join("nested").join(SETTINGS_FILE);

        let mut s = Settings::default();
        s.playlist.save_on_close = false;
        s.media_library.media_library_path = "/srv/music".into();
        s.save(&path).unwrap();

        assert_eq!(Settings::load(&path).unwrap(), s);
    }

    #[test]
    fn partial_and_broken_files() {
        let dir = TempDir::new("settings-partial");
        let partial = dir.write("partial.json", br#"{ "file_options": { "recursive_directory": true } }"#);
        let s = Settings::load_or_default(&partial);
        assert!(s.recursive_directory());
        assert!(s.save_playlist_on_close());

        let broken = dir.write("broken.json", b"{ not json");
        assert_eq!(Settings::load_or_default(&broken), Settings::default());
        assert_eq!(
            Settings::load_or_default(&dir.path().join("missing.json")),
            Settings::default()
        );
    }

    #[test]
    fn parse_cli_values() {
        assert_eq!(
            SettingValue::parse_for("playlist.save_on_close", "off").unwrap(),
            SettingValue::Flag(false)
        );
        assert_eq!(
            SettingValue::parse_for("media_library.media_library_path", "/m").unwrap(),
            SettingValue::Text("/m".into())
        );
        assert!(SettingValue::parse_for("playlist.save_on_close", "maybe").is_err());
        assert!(SettingValue::parse_for("nope", "x").is_err());
    }
}
