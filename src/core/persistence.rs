//! core/persistence.rs
//! Session playlist: restored at startup, saved or discarded at shutdown.
//!
//! The file lives at `{config_dir}/.m3u`. Nothing else is stored here.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::error::{Error, Result};
use super::playlist::PlaylistStore;
use super::types::PlaylistEntry;

pub const SESSION_PLAYLIST_FILE: &str = ".m3u";

pub struct PlaylistPersistence {
    path: PathBuf,
}

impl PlaylistPersistence {
    pub fn new(config_dir: &Path) -> Self {
        Self {
            path: config_dir.join(SESSION_PLAYLIST_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved entries, or None if there is no saved playlist.
    pub fn load(&self) -> Result<Option<Vec<PlaylistEntry>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(PlaylistStore::deserialize(&bytes))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(Error::Persistence {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Startup: install the saved playlist (current index 0) if there is one.
    ///
    /// Returns true when something was restored. Failures are logged only.
    pub fn restore(&self, store: &mut PlaylistStore) -> bool {
        match self.load() {
            Ok(Some(entries)) if !entries.is_empty() => {
                info!(path = %self.path.display(), entries = entries.len(), "restoring playlist");
                store.replace_all(entries);
                true
            }
            Ok(_) => {
                debug!(path = %self.path.display(), "no saved playlist");
                false
            }
            Err(e) => {
                warn!(error = %e, "could not restore playlist");
                false
            }
        }
    }

    /// Shutdown: write the playlist when `save_on_close`, otherwise remove any stale file.
    pub fn persist(&self, store: &PlaylistStore, save_on_close: bool) -> Result<()> {
        if save_on_close {
            self.save(store)
        } else {
            self.discard()
        }
    }

    fn save(&self, store: &PlaylistStore) -> Result<()> {
        let wrap = |source| Error::Persistence {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(wrap)?;
        }
        fs::write(&self.path, store.serialize()).map_err(wrap)?;

        info!(path = %self.path.display(), entries = store.len(), "playlist saved");
        Ok(())
    }

    fn discard(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "stale playlist removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(Error::Persistence {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
