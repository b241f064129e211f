//! core/session.rs
//!
//! One player session: the playlist, the transport, and what is on screen.
//!
//! Every user action and every transport event is an explicit method here:
//! - open actions replace the playlist and start entry 0
//! - navigation moves the playlist pointer, then loads that entry
//! - `handle_event` folds transport events back in (position, end of track, metadata)
//!
//! Directory ingestion can run on a worker thread. Each open action bumps a
//! generation counter; a worker result is only committed if its generation is
//! still the latest, so a slow scan can never overwrite a newer playlist.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::error::{Error, Result};
use super::library;
use super::persistence::PlaylistPersistence;
use super::playback::{PlayerEvent, PlayerFacade, TransportState};
use super::playlist::{self, PlaylistStore};
use super::settings::SettingsProvider;
use super::tags;
use super::types::{PlaybackMode, PlaylistEntry, TrackMetadata};

pub const APP_TITLE: &str = "Mosaic";

type IngestResult = (u64, Result<Vec<PlaylistEntry>>);

pub struct Session<P: PlayerFacade, S: SettingsProvider> {
    player: P,
    settings: S,
    store: PlaylistStore,
    persistence: PlaylistPersistence,

    now_playing: Option<TrackMetadata>,
    transport: TransportState,
    position_ms: u64,
    duration_ms: u64,
    finished: bool,
    last_load_error: Option<(usize, String)>,
    load_failures: usize,

    generation: u64,
    in_flight: Option<u64>,
    ingest_tx: Sender<IngestResult>,
    ingest_rx: Receiver<IngestResult>,
}

impl<P: PlayerFacade, S: SettingsProvider> Session<P, S> {
    pub fn new(player: P, settings: S, config_dir: &Path) -> Self {
        Self::with_store(player, settings, config_dir, PlaylistStore::new())
    }

    pub fn with_store(player: P, settings: S, config_dir: &Path, store: PlaylistStore) -> Self {
        let (ingest_tx, ingest_rx) = mpsc::channel();
        Self {
            player,
            settings,
            store,
            persistence: PlaylistPersistence::new(config_dir),
            now_playing: None,
            transport: TransportState::Stopped,
            position_ms: 0,
            duration_ms: 0,
            finished: false,
            last_load_error: None,
            load_failures: 0,
            generation: 0,
            in_flight: None,
            ingest_tx,
            ingest_rx,
        }
    }

    pub fn playlist(&self) -> &PlaylistStore {
        &self.store
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    pub fn now_playing(&self) -> Option<&TrackMetadata> {
        self.now_playing.as_ref()
    }

    pub fn transport_state(&self) -> TransportState {
        self.transport
    }

    pub fn position_ms(&self) -> u64 {
        self.position_ms
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// The last entry ended and the mode had nothing to play next.
    pub fn playlist_finished(&self) -> bool {
        self.finished
    }

    /// Index and reason of the most recent entry the transport could not load.
    pub fn last_load_error(&self) -> Option<(usize, &str)> {
        self.last_load_error
            .as_ref()
            .map(|(index, reason)| (*index, reason.as_str()))
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Restore the saved playlist, if any, and load (not play) entry 0.
    pub fn startup(&mut self) -> bool {
        if !self.persistence.restore(&mut self.store) {
            return false;
        }
        if let Some(entry) = self.store.current_entry() {
            let path = entry.path();
            self.player.load(&path);
        }
        true
    }

    /// Stop the transport and save or discard the session playlist.
    pub fn shutdown(&mut self) {
        self.invalidate_ingest();
        self.player.stop();

        let save = self.settings.save_playlist_on_close();
        if let Err(e) = self.persistence.persist(&self.store, save) {
            warn!(error = %e, "playlist not persisted");
        }
    }

    // ---------------------------------------------------------------------
    // Open actions (all replace the playlist)
    // ---------------------------------------------------------------------

    pub fn open_file(&mut self, path: &Path) -> Result<Option<usize>> {
        if !library::is_audio(path) {
            return Err(Error::UnsupportedFormat(path.to_path_buf()));
        }
        Ok(self.install(vec![PlaylistEntry::from_path(path)]))
    }

    pub fn open_files(&mut self, paths: impl IntoIterator<Item = PathBuf>) -> Option<usize> {
        let entries = library::select_audio(paths)
            .iter()
            .map(|p| PlaylistEntry::from_path(p))
            .collect();
        self.install(entries)
    }

    pub fn open_playlist(&mut self, path: &Path) -> Result<Option<usize>> {
        let entries = playlist::load_playlist_file(path)?;
        Ok(self.install(entries))
    }

    /// Directory open, recursive or not per the `file_options.recursive_directory` setting.
    pub fn open_directory(&mut self, root: &Path) -> Result<Option<usize>> {
        let entries = playlist::directory_entries(root, self.settings.recursive_directory())?;
        Ok(self.install(entries))
    }

    /// Media library activation: a file plays alone, a directory plays its whole tree.
    pub fn open_library_item(&mut self, path: &Path) -> Result<Option<usize>> {
        if path.is_dir() {
            let entries = playlist::directory_entries(path, true)?;
            Ok(self.install(entries))
        } else {
            self.open_file(path)
        }
    }

    /// `open_directory` on a worker thread. Commit happens in [`Session::poll_ingest`].
    pub fn open_directory_in_background(&mut self, root: &Path) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        self.in_flight = Some(generation);

        let root = root.to_path_buf();
        let recursive = self.settings.recursive_directory();
        let tx = self.ingest_tx.clone();

        debug!(generation, root = %root.display(), recursive, "background ingest started");
        thread::spawn(move || {
            let result = playlist::directory_entries(&root, recursive);
            let _ = tx.send((generation, result));
        });

        generation
    }

    pub fn ingest_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Commit a finished background ingest, dropping stale ones.
    ///
    /// Returns the new current index when a result was committed.
    pub fn poll_ingest(&mut self) -> Result<Option<usize>> {
        let mut committed = None;

        while let Ok((generation, result)) = self.ingest_rx.try_recv() {
            if self.in_flight != Some(generation) {
                debug!(generation, latest = self.generation, "stale ingest dropped");
                continue;
            }
            self.in_flight = None;
            let entries = result?;
            committed = self.commit(entries);
        }

        Ok(committed)
    }

    /// Block until the pending ingest (if any) is committed or `timeout` passes.
    pub fn wait_ingest(&mut self, timeout: Duration) -> Result<Option<usize>> {
        let step = Duration::from_millis(10);
        let mut waited = Duration::ZERO;
        loop {
            let committed = self.poll_ingest()?;
            if committed.is_some() || !self.ingest_pending() || waited >= timeout {
                return Ok(committed);
            }
            thread::sleep(step);
            waited += step;
        }
    }

    fn invalidate_ingest(&mut self) {
        self.generation += 1;
        self.in_flight = None;
    }

    fn install(&mut self, entries: Vec<PlaylistEntry>) -> Option<usize> {
        self.invalidate_ingest();
        self.commit(entries)
    }

    fn commit(&mut self, entries: Vec<PlaylistEntry>) -> Option<usize> {
        self.load_failures = 0;
        self.last_load_error = None;
        let first = self.store.replace_all(entries);
        match first {
            Some(i) => self.start(i),
            None => {
                self.player.stop();
                self.now_playing = None;
            }
        }
        first
    }

    /// Load entry `index` and play it.
    fn start(&mut self, index: usize) {
        let Some(entry) = self.store.entries().get(index) else {
            return;
        };
        let path = entry.path();
        info!(index, path = %path.display(), "starting track");

        self.position_ms = 0;
        self.finished = false;
        self.player.load(&path);
        self.player.play();
    }

    // ---------------------------------------------------------------------
    // Navigation / transport
    // ---------------------------------------------------------------------

    pub fn next(&mut self) -> Option<usize> {
        let next = self.store.advance();
        if let Some(i) = next {
            self.start(i);
        }
        next
    }

    /// Early in a track: previous entry. Later: back to the start of this one.
    pub fn previous(&mut self) -> Option<usize> {
        let elapsed = Duration::from_millis(self.position_ms);
        if self.store.current_index().is_some() && self.store.should_restart_vs_retreat(elapsed) {
            self.seek(0);
            return self.store.current_index();
        }

        let prev = self.store.retreat();
        if let Some(i) = prev {
            self.start(i);
        }
        prev
    }

    pub fn jump_to(&mut self, index: usize) -> Result<()> {
        self.store.set_current_index(index)?;
        self.start(index);
        Ok(())
    }

    pub fn cycle_playback_mode(&mut self) -> PlaybackMode {
        self.store.cycle_playback_mode()
    }

    pub fn toggle_play_pause(&mut self) {
        match self.transport {
            TransportState::Playing => self.player.pause(),
            TransportState::Paused | TransportState::Stopped => {
                if self.store.current_entry().is_some() {
                    self.player.play();
                }
            }
        }
    }

    pub fn seek(&mut self, position_ms: u64) {
        self.position_ms = position_ms;
        self.player.seek(position_ms);
    }

    // ---------------------------------------------------------------------
    // Transport events
    // ---------------------------------------------------------------------

    pub fn handle_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::DurationChanged(ms) => {
                self.duration_ms = ms;
                self.load_failures = 0;
            }
            PlayerEvent::PositionChanged(ms) => self.position_ms = ms,
            PlayerEvent::StateChanged(state) => self.transport = state,
            PlayerEvent::MetadataAvailable => self.refresh_metadata(),
            PlayerEvent::TrackEnded => self.on_track_ended(),
            PlayerEvent::LoadFailed(reason) => self.on_load_failed(reason),
            PlayerEvent::Error(msg) => warn!(error = %msg, "player error"),
        }
    }

    /// Skip an entry that cannot be played. Stops once every entry failed in a
    /// row, or right away in LoopOne (it would only retry the same entry).
    fn on_load_failed(&mut self, reason: String) {
        let Some(index) = self.store.current_index() else {
            return;
        };
        warn!(index, error = %reason, "track failed to load");
        self.last_load_error = Some((index, reason));
        self.load_failures += 1;

        let hopeless = self.load_failures >= self.store.len()
            || self.store.playback_mode() == PlaybackMode::LoopOne;
        if hopeless || self.next().is_none() {
            self.finish();
        }
    }

    fn on_track_ended(&mut self) {
        // LoopOne: advance() keeps the index, so the same entry restarts.
        if self.next().is_none() {
            self.finish();
        }
    }

    fn finish(&mut self) {
        debug!("end of playlist");
        self.finished = true;
        self.transport = TransportState::Stopped;
        self.position_ms = 0;
    }

    fn refresh_metadata(&mut self) {
        let Some(entry) = self.store.current_entry() else {
            self.now_playing = None;
            return;
        };
        let (meta, _failed) = tags::read_track_metadata(&entry.path());
        self.now_playing = Some(meta);
    }

    // ---------------------------------------------------------------------
    // Display helpers
    // ---------------------------------------------------------------------

    pub fn window_title(&self) -> String {
        self.now_playing
            .as_ref()
            .map(TrackMetadata::window_title)
            .unwrap_or_else(|| APP_TITLE.to_string())
    }

    pub fn time_label(&self) -> String {
        format_time_label(self.position_ms, self.duration_ms)
    }
}

/// "mm:ss / mm:ss", or "hh:mm:ss / hh:mm:ss" for tracks over an hour.
/// Empty when both are zero.
pub fn format_time_label(position_ms: u64, duration_ms: u64) -> String {
    let pos = position_ms / 1000;
    let dur = duration_ms / 1000;
    if pos == 0 && dur == 0 {
        return String::new();
    }

    let long = dur > 3600;
    let fmt = |s: u64| {
        if long {
            format!("{:02}:{:02}:{:02}", s / 3600, (s / 60) % 60, s % 60)
        } else {
            format!("{:02}:{:02}", (s / 60) % 60, s % 60)
        }
    };
    format!("{} / {}", fmt(pos), fmt(dur))
}
