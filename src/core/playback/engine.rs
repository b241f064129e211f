//! core/playback/engine.rs
//! Playback engine (rodio owner).
//!
//! Owns:
//! - OutputStream (must stay alive)
//! - Sink (per loaded track)
//! - command loop + periodic position ticks
//!
//! Emits PlayerEvent back via a channel. Knows nothing about playlists.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::{debug, warn};

use super::{PlayerCommand, PlayerEvent, TransportState};

const TICK_MS: u64 = 200;

pub struct PlaybackEngine {
    // Keep this alive for the lifetime of the engine!
    stream: OutputStream,

    sink: Option<Sink>,
    current_path: Option<PathBuf>,
    state: TransportState,
    volume: f32,

    event_tx: Sender<PlayerEvent>,
}

impl PlaybackEngine {
    pub fn new(event_tx: Sender<PlayerEvent>) -> Result<Self, String> {
        let stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| format!("Failed to open default audio output: {e}"))?;

        Ok(Self {
            stream,
            sink: None,
            current_path: None,
            state: TransportState::Stopped,
            volume: 1.0,
            event_tx,
        })
    }

    pub fn run(&mut self, command_rx: Receiver<PlayerCommand>) {
        let tick = Duration::from_millis(TICK_MS);

        loop {
            match command_rx.recv_timeout(tick) {
                Ok(cmd) => {
                    if self.handle_command(cmd) {
                        break;
                    }
                    while let Ok(cmd) = command_rx.try_recv() {
                        if self.handle_command(cmd) {
                            self.unload();
                            return;
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            self.tick();
        }

        self.unload();
    }

    fn emit(&self, event: PlayerEvent) {
        let _ = self.event_tx.send(event);
    }

    fn set_state(&mut self, state: TransportState) {
        if self.state != state {
            self.state = state;
            self.emit(PlayerEvent::StateChanged(state));
        }
    }

    /// Returns true on shutdown.
    fn handle_command(&mut self, cmd: PlayerCommand) -> bool {
        match cmd {
            PlayerCommand::Load(path) => {
                if let Err(e) = self.load(path) {
                    warn!(error = %e, "load failed");
                    self.emit(PlayerEvent::LoadFailed(e));
                }
            }
            PlayerCommand::Play => self.play(),
            PlayerCommand::Pause => {
                if let Some(sink) = &self.sink {
                    sink.pause();
                    self.set_state(TransportState::Paused);
                }
            }
            PlayerCommand::Stop => {
                if let Some(sink) = &self.sink {
                    sink.pause();
                    let _ = sink.try_seek(Duration::ZERO);
                }
                self.set_state(TransportState::Stopped);
                self.emit(PlayerEvent::PositionChanged(0));
            }
            PlayerCommand::Seek(ms) => {
                if let Some(sink) = &self.sink {
                    if sink.try_seek(Duration::from_millis(ms)).is_err() {
                        self.emit(PlayerEvent::Error(
                            "Seek failed (decoder may not support it)".into(),
                        ));
                    }
                }
            }
            PlayerCommand::SetVolume(v) => {
                self.volume = v.clamp(0.0, 1.0);
                if let Some(sink) = &self.sink {
                    sink.set_volume(self.volume);
                }
            }
            PlayerCommand::Shutdown => return true,
        }

        false
    }

    fn tick(&mut self) {
        let Some(sink) = &self.sink else {
            return;
        };
        if self.state != TransportState::Playing {
            return;
        }

        let position_ms = sink.get_pos().as_millis() as u64;
        let ended = sink.empty();
        self.emit(PlayerEvent::PositionChanged(position_ms));

        if ended {
            // Drop the drained sink; a later Play reopens the same file.
            self.sink = None;
            self.set_state(TransportState::Stopped);
            self.emit(PlayerEvent::TrackEnded);
        }
    }

    /// Open `path` paused at 0.
    fn load(&mut self, path: PathBuf) -> Result<(), String> {
        self.unload();
        self.set_state(TransportState::Stopped);

        let duration_ms = self.open_sink(&path)?;
        self.current_path = Some(path);

        self.emit(PlayerEvent::DurationChanged(duration_ms.unwrap_or(0)));
        self.emit(PlayerEvent::PositionChanged(0));
        self.emit(PlayerEvent::MetadataAvailable);
        Ok(())
    }

    fn open_sink(&mut self, path: &Path) -> Result<Option<u64>, String> {
        // rodio 0.21.x: Sink is created from the stream's mixer
        let sink = Sink::connect_new(self.stream.mixer());
        sink.pause();
        sink.set_volume(self.volume);

        let file = File::open(path).map_err(|e| format!("Failed to open file: {e}"))?;
        let decoder =
            Decoder::new(BufReader::new(file)).map_err(|e| format!("Decode failed: {e}"))?;
        let duration_ms = decoder.total_duration().map(|d| d.as_millis() as u64);

        sink.append(decoder);
        self.sink = Some(sink);

        debug!(path = %path.display(), ?duration_ms, "source opened");
        Ok(duration_ms)
    }

    fn play(&mut self) {
        if self.sink.is_none() {
            let Some(path) = self.current_path.clone() else {
                return;
            };
            if let Err(e) = self.open_sink(&path) {
                self.emit(PlayerEvent::LoadFailed(e));
                return;
            }
        }

        if let Some(sink) = &self.sink {
            sink.play();
            self.set_state(TransportState::Playing);
        }
    }

    fn unload(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.current_path = None;
    }
}
