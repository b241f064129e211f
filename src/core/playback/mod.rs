//! core/playback/mod.rs
//! Transport boundary.
//!
//! - [`PlayerFacade`] is all the session needs from a player.
//! - [`PlaybackController`] implements it by sending [`PlayerCommand`]s down a channel.
//! - With the `audio` feature, [`start_playback`] runs the rodio engine on its own thread
//!   and reports back with [`PlayerEvent`]s.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

#[cfg(feature = "audio")]
mod engine;

#[cfg(feature = "audio")]
pub use engine::PlaybackEngine;

/// Opaque transport.
pub trait PlayerFacade {
    fn load(&mut self, path: &Path);
    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    fn seek(&mut self, position_ms: u64);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Playing,
    Paused,
    Stopped,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    Load(PathBuf),
    Play,
    Pause,
    Stop,
    Seek(u64),      // ms
    SetVolume(f32), // 0.0..=1.0
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    DurationChanged(u64),
    PositionChanged(u64),
    StateChanged(TransportState),
    /// The loaded source is ready to be inspected.
    MetadataAvailable,
    /// The current source played to its end.
    TrackEnded,
    /// The requested source could not be opened or decoded.
    LoadFailed(String),
    Error(String),
}

#[derive(Clone)]
pub struct PlaybackController {
    command_tx: Sender<PlayerCommand>,
}

impl PlaybackController {
    /// Controller plus the receiving end, for whoever executes the commands.
    pub fn channel() -> (Self, Receiver<PlayerCommand>) {
        let (command_tx, command_rx) = mpsc::channel();
        (Self { command_tx }, command_rx)
    }

    /// Best-effort send. If the engine died, the command is dropped.
    pub fn send(&self, cmd: PlayerCommand) {
        let _ = self.command_tx.send(cmd);
    }

    pub fn set_volume(&self, volume: f32) {
        self.send(PlayerCommand::SetVolume(volume));
    }

    pub fn shutdown(&self) {
        self.send(PlayerCommand::Shutdown);
    }
}

impl PlayerFacade for PlaybackController {
    fn load(&mut self, path: &Path) {
        self.send(PlayerCommand::Load(path.to_path_buf()));
    }

    fn play(&mut self) {
        self.send(PlayerCommand::Play);
    }

    fn pause(&mut self) {
        self.send(PlayerCommand::Pause);
    }

    fn stop(&mut self) {
        self.send(PlayerCommand::Stop);
    }

    fn seek(&mut self, position_ms: u64) {
        self.send(PlayerCommand::Seek(position_ms));
    }
}

/// Spawns the playback thread and returns:
/// - PlaybackController (hand it to the session)
/// - Receiver<PlayerEvent> (feed into `Session::handle_event`)
#[cfg(feature = "audio")]
pub fn start_playback() -> (PlaybackController, Receiver<PlayerEvent>) {
    let (controller, command_rx) = PlaybackController::channel();
    let (event_tx, event_rx) = mpsc::channel::<PlayerEvent>();

    std::thread::spawn(move || {
        let mut engine = match PlaybackEngine::new(event_tx.clone()) {
            Ok(e) => e,
            Err(msg) => {
                let _ = event_tx.send(PlayerEvent::Error(msg));
                return;
            }
        };

        engine.run(command_rx);
    });

    (controller, event_rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facade_calls_become_commands() {
        let (mut controller, rx) = PlaybackController::channel();
        controller.load(Path::new("/m/1.mp3"));
        controller.play();
        controller.seek(1_500);
        controller.pause();
        controller.stop();
        controller.shutdown();

        let got: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            got,
            vec![
                PlayerCommand::Load(PathBuf::from("/m/1.mp3")),
                PlayerCommand::Play,
                PlayerCommand::Seek(1_500),
                PlayerCommand::Pause,
                PlayerCommand::Stop,
                PlayerCommand::Shutdown,
            ]
        );
    }

    #[test]
    fn dead_receiver_is_ignored() {
        let (mut controller, rx) = PlaybackController::channel();
        drop(rx);
        controller.play();
    }
}
