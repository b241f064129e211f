//! core/mod.rs
//!
//! The brain of the player:
//! - Read tags from MP3/FLAC files into one metadata record
//! - Build and navigate the playlist (natural order, playback modes)
//! - Save/restore the session playlist, read settings
//! - Drive an opaque transport through `PlayerFacade`
//!
//! No UI code lives here. A front end owns a `Session`, calls its action
//! methods, and feeds it transport events.

pub mod error;
pub mod library;
pub mod natsort;
pub mod persistence;
pub mod playback;
pub mod playlist;
pub mod session;
pub mod settings;
pub mod tags;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{Error, Result};
pub use session::Session;
