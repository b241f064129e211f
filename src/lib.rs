//! Mosaic: tag reading and playlist core of a small desktop audio player.
//!
//! - [`core`] holds everything: tags, playlist, persistence, settings, transport boundary
//! - [`logging`] sets up `tracing` for the binary

pub mod core;
pub mod logging;
