//! mosaic
//!
//! Headless front end for the player core.
//!
//! - `info` / `tags` show what the tag reader makes of a file
//! - `playlist` builds a playlist the way the player's open actions do
//! - `settings` reads and writes the user settings file
//! - `play` (with the `audio` feature) plays files through the rodio engine

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};

use mosaic::core::library;
use mosaic::core::persistence::PlaylistPersistence;
use mosaic::core::playlist::{self, PlaylistStore};
use mosaic::core::settings::{self, SettingValue, Settings, SettingsProvider};
use mosaic::core::tags;
use mosaic::core::types::{PlaylistEntry, TrackMetadata};

#[derive(Parser)]
#[command(name = "mosaic")]
#[command(about = "Tag reader and playlist tool for MP3/FLAC collections")]
struct Args {
    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (defaults to the per-user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the normalized metadata of an audio file
    Info { file: PathBuf },

    /// List every raw tag of an audio file
    Tags { file: PathBuf },

    /// Build a playlist from files, a directory, or an .m3u/.pls file
    Playlist {
        paths: Vec<PathBuf>,

        /// Walk directories recursively (default: the recursive_directory setting)
        #[arg(short, long)]
        recursive: bool,

        /// Write the result as M3U to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Store the result as the session playlist
        #[arg(long)]
        save: bool,
    },

    /// Read or change settings
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },

    /// Play files, a directory or a playlist
    #[cfg(feature = "audio")]
    Play { paths: Vec<PathBuf> },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print all keys
    List,
    Get { key: String },
    Set { key: String, value: String },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    mosaic::logging::init_logging(args.verbose)?;

    let settings_path = args.config.clone().unwrap_or_else(Settings::default_path);
    let config_dir = settings_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(settings::config_dir);

    match args.command {
        Command::Info { file } => {
            let meta = read_metadata(&file)?;
            print_info(&meta);
        }
        Command::Tags { file } => {
            let meta = read_metadata(&file)?;
            for (key, value) in &meta.all_tags {
                println!("{key}={value}");
            }
        }
        Command::Playlist {
            paths,
            recursive,
            output,
            save,
        } => {
            let settings = Settings::load_or_default(&settings_path);
            let recursive = recursive || settings.recursive_directory();
            let entries = collect_entries(&paths, recursive)?;

            let mut store = PlaylistStore::new();
            store.replace_all(entries);

            for (i, entry) in store.entries().iter().enumerate() {
                println!("{:>4}  {}", i + 1, entry.source_uri);
            }

            if let Some(output) = output {
                std::fs::write(&output, store.serialize())
                    .with_context(|| format!("writing {}", output.display()))?;
            }
            if save {
                PlaylistPersistence::new(&config_dir)
                    .persist(&store, true)
                    .context("saving session playlist")?;
            }
        }
        Command::Settings { action } => {
            run_settings(&settings_path, action.unwrap_or(SettingsAction::List))?;
        }
        #[cfg(feature = "audio")]
        Command::Play { paths } => {
            let settings = Settings::load_or_default(&settings_path);
            play(&paths, settings, &config_dir)?;
        }
    }

    Ok(())
}

fn read_metadata(file: &Path) -> anyhow::Result<TrackMetadata> {
    let raw = tags::read_tags(file).with_context(|| format!("reading {}", file.display()))?;
    Ok(tags::normalize(raw.raw, raw.technical, raw.picture))
}

fn print_info(meta: &TrackMetadata) {
    println!("Title:        {}", meta.title);
    println!("Artist:       {}", meta.artist);
    println!("Album:        {}", meta.album);
    println!("Track:        {}", meta.track_number);
    println!("Date:         {}", meta.date);
    println!("Genre:        {}", meta.genre);
    println!("Description:  {}", meta.description);
    println!("Sample rate:  {}", meta.sample_rate_label());
    if meta.bitrate_kbps.is_some() {
        println!("Bitrate:      {}", meta.bitrate_label());
    }
    if let Some(mode) = &meta.bitrate_mode {
        println!("Bitrate mode: {mode}");
    }
    if meta.bits_per_sample.is_some() {
        println!("Bits/sample:  {}", meta.bits_per_sample_label());
    }
    match meta.artwork.embedded_bytes() {
        Some(bytes) => println!("Artwork:      embedded ({} bytes)", bytes.len()),
        None => println!("Artwork:      {}", mosaic::core::types::PLACEHOLDER_ARTWORK),
    }
    println!("Window title: {}", meta.window_title());
}

/// Same rules as the player's open actions:
/// one playlist file, one directory, or a set of audio files.
fn collect_entries(paths: &[PathBuf], recursive: bool) -> anyhow::Result<Vec<PlaylistEntry>> {
    match paths {
        [] => bail!("nothing to open"),
        [one] if one.is_dir() => Ok(playlist::directory_entries(one, recursive)?),
        [one] if library::is_playlist(one) => Ok(playlist::load_playlist_file(one)?),
        many => Ok(library::select_audio(many.iter().cloned())
            .iter()
            .map(|p| PlaylistEntry::from_path(p))
            .collect()),
    }
}

fn run_settings(path: &Path, action: SettingsAction) -> anyhow::Result<()> {
    let mut settings = Settings::load_or_default(path);
    match action {
        SettingsAction::List => {
            for key in Settings::KEYS {
                if let Some(value) = settings.get(key) {
                    println!("{key} = {value}");
                }
            }
        }
        SettingsAction::Get { key } => match settings.get(&key) {
            Some(value) => println!("{value}"),
            None => bail!("unknown key {key}"),
        },
        SettingsAction::Set { key, value } => {
            let value = SettingValue::parse_for(&key, &value)?;
            settings.set(&key, value)?;
            settings
                .save(path)
                .with_context(|| format!("writing {}", path.display()))?;
        }
    }
    Ok(())
}

#[cfg(feature = "audio")]
fn play(paths: &[PathBuf], settings: Settings, config_dir: &Path) -> anyhow::Result<()> {
    use std::sync::mpsc::RecvTimeoutError;
    use std::time::Duration;

    use mosaic::core::Session;
    use mosaic::core::playback;

    let (controller, events) = playback::start_playback();
    let mut session = Session::new(controller.clone(), settings, config_dir);

    let first = match paths {
        [] => {
            let restored = session.startup();
            if restored {
                session.toggle_play_pause();
            }
            restored.then_some(0)
        }
        [one] if one.is_dir() => session.open_directory(one)?,
        [one] if library::is_playlist(one) => session.open_playlist(one)?,
        many => session.open_files(many.iter().cloned()),
    };
    if first.is_none() {
        bail!("nothing to play");
    }

    let mut last_title = String::new();
    while !session.playlist_finished() {
        let event = match events.recv_timeout(Duration::from_millis(500)) {
            Ok(e) => e,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        session.handle_event(event);

        let title = session.window_title();
        if title != last_title {
            println!("{title}");
            last_title = title;
        }
    }

    session.shutdown();
    controller.shutdown();
    Ok(())
}
