// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! # Vocabulary Drill Player.
//!
//! Plays certification vocabulary one category at a time: each row's word
//! recording followed by its example sentence, continuing into the next
//! category when one runs out, and remembering where the learner stopped.
//!
//! It uses an event-driven architecture where:
//!
//! * The **Main Thread** owns the playback engine and runs the event loop.
//! * **Background Workers** play audio and report the end of each file.
//! * **Input Threads** capture key presses and periodic ticks.
//!
//! ## Architecture
//!
//! The application follows a strict setup-run-teardown pattern to ensure the
//! terminal state is preserved even in the event of a crash. Communication
//! between the engine and background workers is handled via `std::sync::mpsc`
//! channels.

mod actions;
mod bookmarks;
mod catalog;
mod config;
mod db;
mod engine;
mod model;
mod player;
mod resolver;
mod share;
mod util;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::{
    io::Write,
    path::Path,
    sync::mpsc::{self, Receiver, Sender},
    thread,
    time::Duration,
};

use crate::{
    actions::events::{AppEvent, process_events},
    bookmarks::{BOOKMARK_BUCKET, BookmarkStore, Bucket, MemoryBucket},
    config::AppConfig,
    db::SqliteBucket,
    engine::{Engine, NoticeSounds},
    model::{DialectLevel, TrackRef},
    player::AudioPlayer,
    resolver::{AudioTables, CertResolver},
    share::ShareRef,
};

/// Command line options.
#[derive(Parser, Debug)]
#[command(name = "vocab-player")]
#[command(about = "Sequential vocabulary drill player")]
#[command(version)]
struct Cli {
    /// Shared link (or bare query) naming what to open
    #[arg(long, conflicts_with_all = ["dialect", "resume"])]
    share: Option<String>,

    /// Dialect code: si, ha, da, rh or zh
    #[arg(long, requires_all = ["level", "category"])]
    dialect: Option<String>,

    /// Level code: 5 (basic) or 1 to 4
    #[arg(long, requires = "dialect")]
    level: Option<String>,

    /// Category to open
    #[arg(long, requires = "dialect")]
    category: Option<String>,

    /// Row to start playing from; without it the category is only shown
    #[arg(long, requires = "category")]
    row: Option<String>,

    /// Continue from the most recent bookmark
    #[arg(long)]
    resume: bool,

    /// Continue from the bookmark with this key, as listed by --bookmarks
    #[arg(long, conflicts_with_all = ["share", "dialect", "resume"])]
    bookmark: Option<String>,

    /// List the saved bookmarks and exit
    #[arg(long)]
    bookmarks: bool,
}

/// Application state.
struct App {
    pub config: AppConfig,

    pub event_tx: Sender<AppEvent>,
    pub event_rx: Receiver<AppEvent>,

    pub engine: Engine<AudioPlayer, Sender<AppEvent>>,
}

impl App {
    /// Create a new instance of application state.
    pub fn new(
        config: AppConfig,
        catalog: catalog::Catalog,
        resolver: CertResolver,
        bookmarks: BookmarkStore,
    ) -> Result<Self> {
        let (event_tx, event_rx) = mpsc::channel();

        let audio_player = AudioPlayer::new(config.backend, config.simulated_track_ms, event_tx.clone())
            .context("Failed to start audio player")?;

        let notices = NoticeSounds {
            empty_category: TrackRef::new(config.empty_category_sound.clone()),
            end_of_playback: TrackRef::new(config.end_of_playback_sound.clone()),
        };

        let engine = Engine::new(
            catalog,
            Box::new(resolver),
            audio_player,
            bookmarks,
            event_tx.clone(),
            notices,
        );

        Ok(Self {
            config,
            event_tx,
            event_rx,
            engine,
        })
    }
}

/// The entry point of the application.
///
/// Loads the vocabulary and bookmarks, opens whatever the command line asks
/// for, then runs the event loop until the user quits.
fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = config::load_config();

    let bookmarks = BookmarkStore::open(open_bucket(&config));

    if cli.bookmarks {
        for (entry, bookmark) in bookmarks.selector().iter().zip(bookmarks.entries()) {
            let saved = chrono::DateTime::from_timestamp_millis(bookmark.created_at)
                .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            println!("{}  [{}]  {}", entry.label, entry.key, saved);
        }
        return Ok(());
    }

    let vocabulary_dir = Path::new(&config.vocabulary_dir);
    let catalog = catalog::load_catalog(vocabulary_dir).context("Failed to load vocabulary")?;
    let tables = AudioTables::load(vocabulary_dir).context("Failed to load audio tables")?;
    let resolver = CertResolver::new(&config.audio_base_url, &config.media_year, tables);

    log::info!("Loaded {} vocabulary tables", catalog.len());

    let mut app = App::new(config, catalog, resolver, bookmarks).context("Failed to initalise application")?;

    open_selection(&mut app, &cli)?;

    enable_raw_mode().context("Failed to enable raw mode")?;
    let res = run(&mut app);
    disable_raw_mode().ok();
    println!();

    res.context("Application error occurred")
}

/// Logs through `env_logger`, ending lines in `\r\n` as the terminal runs in
/// raw mode.
fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format(|buf, record| {
            write!(buf, "[{} {}] {}\r\n", record.level(), record.target(), record.args())
        })
        .init();
}

/// The bookmark bucket in the database, or an in-memory one if the database
/// cannot be opened.
fn open_bucket(config: &AppConfig) -> Box<dyn Bucket> {
    match db::init_db(&config.database_file) {
        Ok(conn) => Box::new(SqliteBucket::new(conn, BOOKMARK_BUCKET)),
        Err(e) => {
            log::warn!("Bookmarks will not be kept: {:?}", e);
            Box::new(MemoryBucket::default())
        }
    }
}

/// Opens the category (and row) named on the command line.
fn open_selection(app: &mut App, cli: &Cli) -> Result<()> {
    if let Some(link) = &cli.share {
        let share = ShareRef::parse(link).context("Invalid shared link")?;
        app.engine.restore(&share)?;
        return Ok(());
    }

    if let (Some(dialect), Some(level), Some(category)) = (&cli.dialect, &cli.level, &cli.category) {
        let dialect_level = DialectLevel::from_codes(dialect, level)
            .with_context(|| format!("Unknown dialect/level {}-{}", dialect, level))?;
        app.engine
            .open(dialect_level, category, cli.row.as_deref())?;
        return Ok(());
    }

    if let Some(key) = &cli.bookmark {
        app.engine.restore_bookmark(key)?;
        return Ok(());
    }

    if cli.resume {
        if !app.engine.resume_latest()? {
            anyhow::bail!("There are no bookmarks to resume");
        }
        return Ok(());
    }

    anyhow::bail!("Nothing to play: pass --share, --dialect/--level/--category, --bookmark or --resume")
}

/// Starts the input threads and enters the main event loop.
///
/// This function spawns two long-running background threads:
/// * An input thread to poll for system keyboard events.
/// * A tick thread to refresh the playback position.
///
/// After spawning the workers, it hands control to [`process_events`].
///
/// # Errors
///
/// Returns an error if the event processing loop encounters an unrecoverable
/// application error.
fn run(app: &mut App) -> Result<()> {
    // Spawn a thread to translate raw key events to application events.
    let tx_keys = app.event_tx.clone();
    thread::spawn(move || {
        loop {
            if let Ok(event::Event::Key(key)) = event::read() {
                if tx_keys.send(AppEvent::Key(key)).is_err() {
                    break;
                }
            }
        }
    });

    // Spawn a thread to send a periodic tick application event.
    let tx_tick = app.event_tx.clone();
    thread::spawn(move || {
        while tx_tick.send(AppEvent::Tick).is_ok() {
            thread::sleep(Duration::from_millis(250));
        }
    });

    // Application event loop, process events until the user quits
    process_events(app)
}
