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

//! Application event distribution and orchestration.
//!
//! This module defines the central event-handling logic for the application,
//! bridging user input (keyboard), background worker updates (audio player)
//! and the playback engine.
//!
//! # Architecture
//!
//! The system follows a reactive event-loop pattern:
//!
//! 1. **Capture**: Events are received via the [`AppEvent`] enum through an
//!    asynchronous channel.
//! 2. **Process**: The [`process_events`] function feeds player signals into
//!    the engine and maps key presses to engine operations.
//! 3. **Report**: Engine notifications travel back through the same channel
//!    and are written to the console.

use std::{
    fmt::Display,
    io::{self, Write},
    sync::mpsc::Sender,
};

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::{
    App,
    engine::{
        observer::{Notification, PlaybackObserver},
        session::{SessionState, Signal},
    },
    player::PlayerEvent,
    util::format::format_time,
};

#[derive(Debug)]
pub(crate) enum AppEvent {
    Key(KeyEvent),

    Player(PlayerEvent),
    Engine(Notification),

    Tick,

    ExitApplication,

    FatalError(String),
}

/// What a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum KeyAction {
    /// Start the shown category, or pause/resume what is playing.
    PlayPause,
    Stop,
    ResumeLatest,
    NextCategory,
    Quit,
}

/// Engine notifications are forwarded to the event loop.
impl PlaybackObserver for Sender<AppEvent> {
    fn notify(&mut self, notification: Notification) {
        self.send(AppEvent::Engine(notification)).ok();
    }
}

/// Runs the main application loop.
///
/// This function loops until a 'quit' event is received or the event channel
/// is closed.
pub(crate) fn process_events(app: &mut App) -> Result<()> {
    while let Ok(event) = app.event_rx.recv() {
        match event {
            AppEvent::ExitApplication => break,

            AppEvent::Key(key) => {
                if let Some(action) = key_action(key) {
                    process_key_action(app, action)?;
                }
            }

            AppEvent::Player(PlayerEvent::Completed(id)) => {
                app.engine.on_resource_event(id, Signal::Completed)
            }
            AppEvent::Player(PlayerEvent::Failed(id, reason)) => {
                app.engine.on_resource_event(id, Signal::Failed(reason))
            }

            AppEvent::Engine(notification) => report(app, notification),

            AppEvent::Tick => {
                if let (Some((row_id, _)), Some(seconds)) =
                    (app.engine.now_playing(), app.engine.position())
                {
                    print!("\r#{} {}", row_id, format_time(seconds));
                    io::stdout().flush().ok();
                }
            }

            AppEvent::FatalError(message) => anyhow::bail!(message),
        }
    }

    app.engine.detach();
    Ok(())
}

/// Maps a key press to an action.
pub(crate) fn key_action(key: KeyEvent) -> Option<KeyAction> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(KeyAction::Quit),
        (KeyCode::Char('q'), _) | (KeyCode::Esc, _) => Some(KeyAction::Quit),
        (KeyCode::Char(' '), _) => Some(KeyAction::PlayPause),
        (KeyCode::Char('s'), _) => Some(KeyAction::Stop),
        (KeyCode::Char('r'), _) => Some(KeyAction::ResumeLatest),
        (KeyCode::Char('n'), _) => Some(KeyAction::NextCategory),
        _ => None,
    }
}

fn process_key_action(app: &mut App, action: KeyAction) -> Result<()> {
    let result = match action {
        KeyAction::Quit => {
            app.event_tx.send(AppEvent::ExitApplication)?;
            Ok(())
        }
        KeyAction::PlayPause => match app.engine.state() {
            SessionState::Playing | SessionState::Paused => {
                app.engine.toggle_pause();
                Ok(())
            }
            _ => app.engine.play(),
        },
        KeyAction::Stop => {
            app.engine.stop();
            Ok(())
        }
        KeyAction::ResumeLatest => app.engine.resume_latest().map(|resumed| {
            if !resumed {
                say("No bookmarks yet");
            }
        }),
        KeyAction::NextCategory => app.engine.select_next_category().map(|moved| {
            if !moved {
                say("Already at the last category");
            }
        }),
    };

    if let Err(e) = result {
        log::warn!("{:?} failed: {}", action, e);
        say(e);
    }

    Ok(())
}

fn report(app: &mut App, notification: Notification) {
    match notification {
        Notification::NowPlayingChanged(Some(track)) => log::debug!("Bound {}", track),
        Notification::NowPlayingChanged(None) => {}
        Notification::SessionStateChanged(state) => say(format!("[{:?}]", state)),
        Notification::CategoryChanged {
            dialect_level,
            category,
        } => {
            let rows = app.engine.attach();
            let count = app.engine.displayed().map_or(0, |p| p.row_count());
            say(format!("{} {} ({} rows)", dialect_level, category, count));

            for row in rows {
                if let Some(item) = app.engine.catalog().item(dialect_level, &row.row_id) {
                    say(format!("  {} {} {}", row.row_id, item.headword, item.meaning));
                }
            }

            if let Some(link) = app
                .engine
                .share_ref()
                .and_then(|s| s.to_url(&app.config.share_base_url).ok())
            {
                say(link);
            }
        }
        Notification::EmptyCategoryEncountered(category) => {
            say(format!("{} has no entries, moving on", category))
        }
        Notification::ChainExhausted => say("End of playback"),
    }
}

/// Prints a line; the terminal is in raw mode so lines end in `\r\n`.
fn say(line: impl Display) {
    print!("\r{}\r\n", line);
    io::stdout().flush().ok();
}
