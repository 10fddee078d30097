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

//! MPV-backed audio playback.
//!
//! This module leverages `libmpv` for audio decoding and playback. It manages
//! a background worker thread that bridges the command-based interface of the
//! [`AudioPlayer`](super::AudioPlayer) and the MPV event system.
//!
//! The worker remembers the binding id of the file it loaded last, and takes
//! it as current once MPV reports that the file started. When MPV reports the
//! end of that file the id is sent back with the outcome; files replaced or
//! stopped on request end silently.

use anyhow::{Context, Result};
use mpv::Format;
use std::{
    sync::mpsc::{self, Receiver, Sender},
    thread,
};

use crate::{
    actions::events::AppEvent,
    player::{AudioPlayerCommand, LoadTracker, PlayerEvent, SharedPosition},
};

/// Spawns the audio worker thread to process playback commands.
///
/// If the internal worker returns an error, it is caught here and broadcast as
/// a fatal application event.
pub(super) fn spawn_player_worker(
    command_rx: Receiver<AudioPlayerCommand>,
    event_tx: Sender<AppEvent>,
    position: SharedPosition,
) {
    let error_tx = event_tx.clone();

    thread::spawn(move || {
        if let Err(e) = audio_player_worker(command_rx, event_tx, position) {
            let _ = error_tx.send(AppEvent::FatalError(format!("MPV worker failure: {:?}", e)));
        }
    });
}

/// The primary execution loop for the audio player backend.
///
/// # Errors
///
/// Returns an error if the MPV context fails to initialize or if the internal
/// command/event loops encounter an unrecoverable failure.
fn audio_player_worker(
    command_rx: Receiver<AudioPlayerCommand>,
    event_tx: Sender<AppEvent>,
    position: SharedPosition,
) -> Result<()> {
    let mut handler = (|| {
        let mut builder = mpv::MpvHandlerBuilder::new().context("Failed to create MPV builder")?;
        builder
            .set_option("vo", "null")
            .context("Failed to set no video output")?;
        builder.build().context("Failed to build MPV handler")
    })()?;

    handler
        .observe_property::<f64>("time-pos", 0)
        .context("Failed to observe time-pos")?;

    let mut tracker = LoadTracker::default();

    loop {
        if !process_commands(&mut handler, &command_rx, &mut tracker)? {
            return Ok(());
        }
        process_mpv_events(&mut handler, &mut tracker, &position, &event_tx)?;
    }
}

/// Drains and executes all pending commands from the application channel.
///
/// Returns `false` once the player handle has gone away.
fn process_commands(
    handler: &mut mpv::MpvHandler,
    command_rx: &mpsc::Receiver<AudioPlayerCommand>,
    tracker: &mut LoadTracker,
) -> Result<bool> {
    loop {
        let command = match command_rx.try_recv() {
            Ok(command) => command,
            Err(mpsc::TryRecvError::Empty) => return Ok(true),
            Err(mpsc::TryRecvError::Disconnected) => return Ok(false),
        };

        match command {
            AudioPlayerCommand::PlayFile(id, location) => {
                tracker.load(id);
                handler
                    .command(&["loadfile", &location, "replace"])
                    .context(format!("Failed to load file: {}", &location))?;
                handler.set_property("pause", false)?;
            }
            AudioPlayerCommand::Pause => handler.set_property("pause", true)?,
            AudioPlayerCommand::Resume => handler.set_property("pause", false)?,
            AudioPlayerCommand::Stop => {
                tracker.stop();
                handler.command(&["stop"])?;
            }
        }
    }
}

/// Polls for MPV events, waiting up to 50ms.
fn process_mpv_events(
    handler: &mut mpv::MpvHandler,
    tracker: &mut LoadTracker,
    position: &SharedPosition,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<()> {
    let Some(mpv_event) = handler.wait_event(0.05) else {
        return Ok(());
    };

    let player_event = match mpv_event {
        mpv::Event::PropertyChange {
            name: "time-pos",
            change: Format::Double(seconds),
            ..
        } if seconds >= 0.0 => {
            if let Ok(mut shared) = position.lock() {
                *shared = Some(seconds);
            }
            None
        }
        mpv::Event::StartFile => {
            tracker.started();
            None
        }
        mpv::Event::EndFile(result) => {
            if let Ok(mut shared) = position.lock() {
                *shared = None;
            }
            let ended = tracker.ended();
            match result {
                Ok(mpv::EndFileReason::MPV_END_FILE_REASON_EOF) => ended.map(PlayerEvent::Completed),
                Ok(_) => None,
                Err(e) => ended.map(|id| PlayerEvent::Failed(id, format!("{:?}", e))),
            }
        }
        _ => None,
    };

    if let Some(event) = player_event {
        event_tx
            .send(AppEvent::Player(event))
            .context("Failed to send player event")?;
    }

    Ok(())
}
