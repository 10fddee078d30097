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

//! Simulated playback backend.
//!
//! Plays nothing: each file "plays" for a fixed duration and then completes.
//! Local files that do not exist fail straight away, remote references are
//! assumed to be playable.

use std::{
    path::Path,
    sync::mpsc::{Receiver, RecvTimeoutError, Sender},
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};

use crate::{
    actions::events::AppEvent,
    engine::session::BindingId,
    player::{AudioPlayerCommand, PlayerEvent, SharedPosition},
};

const TICK: Duration = Duration::from_millis(20);

struct Playing {
    id: BindingId,
    elapsed: Duration,
    resumed_at: Option<Instant>,
}

impl Playing {
    fn elapsed(&self) -> Duration {
        self.elapsed + self.resumed_at.map_or(Duration::ZERO, |t| t.elapsed())
    }
}

/// Spawns the simulated worker thread.
pub(super) fn spawn_player_worker(
    command_rx: Receiver<AudioPlayerCommand>,
    event_tx: Sender<AppEvent>,
    position: SharedPosition,
    track_ms: u64,
) {
    let error_tx = event_tx.clone();

    thread::spawn(move || {
        let duration = Duration::from_millis(track_ms);
        if let Err(e) = simulated_player_worker(command_rx, event_tx, position, duration) {
            let _ = error_tx.send(AppEvent::FatalError(format!(
                "Simulated player failure: {:?}",
                e
            )));
        }
    });
}

fn simulated_player_worker(
    command_rx: Receiver<AudioPlayerCommand>,
    event_tx: Sender<AppEvent>,
    position: SharedPosition,
    duration: Duration,
) -> Result<()> {
    let mut current: Option<Playing> = None;

    loop {
        match command_rx.recv_timeout(TICK) {
            Ok(AudioPlayerCommand::PlayFile(id, location)) => {
                current = None;
                if is_missing_local_file(&location) {
                    log::debug!("Simulated player cannot find {}", location);
                    event_tx
                        .send(AppEvent::Player(PlayerEvent::Failed(
                            id,
                            format!("{} not found", location),
                        )))
                        .context("Failed to send player event")?;
                } else {
                    current = Some(Playing {
                        id,
                        elapsed: Duration::ZERO,
                        resumed_at: Some(Instant::now()),
                    });
                }
            }
            Ok(AudioPlayerCommand::Pause) => {
                if let Some(playing) = current.as_mut() {
                    playing.elapsed = playing.elapsed();
                    playing.resumed_at = None;
                }
            }
            Ok(AudioPlayerCommand::Resume) => {
                if let Some(playing) = current.as_mut() {
                    playing.resumed_at.get_or_insert_with(Instant::now);
                }
            }
            Ok(AudioPlayerCommand::Stop) => current = None,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => return Ok(()),
        }

        let finished = current
            .as_ref()
            .filter(|p| p.elapsed() >= duration)
            .map(|p| p.id);

        if let Some(id) = finished {
            current = None;
            event_tx
                .send(AppEvent::Player(PlayerEvent::Completed(id)))
                .context("Failed to send player event")?;
        }

        if let Ok(mut shared) = position.lock() {
            *shared = current.as_ref().map(|p| p.elapsed().as_secs_f64());
        }
    }
}

fn is_missing_local_file(location: &str) -> bool {
    !location.contains("://") && !Path::new(location).exists()
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    const WAIT: Duration = Duration::from_secs(5);

    fn start(track_ms: u64) -> (Sender<AudioPlayerCommand>, Receiver<AppEvent>) {
        let (command_tx, command_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        spawn_player_worker(command_rx, event_tx, SharedPosition::default(), track_ms);
        (command_tx, event_rx)
    }

    fn player_event(rx: &Receiver<AppEvent>) -> PlayerEvent {
        match rx.recv_timeout(WAIT).unwrap() {
            AppEvent::Player(event) => event,
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn completes_after_the_track_duration() {
        let (tx, rx) = start(10);

        tx.send(AudioPlayerCommand::PlayFile(
            BindingId(1),
            "https://media.example/a.mp3".to_string(),
        ))
        .unwrap();

        assert_eq!(player_event(&rx), PlayerEvent::Completed(BindingId(1)));
    }

    #[test]
    fn missing_local_files_fail() {
        let (tx, rx) = start(10);

        tx.send(AudioPlayerCommand::PlayFile(
            BindingId(7),
            "/definitely/not/here.mp3".to_string(),
        ))
        .unwrap();

        assert!(matches!(
            player_event(&rx),
            PlayerEvent::Failed(BindingId(7), _)
        ));
    }

    #[test]
    fn stopped_tracks_never_complete() {
        let (tx, rx) = start(100);
        let remote = "https://media.example/a.mp3".to_string();

        tx.send(AudioPlayerCommand::PlayFile(BindingId(1), remote.clone()))
            .unwrap();
        tx.send(AudioPlayerCommand::Stop).unwrap();
        tx.send(AudioPlayerCommand::PlayFile(BindingId(2), remote))
            .unwrap();

        assert_eq!(player_event(&rx), PlayerEvent::Completed(BindingId(2)));
    }
}
