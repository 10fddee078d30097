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

//! Audio playback control.
//!
//! This module provides the [`AudioPlayer`], the playback resource driven by
//! the engine. It manages a background worker thread that owns the actual
//! audio backend, ensuring that audio operations do not block the main
//! application thread.
//!
//! Each file is played under the [`BindingId`] the engine bound it with, and
//! the worker reports the end of the file, successful or not, tagged with that
//! id as an [`AppEvent::Player`] event.

#[cfg(feature = "mpv")]
mod mpv_worker;
mod simulated;

use std::sync::{Arc, Mutex, mpsc};

use anyhow::Result;

use crate::{
    actions::events::AppEvent,
    config::Backend,
    engine::session::{BindingId, PlaybackResource, ResourceError},
    model::TrackRef,
};

#[derive(Debug, PartialEq)]
pub(crate) enum AudioPlayerCommand {
    PlayFile(BindingId, String),
    Pause,
    Resume,
    Stop,
}

/// End of a file, as reported by a worker.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PlayerEvent {
    Completed(BindingId),
    Failed(BindingId, String),
}

/// Playback position shared with the worker, in seconds.
pub(crate) type SharedPosition = Arc<Mutex<Option<f64>>>;

/// Works out which binding a backend's end-of-file belongs to.
///
/// Loading a file only records the binding as requested. It becomes current
/// when the backend reports that the file actually started, so an end already
/// queued for the previous file is never charged to the new binding.
#[cfg(any(feature = "mpv", test))]
#[derive(Debug, Default)]
pub(crate) struct LoadTracker {
    requested: Option<BindingId>,
    current: Option<BindingId>,
}

#[cfg(any(feature = "mpv", test))]
impl LoadTracker {
    /// A file was loaded for `id`, replacing whatever was playing.
    pub(crate) fn load(&mut self, id: BindingId) {
        self.requested = Some(id);
        self.current = None;
    }

    pub(crate) fn stop(&mut self) {
        self.requested = None;
        self.current = None;
    }

    /// The backend started a file.
    pub(crate) fn started(&mut self) {
        self.current = self.requested;
    }

    /// The backend ended a file. Returns the binding it was started for.
    pub(crate) fn ended(&mut self) -> Option<BindingId> {
        self.current.take()
    }
}

/// A handle to the audio playback worker.
///
/// This struct acts as a command proxy; it does not perform audio processing
/// itself but instead sends instructions to a background worker thread.
pub(crate) struct AudioPlayer {
    /// Channel for sending commands to the background worker thread.
    command_tx: mpsc::Sender<AudioPlayerCommand>,
    bound: Option<(BindingId, String)>,
    position: SharedPosition,
}

impl AudioPlayer {
    /// Spawns the worker for `backend` and returns a new player handle.
    ///
    /// # Arguments
    ///
    /// * `backend` - The audio output to use.
    /// * `simulated_track_ms` - How long the simulated backend plays a track.
    /// * `event_tx` - A channel to send player events (and worker failures)
    ///   back to the main event loop.
    ///
    /// # Errors
    ///
    /// Fails if the MPV backend is requested without MPV support built in.
    pub(crate) fn new(
        backend: Backend,
        simulated_track_ms: u64,
        event_tx: mpsc::Sender<AppEvent>,
    ) -> Result<Self> {
        let (command_tx, command_rx) = mpsc::channel::<AudioPlayerCommand>();
        let position = SharedPosition::default();

        match backend {
            Backend::Simulated => simulated::spawn_player_worker(
                command_rx,
                event_tx,
                position.clone(),
                simulated_track_ms,
            ),
            #[cfg(feature = "mpv")]
            Backend::Mpv => mpv_worker::spawn_player_worker(command_rx, event_tx, position.clone()),
            #[cfg(not(feature = "mpv"))]
            Backend::Mpv => anyhow::bail!("Built without MPV support, enable the `mpv` feature"),
        }

        Ok(Self::with_channel(command_tx, position))
    }

    fn with_channel(
        command_tx: mpsc::Sender<AudioPlayerCommand>,
        position: SharedPosition,
    ) -> Self {
        Self {
            command_tx,
            bound: None,
            position,
        }
    }

    fn send(&self, command: AudioPlayerCommand) -> Result<(), ResourceError> {
        self.command_tx
            .send(command)
            .map_err(|e| ResourceError::Unavailable(e.to_string()))
    }
}

impl PlaybackResource for AudioPlayer {
    fn bind(&mut self, id: BindingId, track: &TrackRef) {
        self.bound = Some((id, track.as_str().to_string()));
    }

    fn start(&mut self) -> Result<(), ResourceError> {
        let (id, location) = self
            .bound
            .clone()
            .ok_or_else(|| ResourceError::Unavailable("nothing bound".to_string()))?;
        self.send(AudioPlayerCommand::PlayFile(id, location))
    }

    fn unbind(&mut self) {
        if self.bound.take().is_some() {
            self.send(AudioPlayerCommand::Stop).ok();
        }
    }

    fn pause(&mut self) {
        self.send(AudioPlayerCommand::Pause).ok();
    }

    fn resume(&mut self) {
        self.send(AudioPlayerCommand::Resume).ok();
    }

    fn current_position(&self) -> Option<f64> {
        self.position.lock().ok().and_then(|p| *p)
    }
}
