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

//! Notifications raised by the engine for the user interface.

use crate::{
    engine::session::SessionState,
    model::{DialectLevel, TrackRef},
};

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Notification {
    NowPlayingChanged(Option<TrackRef>),
    SessionStateChanged(SessionState),
    /// The displayed category changed.
    CategoryChanged {
        dialect_level: DialectLevel,
        category: String,
    },
    EmptyCategoryEncountered(String),
    ChainExhausted,
}

pub(crate) trait PlaybackObserver {
    fn notify(&mut self, notification: Notification);
}
