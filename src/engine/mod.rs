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

//! Sequential playback engine.
//!
//! The [`Engine`] ties together the vocabulary catalog, the playlist builder,
//! the playback [`Session`], the category chain and the [`BookmarkStore`]:
//!
//! * Opening a category builds its playlist and shows it.
//! * Playing from a row starts the session at that row's word recording.
//! * Each time playback reaches a new row a bookmark is saved for it.
//! * When a playlist runs out the chain moves on to the next category,
//!   announcing empty categories with a notice sound, and the bookmark of the
//!   finished category is removed once the next one starts.
//! * When the chain runs out an end-of-playback notice is played and the
//!   session returns to idle.
//!
//! The engine is single threaded. Host signals are fed in through
//! [`Engine::on_resource_event`] by whichever loop owns it.

pub(crate) mod observer;
pub(crate) mod session;

use std::rc::Rc;

use thiserror::Error;

use crate::{
    bookmarks::BookmarkStore,
    catalog::Catalog,
    engine::{
        observer::{Notification, PlaybackObserver},
        session::{BindingId, Notice, PlaybackResource, Session, SessionState, Signal, Step},
    },
    model::{
        DialectLevel, TrackRef,
        chain::CategoryChain,
        playlist::{self, Playlist},
    },
    resolver::TrackResolver,
    share::ShareRef,
};

#[derive(Debug, Error)]
pub(crate) enum EngineError {
    #[error("no vocabulary loaded for {0}")]
    UnknownDialectLevel(String),
    #[error("{dialect_level} has no category {category}")]
    UnknownCategory {
        dialect_level: DialectLevel,
        category: String,
    },
    #[error("category {category} has no row {row_id}")]
    UnknownRow { category: String, row_id: String },
    #[error("no bookmark {0}")]
    UnknownBookmark(String),
    #[error("no category is open")]
    NothingOpen,
}

/// The one-shot sounds played between categories and at the end.
#[derive(Clone, Debug)]
pub(crate) struct NoticeSounds {
    pub(crate) empty_category: TrackRef,
    pub(crate) end_of_playback: TrackRef,
}

/// Control exposed for one displayed row.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RowControl {
    pub(crate) row_id: String,
    pub(crate) track_index: usize,
}

/// Identifies the row a bookmark was last saved for.
type RowKey = (DialectLevel, String, String);

pub(crate) struct Engine<R: PlaybackResource, O: PlaybackObserver> {
    catalog: Catalog,
    resolver: Box<dyn TrackResolver>,
    session: Session<R>,
    bookmarks: BookmarkStore,
    observer: O,
    notices: NoticeSounds,

    dialect_level: Option<DialectLevel>,
    chain: Option<CategoryChain>,
    displayed: Option<Rc<Playlist>>,
    attached: bool,
    share: Option<ShareRef>,

    /// Category whose playlist ran out while the chain moves on.
    finished: Option<(DialectLevel, String)>,
    last_saved: Option<RowKey>,
    reported_state: SessionState,
}

impl<R: PlaybackResource, O: PlaybackObserver> Engine<R, O> {
    pub(crate) fn new(
        catalog: Catalog,
        resolver: Box<dyn TrackResolver>,
        resource: R,
        bookmarks: BookmarkStore,
        observer: O,
        notices: NoticeSounds,
    ) -> Self {
        Self {
            catalog,
            resolver,
            session: Session::new(resource),
            bookmarks,
            observer,
            notices,
            dialect_level: None,
            chain: None,
            displayed: None,
            attached: false,
            share: None,
            finished: None,
            last_saved: None,
            reported_state: SessionState::Idle,
        }
    }

    pub(crate) fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub(crate) fn bookmarks(&self) -> &BookmarkStore {
        &self.bookmarks
    }

    pub(crate) fn state(&self) -> SessionState {
        self.session.state()
    }

    /// The category currently shown.
    pub(crate) fn displayed(&self) -> Option<&Playlist> {
        self.displayed.as_deref()
    }

    /// Row id and index of the playing track, if any.
    pub(crate) fn now_playing(&self) -> Option<(String, usize)> {
        if !matches!(self.state(), SessionState::Playing | SessionState::Paused) {
            return None;
        }
        let index = self.session.index();
        self.session
            .playlist()?
            .row_at(index)
            .map(|(_, row)| (row.to_string(), index))
    }

    pub(crate) fn position(&self) -> Option<f64> {
        self.session.position()
    }

    pub(crate) fn share_ref(&self) -> Option<&ShareRef> {
        self.share.as_ref()
    }

    /// Shows a category and, given a row, starts playing from it.
    pub(crate) fn open(
        &mut self,
        dialect_level: DialectLevel,
        category: &str,
        row_id: Option<&str>,
    ) -> Result<(), EngineError> {
        let names = self
            .catalog
            .categories(dialect_level)
            .ok_or_else(|| EngineError::UnknownDialectLevel(dialect_level.name()))?
            .to_vec();

        let chain = CategoryChain::new(names, category).ok_or_else(|| EngineError::UnknownCategory {
            dialect_level,
            category: category.to_string(),
        })?;

        if let Some(row_id) = row_id {
            let playlist = self.build(dialect_level, category);
            if playlist.row_position(row_id).is_none() {
                return Err(EngineError::UnknownRow {
                    category: category.to_string(),
                    row_id: row_id.to_string(),
                });
            }
        }

        self.stop();
        self.dialect_level = Some(dialect_level);
        self.chain = Some(chain);
        self.show(dialect_level, category);
        self.share = Some(ShareRef::new(dialect_level, category, row_id));

        match row_id {
            Some(row_id) => self.play_from_row(row_id),
            None => Ok(()),
        }
    }

    /// Manually switches the shown category.
    ///
    /// Playback stops; nothing starts and no bookmark is touched.
    pub(crate) fn select_category(&mut self, category: &str) -> Result<(), EngineError> {
        let dialect_level = self.dialect_level.ok_or(EngineError::NothingOpen)?;
        let chain = self.chain.as_mut().ok_or(EngineError::NothingOpen)?;

        if !chain.select(category) {
            return Err(EngineError::UnknownCategory {
                dialect_level,
                category: category.to_string(),
            });
        }

        self.stop();
        self.show(dialect_level, category);
        self.share = Some(ShareRef::new(dialect_level, category, None));
        Ok(())
    }

    /// Selects the category after the shown one, if there is one.
    pub(crate) fn select_next_category(&mut self) -> Result<bool, EngineError> {
        let next = self
            .chain
            .as_ref()
            .ok_or(EngineError::NothingOpen)?
            .peek_next()
            .map(str::to_string);

        match next {
            Some(next) => self.select_category(&next).map(|()| true),
            None => Ok(false),
        }
    }

    /// Plays the shown category from the start, or resumes it when paused.
    pub(crate) fn play(&mut self) -> Result<(), EngineError> {
        match self.state() {
            SessionState::Paused => {
                self.resume();
                Ok(())
            }
            SessionState::Playing => Ok(()),
            SessionState::Idle | SessionState::Ended => {
                let playlist = self.displayed.clone().ok_or(EngineError::NothingOpen)?;
                self.start(playlist, 0);
                Ok(())
            }
        }
    }

    /// Restarts playback at a row of the shown category.
    pub(crate) fn play_from_row(&mut self, row_id: &str) -> Result<(), EngineError> {
        let playlist = self.displayed.clone().ok_or(EngineError::NothingOpen)?;
        let index = playlist
            .track_index_for_row(row_id)
            .ok_or_else(|| EngineError::UnknownRow {
                category: playlist.category().to_string(),
                row_id: row_id.to_string(),
            })?;

        self.session.stop();
        self.start(playlist, index);
        Ok(())
    }

    pub(crate) fn pause(&mut self) {
        if self.session.pause() {
            self.report_state();
        }
    }

    /// Resumes playback, applying any completion that arrived while paused.
    pub(crate) fn resume(&mut self) {
        if let Some(step) = self.session.resume() {
            self.drive(step);
        }
    }

    pub(crate) fn toggle_pause(&mut self) {
        match self.state() {
            SessionState::Playing => self.pause(),
            SessionState::Paused => self.resume(),
            _ => {}
        }
    }

    /// Stops playback. Always safe.
    pub(crate) fn stop(&mut self) {
        let was_active = self.session.playlist().is_some() && self.state() != SessionState::Idle;
        self.session.stop();
        self.finished = None;
        if was_active {
            self.observer.notify(Notification::NowPlayingChanged(None));
        }
        self.report_state();
    }

    /// Feeds in a completion or failure reported by the playback resource.
    pub(crate) fn on_resource_event(&mut self, id: BindingId, signal: Signal) {
        let step = self.session.on_signal(id, signal);
        self.drive(step);
    }

    /// Shows and plays the target of a shared reference.
    pub(crate) fn restore(&mut self, share: &ShareRef) -> Result<(), EngineError> {
        self.open(share.dialect_level, &share.category, share.row.as_deref())
    }

    /// Continues from a saved bookmark, identified by its selector key.
    pub(crate) fn restore_bookmark(&mut self, key: &str) -> Result<(), EngineError> {
        let bookmark = self
            .bookmarks
            .find_by_key(key)
            .ok_or_else(|| EngineError::UnknownBookmark(key.to_string()))?;

        let dialect_level = DialectLevel::from_name(&bookmark.dialect_level)
            .ok_or_else(|| EngineError::UnknownDialectLevel(bookmark.dialect_level.clone()))?;
        let category = bookmark.category.clone();
        let row_id = bookmark.row_id.clone();

        self.open(dialect_level, &category, Some(&row_id))
    }

    /// Continues from the most recent bookmark.
    ///
    /// Returns `false` when there is none.
    pub(crate) fn resume_latest(&mut self) -> Result<bool, EngineError> {
        match self.bookmarks.latest().map(|b| b.key()) {
            Some(key) => self.restore_bookmark(&key).map(|()| true),
            None => Ok(false),
        }
    }

    /// Hooks up the row controls of the shown category.
    ///
    /// Calling it again while attached returns the same controls.
    pub(crate) fn attach(&mut self) -> Vec<RowControl> {
        let Some(playlist) = self.displayed.as_ref() else {
            return Vec::new();
        };

        if !self.attached {
            log::debug!("Attached to {}", playlist.category());
            self.attached = true;
        }

        playlist
            .row_ids()
            .enumerate()
            .map(|(position, row_id)| RowControl {
                row_id: row_id.to_string(),
                track_index: position * playlist::SLOTS_PER_ROW,
            })
            .collect()
    }

    pub(crate) fn detach(&mut self) {
        if self.attached {
            self.attached = false;
            log::debug!("Detached");
        }
    }

    pub(crate) fn is_attached(&self) -> bool {
        self.attached
    }

    fn build(&self, dialect_level: DialectLevel, category: &str) -> Playlist {
        let items = self.catalog.items_in(dialect_level, category);
        playlist::build(dialect_level, category, &items, self.resolver.as_ref())
    }

    fn show(&mut self, dialect_level: DialectLevel, category: &str) -> Rc<Playlist> {
        self.detach();
        let playlist = Rc::new(self.build(dialect_level, category));
        self.displayed = Some(playlist.clone());
        self.observer.notify(Notification::CategoryChanged {
            dialect_level,
            category: category.to_string(),
        });
        playlist
    }

    /// Explicit start requested by the user.
    fn start(&mut self, playlist: Rc<Playlist>, index: usize) {
        self.finished = None;
        self.last_saved = None;
        let step = self.session.start_from(playlist, index);
        self.drive(step);
    }

    fn drive(&mut self, mut step: Step) {
        loop {
            self.report_state();

            step = match step {
                Step::Bound { index, track } => {
                    self.on_bound(index, track);
                    return;
                }
                Step::NoticePlaying(notice) => {
                    log::info!("Playing notice {:?}", notice);
                    return;
                }
                Step::Dropped | Step::NoticeFinished(Notice::EndOfPlayback) => return,
                Step::Exhausted => {
                    if let Some(playlist) = self.session.playlist() {
                        log::info!("Finished category {}", playlist.category());
                        self.finished =
                            Some((playlist.dialect_level(), playlist.category().to_string()));
                    }
                    match self.continue_chain() {
                        Some(step) => step,
                        None => return,
                    }
                }
                Step::NoticeFinished(Notice::EmptyCategory) => match self.continue_chain() {
                    Some(step) => step,
                    None => return,
                },
            };
        }
    }

    /// Moves on to the category after the chain cursor.
    ///
    /// Returns `None` once the chain is exhausted and playback is over.
    fn continue_chain(&mut self) -> Option<Step> {
        let dialect_level = self.dialect_level?;
        let chain = self.chain.as_mut()?;
        let from = chain.current().to_string();
        let next = chain.advance().map(str::to_string);

        let Some(next) = next else {
            self.finish_chain();
            return None;
        };

        log::info!("Continuing from {} into {}", from, next);
        let playlist = self.show(dialect_level, &next);
        self.share = Some(ShareRef::new(dialect_level, &next, None));

        if playlist.is_empty() {
            log::info!("Category {} is empty", next);
            self.observer
                .notify(Notification::EmptyCategoryEncountered(next));
            let sound = self.notices.empty_category.clone();
            return Some(self.session.play_notice(Notice::EmptyCategory, &sound));
        }

        if let Some((dl, category)) = self.finished.take() {
            self.bookmarks.remove(&dl.name(), &category);
        }
        self.last_saved = None;
        Some(self.session.start_from(playlist, 0))
    }

    fn finish_chain(&mut self) {
        log::info!("End of playback");

        let sound = self.notices.end_of_playback.clone();
        self.session.play_notice(Notice::EndOfPlayback, &sound);

        if let Some((dl, category)) = self.finished.take() {
            self.bookmarks.remove(&dl.name(), &category);
        }

        self.session.end();
        self.report_state();
        self.session.reset();
        self.report_state();

        self.observer.notify(Notification::NowPlayingChanged(None));
        self.observer.notify(Notification::ChainExhausted);
    }

    fn on_bound(&mut self, index: usize, track: TrackRef) {
        log::info!("Now playing {}", track);
        self.observer
            .notify(Notification::NowPlayingChanged(Some(track)));

        let Some(playlist) = self.session.playlist().cloned() else {
            return;
        };
        let Some((position, row_id)) = playlist.row_at(index) else {
            return;
        };

        let key = (
            playlist.dialect_level(),
            playlist.category().to_string(),
            row_id.to_string(),
        );
        if self.last_saved.as_ref() == Some(&key) {
            return;
        }

        self.bookmarks.save(
            &playlist.dialect_level().name(),
            playlist.category(),
            row_id,
            playlist.percentage_at(position),
        );
        self.last_saved = Some(key);
    }

    fn report_state(&mut self) {
        let state = self.session.state();
        if state != self.reported_state {
            self.reported_state = state;
            self.observer
                .notify(Notification::SessionStateChanged(state));
        }
    }
}

#[cfg(test)]
mod tests;
