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

//! The playback session.
//!
//! A [`Session`] owns the one bound playback resource and walks a playlist
//! track by track. It never calls back into its owner; every operation returns
//! a [`Step`] describing what happened so the owner can react (save a
//! bookmark, continue into the next category, and so on).
//!
//! Every binding is tagged with a fresh [`BindingId`]. Completion and failure
//! signals from the host carry the id of the binding they belong to and are
//! only acted on when that binding is still the current one. A signal for the
//! current binding that lands while paused is held and applied on resume.
//! Anything else is stale and dropped, which is what keeps a `stop()` racing
//! with an in-flight failure from resurrecting playback.

use std::{fmt, rc::Rc};

use thiserror::Error;

use crate::model::{
    TrackRef,
    playlist::{Playlist, Track},
};

/// Identity of one binding of the playback resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct BindingId(pub(crate) u64);

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Error)]
pub(crate) enum ResourceError {
    #[error("playback resource unavailable: {0}")]
    Unavailable(String),
}

/// The host's audio output.
///
/// After a successful [`start`](PlaybackResource::start) the host must report
/// exactly one completion or failure for the binding, asynchronously, tagged
/// with the id given to [`bind`](PlaybackResource::bind).
pub(crate) trait PlaybackResource {
    fn bind(&mut self, id: BindingId, track: &TrackRef);
    fn start(&mut self) -> Result<(), ResourceError>;
    fn unbind(&mut self);
    fn pause(&mut self);
    fn resume(&mut self);
    fn current_position(&self) -> Option<f64>;
}

/// Outcome reported by the host for a bound track.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Signal {
    Completed,
    Failed(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SessionState {
    Idle,
    Playing,
    Paused,
    Ended,
}

/// One-shot sounds played outside any playlist.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Notice {
    EmptyCategory,
    EndOfPlayback,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Slot {
    Track(usize),
    Notice(Notice),
}

/// What a session operation did.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Step {
    /// A playlist track was bound and started.
    Bound { index: usize, track: TrackRef },
    /// The playlist has no further playable track.
    Exhausted,
    NoticePlaying(Notice),
    /// A notice finished, or could not be played at all.
    NoticeFinished(Notice),
    /// Nothing changed.
    Dropped,
}

pub(crate) struct Session<R: PlaybackResource> {
    resource: R,
    state: SessionState,
    playlist: Option<Rc<Playlist>>,
    index: usize,
    bound: Option<(BindingId, Slot)>,
    /// Signal for the bound slot that arrived while paused.
    held: Option<Signal>,
    next_binding: u64,
}

impl<R: PlaybackResource> Session<R> {
    pub(crate) fn new(resource: R) -> Self {
        Self {
            resource,
            state: SessionState::Idle,
            playlist: None,
            index: 0,
            bound: None,
            held: None,
            next_binding: 0,
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        self.state
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn playlist(&self) -> Option<&Rc<Playlist>> {
        self.playlist.as_ref()
    }

    /// Playback position within the bound track, in seconds.
    pub(crate) fn position(&self) -> Option<f64> {
        self.bound.and(self.resource.current_position())
    }

    /// Starts playing `playlist` at `index`.
    ///
    /// Any current binding is released first. Skipped slots and tracks the
    /// resource refuses to start are passed over.
    pub(crate) fn start_from(&mut self, playlist: Rc<Playlist>, index: usize) -> Step {
        self.release();
        self.playlist = Some(playlist);
        self.index = index;
        self.state = SessionState::Playing;
        self.bind_next_playable()
    }

    /// Handles a completion or failure reported by the host.
    pub(crate) fn on_signal(&mut self, id: BindingId, signal: Signal) -> Step {
        let slot = match (self.bound, self.state) {
            (Some((bound_id, slot)), SessionState::Playing) if bound_id == id => slot,
            (Some((bound_id, _)), SessionState::Paused) if bound_id == id => {
                log::debug!("Holding {:?} for binding {} until resumed", signal, id);
                self.held = Some(signal);
                return Step::Dropped;
            }
            _ => {
                log::debug!(
                    "Dropping stale {:?} for binding {} (state {:?})",
                    signal,
                    id,
                    self.state
                );
                return Step::Dropped;
            }
        };

        self.bound = None;

        match slot {
            Slot::Track(index) => {
                if let Signal::Failed(reason) = &signal {
                    log::warn!("Track {} failed, advancing: {}", index, reason);
                }
                self.resource.unbind();
                self.index = index + 1;
                self.bind_next_playable()
            }
            Slot::Notice(notice) => Step::NoticeFinished(notice),
        }
    }

    /// Plays a notice sound in place of any playlist track.
    ///
    /// A notice that cannot be started counts as finished straight away.
    pub(crate) fn play_notice(&mut self, notice: Notice, track: &TrackRef) -> Step {
        self.release();
        self.state = SessionState::Playing;

        let id = self.next_id();
        self.resource.bind(id, track);

        match self.resource.start() {
            Ok(()) => {
                self.bound = Some((id, Slot::Notice(notice)));
                Step::NoticePlaying(notice)
            }
            Err(e) => {
                log::warn!("Notice {:?} could not be played: {}", notice, e);
                self.resource.unbind();
                Step::NoticeFinished(notice)
            }
        }
    }

    pub(crate) fn pause(&mut self) -> bool {
        if self.state != SessionState::Playing {
            return false;
        }
        self.resource.pause();
        self.state = SessionState::Paused;
        true
    }

    /// Resumes a paused session.
    ///
    /// Returns `None` when the session was not paused. A signal held while
    /// paused is applied now, so the result may be a new binding.
    pub(crate) fn resume(&mut self) -> Option<Step> {
        if self.state != SessionState::Paused {
            return None;
        }
        self.resource.resume();
        self.state = SessionState::Playing;
        match (self.held.take(), self.bound) {
            (Some(signal), Some((id, _))) => Some(self.on_signal(id, signal)),
            _ => Some(Step::Dropped),
        }
    }

    /// Tears playback down. Safe to call in any state.
    pub(crate) fn stop(&mut self) {
        self.release();
        self.index = 0;
        self.state = SessionState::Idle;
    }

    /// Marks the end of the whole chain.
    ///
    /// The binding is kept so a notice already playing is heard out; its
    /// completion arrives after the session has left `Playing` and is dropped.
    pub(crate) fn end(&mut self) {
        self.state = SessionState::Ended;
    }

    /// Returns an ended session to `Idle`.
    pub(crate) fn reset(&mut self) {
        if self.state == SessionState::Ended {
            self.index = 0;
            self.state = SessionState::Idle;
        }
    }

    fn bind_next_playable(&mut self) -> Step {
        let Some(playlist) = self.playlist.clone() else {
            return Step::Exhausted;
        };

        loop {
            let Some(track) = playlist.get(self.index) else {
                return Step::Exhausted;
            };

            let Some(track_ref) = track.track_ref() else {
                log::debug!("Skipping slot {} of {}", self.index, playlist.category());
                self.index += 1;
                continue;
            };

            let id = self.next_id();
            self.resource.bind(id, track_ref);

            match self.resource.start() {
                Ok(()) => {
                    self.bound = Some((id, Slot::Track(self.index)));
                    return Step::Bound {
                        index: self.index,
                        track: track_ref.clone(),
                    };
                }
                Err(e) => {
                    let kind = match track {
                        Track::WordAudio(_) => "word",
                        _ => "sentence",
                    };
                    log::warn!("Could not start {} audio {}: {}", kind, track_ref, e);
                    self.resource.unbind();
                    self.index += 1;
                }
            }
        }
    }

    fn release(&mut self) {
        self.held = None;
        if self.bound.take().is_some() {
            self.resource.unbind();
        }
    }

    fn next_id(&mut self) -> BindingId {
        self.next_binding += 1;
        BindingId(self.next_binding)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::model::{
        Dialect, DialectLevel, Level,
        playlist::{
            self,
            tests::{FixedResolver, item},
        },
    };

    #[derive(Debug, Default)]
    pub(crate) struct ResourceLog {
        pub(crate) binds: Vec<(BindingId, String)>,
        pub(crate) unbinds: usize,
        pub(crate) paused: bool,
        pub(crate) playing: Option<String>,
        /// Tracks whose start fails synchronously.
        pub(crate) refuse: Vec<String>,
    }

    impl ResourceLog {
        pub(crate) fn last_binding(&self) -> BindingId {
            self.binds.last().unwrap().0
        }

        pub(crate) fn bound_tracks(&self) -> Vec<&str> {
            self.binds.iter().map(|(_, t)| t.as_str()).collect()
        }
    }

    /// Playback resource that records what the session asks of it.
    #[derive(Clone, Default)]
    pub(crate) struct FakeResource {
        pub(crate) log: Rc<RefCell<ResourceLog>>,
    }

    impl PlaybackResource for FakeResource {
        fn bind(&mut self, id: BindingId, track: &TrackRef) {
            let mut log = self.log.borrow_mut();
            log.binds.push((id, track.as_str().to_string()));
            log.playing = Some(track.as_str().to_string());
        }

        fn start(&mut self) -> Result<(), ResourceError> {
            let log = self.log.borrow();
            match &log.playing {
                Some(t) if log.refuse.contains(t) => Err(ResourceError::Unavailable(t.clone())),
                _ => Ok(()),
            }
        }

        fn unbind(&mut self) {
            let mut log = self.log.borrow_mut();
            log.unbinds += 1;
            log.playing = None;
        }

        fn pause(&mut self) {
            self.log.borrow_mut().paused = true;
        }

        fn resume(&mut self) {
            self.log.borrow_mut().paused = false;
        }

        fn current_position(&self) -> Option<f64> {
            self.log.borrow().playing.as_ref().map(|_| 1.5)
        }
    }

    fn playlist(rows: usize, resolver: &FixedResolver) -> Rc<Playlist> {
        let items: Vec<_> = (1..=rows).map(|i| item(i, "A")).collect();
        let refs: Vec<_> = items.iter().collect();
        Rc::new(playlist::build(
            DialectLevel::new(Dialect::Sixian, Level::Basic),
            "A",
            &refs,
            resolver,
        ))
    }

    fn session() -> (Session<FakeResource>, Rc<RefCell<ResourceLog>>) {
        let resource = FakeResource::default();
        let log = resource.log.clone();
        (Session::new(resource), log)
    }

    #[test]
    fn completion_advances_through_the_playlist() {
        let (mut session, log) = session();
        let playlist = playlist(2, &FixedResolver::all_available());

        assert_eq!(
            session.start_from(playlist, 0),
            Step::Bound {
                index: 0,
                track: TrackRef::new("001.mp3")
            }
        );
        for expected in 1..4 {
            let id = log.borrow().last_binding();
            assert!(matches!(
                session.on_signal(id, Signal::Completed),
                Step::Bound { index, .. } if index == expected
            ));
        }

        let id = log.borrow().last_binding();
        assert_eq!(session.on_signal(id, Signal::Completed), Step::Exhausted);
        assert_eq!(
            log.borrow().bound_tracks(),
            vec!["001.mp3", "001s.mp3", "002.mp3", "002s.mp3"]
        );
    }

    #[test]
    fn skips_are_never_bound() {
        let (mut session, log) = session();
        let resolver = FixedResolver {
            silent_words: vec!["002".to_string()],
            silent_sentences: vec!["001".to_string(), "002".to_string()],
        };
        let playlist = playlist(3, &resolver);

        session.start_from(playlist, 0);
        let id = log.borrow().last_binding();
        let step = session.on_signal(id, Signal::Completed);

        assert!(matches!(step, Step::Bound { index: 4, .. }));
        assert_eq!(log.borrow().bound_tracks(), vec!["001.mp3", "003.mp3"]);
    }

    #[test]
    fn failures_advance_like_completions() {
        let (mut session, log) = session();
        log.borrow_mut().refuse.push("001.mp3".to_string());
        let playlist = playlist(2, &FixedResolver::all_available());

        // Synchronous start failure passes straight on to the next slot.
        assert!(matches!(
            session.start_from(playlist, 0),
            Step::Bound { index: 1, .. }
        ));

        let id = log.borrow().last_binding();
        assert!(matches!(
            session.on_signal(id, Signal::Failed("decode error".to_string())),
            Step::Bound { index: 2, .. }
        ));
    }

    #[test]
    fn starting_past_the_end_is_exhausted() {
        let (mut session, log) = session();
        let playlist = playlist(1, &FixedResolver::all_available());

        assert_eq!(session.start_from(playlist, 2), Step::Exhausted);
        assert!(log.borrow().binds.is_empty());
        assert_eq!(session.state(), SessionState::Playing);
    }

    #[test]
    fn stale_signal_after_stop_is_dropped() {
        let (mut session, log) = session();
        let playlist = playlist(2, &FixedResolver::all_available());

        session.start_from(playlist, 0);
        let id = log.borrow().last_binding();
        session.stop();

        assert_eq!(session.on_signal(id, Signal::Failed("late".to_string())), Step::Dropped);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.index(), 0);
        assert_eq!(log.borrow().binds.len(), 1);
    }

    #[test]
    fn signal_from_a_replaced_binding_is_dropped() {
        let (mut session, log) = session();
        let playlist = playlist(3, &FixedResolver::all_available());

        session.start_from(playlist.clone(), 0);
        let old = log.borrow().last_binding();
        session.start_from(playlist, 4);

        assert_eq!(session.on_signal(old, Signal::Completed), Step::Dropped);
        assert_eq!(session.index(), 4);
        assert_eq!(log.borrow().binds.len(), 2);
    }

    #[test]
    fn completion_while_paused_is_applied_on_resume() {
        let (mut session, log) = session();
        session.start_from(playlist(2, &FixedResolver::all_available()), 0);
        let id = log.borrow().last_binding();

        assert!(session.pause());
        assert!(log.borrow().paused);
        assert_eq!(session.on_signal(id, Signal::Completed), Step::Dropped);
        assert_eq!(session.index(), 0);
        assert_eq!(log.borrow().binds.len(), 1);

        assert!(matches!(session.resume(), Some(Step::Bound { index: 1, .. })));
        assert_eq!(session.state(), SessionState::Playing);
        assert_eq!(log.borrow().bound_tracks(), vec!["001.mp3", "001s.mp3"]);
        assert_eq!(session.resume(), None);

        // The held signal was consumed.
        assert_eq!(session.on_signal(id, Signal::Completed), Step::Dropped);
    }

    #[test]
    fn resume_without_a_held_signal_keeps_the_binding() {
        let (mut session, log) = session();
        session.start_from(playlist(2, &FixedResolver::all_available()), 0);
        let id = log.borrow().last_binding();

        session.pause();
        assert_eq!(session.resume(), Some(Step::Dropped));
        assert!(!log.borrow().paused);
        assert!(matches!(
            session.on_signal(id, Signal::Completed),
            Step::Bound { index: 1, .. }
        ));
    }

    #[test]
    fn paused_signal_for_another_binding_is_not_held() {
        let (mut session, log) = session();
        let playlist = playlist(2, &FixedResolver::all_available());
        session.start_from(playlist.clone(), 0);
        let old = log.borrow().last_binding();
        session.start_from(playlist, 2);

        session.pause();
        assert_eq!(session.on_signal(old, Signal::Failed("late".to_string())), Step::Dropped);
        assert_eq!(session.resume(), Some(Step::Dropped));
        assert_eq!(session.index(), 2);
        assert_eq!(log.borrow().binds.len(), 2);
    }

    #[test]
    fn stop_discards_a_held_signal() {
        let (mut session, log) = session();
        let playlist = playlist(2, &FixedResolver::all_available());
        session.start_from(playlist.clone(), 0);
        let id = log.borrow().last_binding();

        session.pause();
        session.on_signal(id, Signal::Completed);
        session.stop();
        session.start_from(playlist, 2);
        session.pause();

        assert_eq!(session.resume(), Some(Step::Dropped));
        assert_eq!(session.index(), 2);
    }

    #[test]
    fn pause_and_resume_outside_their_states_do_nothing() {
        let (mut session, _) = session();

        assert!(!session.pause());
        assert_eq!(session.resume(), None);
        session.stop();
        session.stop();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.position(), None);
    }

    #[test]
    fn notices_report_their_completion() {
        let (mut session, log) = session();

        assert_eq!(
            session.play_notice(Notice::EmptyCategory, &TrackRef::new("empty.mp3")),
            Step::NoticePlaying(Notice::EmptyCategory)
        );
        let id = log.borrow().last_binding();
        assert_eq!(
            session.on_signal(id, Signal::Completed),
            Step::NoticeFinished(Notice::EmptyCategory)
        );

        log.borrow_mut().refuse.push("end.mp3".to_string());
        assert_eq!(
            session.play_notice(Notice::EndOfPlayback, &TrackRef::new("end.mp3")),
            Step::NoticeFinished(Notice::EndOfPlayback)
        );
    }

    #[test]
    fn ended_session_lets_its_notice_finish_unheard() {
        let (mut session, log) = session();

        session.play_notice(Notice::EndOfPlayback, &TrackRef::new("end.mp3"));
        let id = log.borrow().last_binding();
        session.end();
        assert_eq!(session.state(), SessionState::Ended);
        session.reset();

        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(log.borrow().unbinds, 0);
        assert_eq!(session.on_signal(id, Signal::Completed), Step::Dropped);
    }
}
