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

use std::{cell::RefCell, rc::Rc};

use super::*;
use crate::{
    bookmarks::MemoryBucket,
    engine::{
        observer::tests::Recorder,
        session::tests::{FakeResource, ResourceLog},
    },
    model::{
        Dialect, Level,
        playlist::tests::{FixedResolver, item},
    },
};

type TestEngine = Engine<FakeResource, Recorder>;

struct Fixture {
    engine: TestEngine,
    log: Rc<RefCell<ResourceLog>>,
    recorder: Recorder,
    bucket: MemoryBucket,
}

fn dl() -> DialectLevel {
    DialectLevel::new(Dialect::Sixian, Level::Basic)
}

fn catalog() -> Catalog {
    let mut catalog = Catalog::default();
    catalog.insert(
        dl(),
        vec![
            item(1, "A"),
            item(2, "A"),
            item(3, "C"),
            item(4, "C"),
            item(5, "C"),
        ],
    );
    catalog.set_category_order(vec!["A".to_string(), "B".to_string(), "C".to_string()]);
    catalog
}

fn fixture_with(bucket: MemoryBucket) -> Fixture {
    let resource = FakeResource::default();
    let log = resource.log.clone();
    let recorder = Recorder::default();

    let engine = Engine::new(
        catalog(),
        Box::new(FixedResolver::all_available()),
        resource,
        BookmarkStore::open(Box::new(bucket.clone())),
        recorder.clone(),
        NoticeSounds {
            empty_category: TrackRef::new("empty.mp3"),
            end_of_playback: TrackRef::new("end.mp3"),
        },
    );

    Fixture {
        engine,
        log,
        recorder,
        bucket,
    }
}

fn fixture() -> Fixture {
    fixture_with(MemoryBucket::default())
}

impl Fixture {
    fn complete(&mut self) {
        let id = self.log.borrow().last_binding();
        self.engine.on_resource_event(id, Signal::Completed);
    }

    fn bound(&self) -> Vec<String> {
        self.log
            .borrow()
            .bound_tracks()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn bookmark(&self, category: &str) -> Option<(String, f64)> {
        self.engine
            .bookmarks()
            .get(&dl().name(), category)
            .map(|b| (b.row_id.clone(), b.percentage))
    }
}

#[test]
fn play_from_row_starts_at_the_rows_word_recording() {
    let mut f = fixture();
    f.engine.open(dl(), "C", None).unwrap();
    assert!(f.bound().is_empty());

    f.engine.play_from_row("004").unwrap();

    assert_eq!(f.bound(), vec!["004.mp3"]);
    assert_eq!(f.engine.now_playing(), Some(("004".to_string(), 2)));
    assert_eq!(f.engine.state(), SessionState::Playing);
    assert_eq!(f.bookmark("C"), Some(("004".to_string(), 66.67)));
}

#[test]
fn bookmark_follows_row_boundaries() {
    let mut f = fixture();
    f.engine.open(dl(), "A", Some("001")).unwrap();
    let written = f.bucket.contents();

    // Sentence of the same row: no new bookmark.
    f.complete();
    assert_eq!(f.bound().last().map(String::as_str), Some("001s.mp3"));
    assert_eq!(f.bucket.contents(), written);

    f.complete();
    assert_eq!(f.bookmark("A"), Some(("002".to_string(), 100.0)));
}

#[test]
fn stale_failure_after_stop_never_resumes_playback() {
    let mut f = fixture();
    f.engine.open(dl(), "A", Some("001")).unwrap();
    let id = f.log.borrow().last_binding();

    f.engine.stop();
    f.engine
        .on_resource_event(id, Signal::Failed("network".to_string()));

    assert_eq!(f.engine.state(), SessionState::Idle);
    assert_eq!(f.bound(), vec!["001.mp3"]);
    assert_eq!(f.engine.now_playing(), None);
}

#[test]
fn unavailable_tracks_are_passed_over_silently() {
    let mut f = fixture();
    f.log.borrow_mut().refuse.push("001.mp3".to_string());

    f.engine.open(dl(), "A", Some("001")).unwrap();

    assert_eq!(f.bound(), vec!["001.mp3", "001s.mp3"]);
    assert_eq!(f.engine.state(), SessionState::Playing);
    assert_eq!(f.bookmark("A"), Some(("001".to_string(), 50.0)));
}

#[test]
fn chain_announces_empty_category_and_continues() {
    let mut f = fixture();
    f.engine.open(dl(), "A", Some("002")).unwrap();
    assert_eq!(f.engine.share_ref().and_then(|s| s.row.as_deref()), Some("002"));

    f.complete();
    f.complete();

    // A is exhausted and B has no rows: only the notice is bound.
    assert_eq!(f.bound(), vec!["002.mp3", "002s.mp3", "empty.mp3"]);
    assert_eq!(
        f.recorder
            .count(&Notification::EmptyCategoryEncountered("B".to_string())),
        1
    );
    assert_eq!(f.engine.displayed().map(|p| p.category()), Some("B"));
    assert!(f.bookmark("A").is_some());

    f.complete();

    assert_eq!(f.bound().last().map(String::as_str), Some("003.mp3"));
    assert_eq!(f.engine.displayed().map(|p| p.category()), Some("C"));
    assert_eq!(f.bookmark("A"), None);
    assert_eq!(f.bookmark("C"), Some(("003".to_string(), 33.33)));
    assert_eq!(
        f.engine.share_ref(),
        Some(&ShareRef::new(dl(), "C", None))
    );
    assert_eq!(
        f.recorder
            .count(&Notification::EmptyCategoryEncountered("B".to_string())),
        1
    );
}

#[test]
fn last_category_ends_playback_and_removes_its_bookmark() {
    let mut f = fixture();
    f.engine.open(dl(), "C", Some("003")).unwrap();

    for _ in 0..6 {
        f.complete();
    }

    assert_eq!(
        f.bound(),
        vec!["003.mp3", "003s.mp3", "004.mp3", "004s.mp3", "005.mp3", "005s.mp3", "end.mp3"]
    );
    assert_eq!(f.engine.state(), SessionState::Idle);
    assert!(f.engine.bookmarks().entries().is_empty());
    assert_eq!(f.recorder.count(&Notification::ChainExhausted), 1);
    assert_eq!(
        f.recorder.states(),
        vec![
            SessionState::Playing,
            SessionState::Ended,
            SessionState::Idle
        ]
    );

    // The end notice finishing afterwards changes nothing.
    f.complete();
    assert_eq!(f.bound().len(), 7);
    assert_eq!(f.recorder.count(&Notification::ChainExhausted), 1);
}

#[test]
fn manual_category_switch_keeps_bookmarks_and_does_not_play() {
    let mut f = fixture();
    f.engine.open(dl(), "A", Some("001")).unwrap();

    f.engine.select_category("C").unwrap();

    assert_eq!(f.engine.state(), SessionState::Idle);
    assert_eq!(f.bound(), vec!["001.mp3"]);
    assert!(f.bookmark("A").is_some());
    assert_eq!(f.engine.displayed().map(|p| p.category()), Some("C"));

    assert!(!f.engine.select_next_category().unwrap());
    assert!(matches!(
        f.engine.select_category("Z"),
        Err(EngineError::UnknownCategory { .. })
    ));
}

#[test]
fn resume_latest_restarts_at_the_saved_row() {
    let bucket = MemoryBucket::default();
    {
        let mut store = BookmarkStore::open(Box::new(bucket.clone()));
        store.save(&dl().name(), "A", "001", 50.0);
        store.save(&dl().name(), "C", "004", 66.67);
    }
    let mut f = fixture_with(bucket);

    assert!(f.engine.resume_latest().unwrap());

    assert_eq!(f.bound(), vec!["004.mp3"]);
    assert_eq!(f.engine.displayed().map(|p| p.category()), Some("C"));
    assert_eq!(f.engine.bookmarks().selector().len(), 2);

    let key = format!("{}||A", dl().name());
    f.engine.restore_bookmark(&key).unwrap();
    assert_eq!(f.bound().last().map(String::as_str), Some("001.mp3"));

    assert!(matches!(
        f.engine.restore_bookmark("nope"),
        Err(EngineError::UnknownBookmark(_))
    ));
}

#[test]
fn resume_latest_without_bookmarks_does_nothing() {
    let mut f = fixture();

    assert!(!f.engine.resume_latest().unwrap());
    assert!(f.bound().is_empty());
}

#[test]
fn shared_reference_without_row_only_shows_the_category() {
    let mut f = fixture();

    f.engine.restore(&ShareRef::new(dl(), "C", None)).unwrap();
    assert!(f.bound().is_empty());
    assert_eq!(f.engine.displayed().map(|p| p.row_count()), Some(3));

    f.engine
        .restore(&ShareRef::new(dl(), "C", Some("005")))
        .unwrap();
    assert_eq!(f.bound(), vec!["005.mp3"]);

    assert!(matches!(
        f.engine.restore(&ShareRef::new(dl(), "C", Some("001"))),
        Err(EngineError::UnknownRow { .. })
    ));
    assert!(matches!(
        f.engine.restore(&ShareRef::new(
            DialectLevel::new(Dialect::Dapu, Level::Basic),
            "A",
            None
        )),
        Err(EngineError::UnknownDialectLevel(_))
    ));
    // Failed restores leave playback alone.
    assert_eq!(f.engine.state(), SessionState::Playing);
}

#[test]
fn pause_and_resume_keep_the_position() {
    let mut f = fixture();
    f.engine.open(dl(), "A", Some("002")).unwrap();

    f.engine.toggle_pause();
    assert_eq!(f.engine.state(), SessionState::Paused);
    assert!(f.log.borrow().paused);

    f.engine.play().unwrap();
    assert_eq!(f.engine.state(), SessionState::Playing);
    assert!(!f.log.borrow().paused);
    assert_eq!(f.bound(), vec!["002.mp3"]);
    assert_eq!(f.engine.now_playing(), Some(("002".to_string(), 2)));
    assert_eq!(f.engine.position(), Some(1.5));
}

#[test]
fn completion_while_paused_continues_on_resume() {
    let mut f = fixture();
    f.engine.open(dl(), "A", Some("001")).unwrap();

    f.engine.pause();
    f.complete();
    assert_eq!(f.bound(), vec!["001.mp3"]);
    assert_eq!(f.engine.state(), SessionState::Paused);

    f.engine.resume();
    assert_eq!(f.engine.state(), SessionState::Playing);
    assert_eq!(f.bound(), vec!["001.mp3", "001s.mp3"]);
    assert_eq!(f.engine.now_playing(), Some(("001".to_string(), 1)));

    f.complete();
    assert_eq!(f.bound(), vec!["001.mp3", "001s.mp3", "002.mp3"]);
}

#[test]
fn play_starts_the_shown_category_from_the_top() {
    let mut f = fixture();
    assert!(matches!(f.engine.play(), Err(EngineError::NothingOpen)));

    f.engine.open(dl(), "C", None).unwrap();
    f.engine.play().unwrap();

    assert_eq!(f.bound(), vec!["003.mp3"]);
}

#[test]
fn attach_and_detach_are_idempotent() {
    let mut f = fixture();
    assert!(f.engine.attach().is_empty());

    f.engine.open(dl(), "A", None).unwrap();
    let controls = f.engine.attach();
    assert_eq!(
        controls,
        vec![
            RowControl {
                row_id: "001".to_string(),
                track_index: 0
            },
            RowControl {
                row_id: "002".to_string(),
                track_index: 2
            },
        ]
    );
    assert_eq!(f.engine.attach(), controls);
    assert!(f.engine.is_attached());

    f.engine.select_category("C").unwrap();
    assert!(!f.engine.is_attached());
    f.engine.detach();
    assert!(!f.engine.is_attached());
}
