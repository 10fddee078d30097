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

//! Playlists and the playlist builder.
//!
//! A playlist is the flat track sequence for one category. Every vocabulary
//! row contributes exactly two slots, the word recording followed by the
//! sentence recording, so the first slot of a row is always at
//! `2 × row position` whether or not any audio exists for it.

use crate::{
    model::{DialectLevel, TrackRef, VocabularyItem},
    resolver::TrackResolver,
};

/// Number of track slots each vocabulary row occupies.
pub(crate) const SLOTS_PER_ROW: usize = 2;

/// One playable or skipped slot in a playlist.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Track {
    WordAudio(TrackRef),
    SentenceAudio(TrackRef),
    /// Occupies a slot but never produces sound and is never bound.
    Skip,
}

impl Track {
    pub(crate) fn track_ref(&self) -> Option<&TrackRef> {
        match self {
            Track::WordAudio(r) | Track::SentenceAudio(r) => Some(r),
            Track::Skip => None,
        }
    }
}

/// The ordered track sequence for one category.
///
/// Playlists are never mutated once built, a category change replaces the
/// playlist as a whole.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Playlist {
    dialect_level: DialectLevel,
    category: String,
    rows: Vec<String>,
    tracks: Vec<Track>,
}

impl Playlist {
    pub(crate) fn dialect_level(&self) -> DialectLevel {
        self.dialect_level
    }

    pub(crate) fn category(&self) -> &str {
        &self.category
    }

    pub(crate) fn len(&self) -> usize {
        self.tracks.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub(crate) fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn row_ids(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(String::as_str)
    }

    /// Zero-based position of a row within the category.
    pub(crate) fn row_position(&self, row_id: &str) -> Option<usize> {
        self.rows.iter().position(|r| r == row_id)
    }

    /// Index of the first track slot (the word recording) of a row.
    pub(crate) fn track_index_for_row(&self, row_id: &str) -> Option<usize> {
        self.row_position(row_id).map(|p| p * SLOTS_PER_ROW)
    }

    /// Row position and row id owning the given track slot.
    pub(crate) fn row_at(&self, track_index: usize) -> Option<(usize, &str)> {
        let position = track_index / SLOTS_PER_ROW;
        self.rows.get(position).map(|r| (position, r.as_str()))
    }

    /// Completion percentage once the row at `row_position` has been reached,
    /// rounded to two decimals. Rows count from one, so the last row is 100%.
    pub(crate) fn percentage_at(&self, row_position: usize) -> f64 {
        if self.rows.is_empty() {
            return 0.0;
        }
        let raw = 100.0 * (row_position + 1) as f64 / self.rows.len() as f64;
        (raw * 100.0).round() / 100.0
    }
}

/// Builds the playlist for a category.
///
/// `items` must already be filtered to the category and in display order.
/// The result is a pure function of the items, the dialect/level context and
/// whatever availability data the resolver holds. An empty item set yields an
/// empty playlist, which callers treat as an empty category rather than an
/// error.
pub(crate) fn build(
    dialect_level: DialectLevel,
    category: &str,
    items: &[&VocabularyItem],
    resolver: &dyn TrackResolver,
) -> Playlist {
    let mut rows = Vec::with_capacity(items.len());
    let mut tracks = Vec::with_capacity(items.len() * SLOTS_PER_ROW);

    for item in items {
        let audio = resolver.resolve(item, dialect_level);

        rows.push(item.row_id.clone());
        tracks.push(audio.word.map_or(Track::Skip, Track::WordAudio));
        tracks.push(audio.sentence.map_or(Track::Skip, Track::SentenceAudio));
    }

    Playlist {
        dialect_level,
        category: category.to_string(),
        rows,
        tracks,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        model::{Dialect, Level},
        resolver::ResolvedAudio,
    };

    /// Resolver that yields a word and a sentence reference for every row,
    /// except rows listed as silent.
    pub(crate) struct FixedResolver {
        pub(crate) silent_words: Vec<String>,
        pub(crate) silent_sentences: Vec<String>,
    }

    impl FixedResolver {
        pub(crate) fn all_available() -> Self {
            Self {
                silent_words: vec![],
                silent_sentences: vec![],
            }
        }
    }

    impl TrackResolver for FixedResolver {
        fn resolve(&self, item: &VocabularyItem, _: DialectLevel) -> ResolvedAudio {
            let word = (!self.silent_words.contains(&item.row_id))
                .then(|| TrackRef::new(format!("{}.mp3", item.row_id)));
            let sentence = (!self.silent_sentences.contains(&item.row_id))
                .then(|| TrackRef::new(format!("{}s.mp3", item.row_id)));
            ResolvedAudio { word, sentence }
        }
    }

    pub(crate) fn item(row: usize, category: &str) -> VocabularyItem {
        VocabularyItem {
            number: format!("1-{}", row),
            row_id: format!("{:03}", row),
            categories: vec![category.to_string()],
            headword: format!("word {}", row),
            phonetic: String::new(),
            meaning: String::new(),
            sentence: Some(format!("sentence {}", row)),
            translation: None,
            notes: None,
        }
    }

    fn dialect_level() -> DialectLevel {
        DialectLevel::new(Dialect::Sixian, Level::Basic)
    }

    #[test]
    fn every_row_contributes_two_slots() {
        let items: Vec<_> = (1..=4).map(|i| item(i, "A")).collect();
        let refs: Vec<_> = items.iter().collect();

        let resolver = FixedResolver {
            silent_words: vec!["002".to_string()],
            silent_sentences: vec!["003".to_string(), "004".to_string()],
        };
        let playlist = build(dialect_level(), "A", &refs, &resolver);

        assert_eq!(playlist.len(), 2 * refs.len());
        assert_eq!(playlist.get(2), Some(&Track::Skip));
        assert_eq!(playlist.get(5), Some(&Track::Skip));
        assert_eq!(
            playlist.get(6),
            Some(&Track::WordAudio(TrackRef::new("004.mp3")))
        );
        assert_eq!(
            playlist.get(1),
            Some(&Track::SentenceAudio(TrackRef::new("001s.mp3")))
        );
    }

    #[test]
    fn row_index_maps_to_twice_its_position() {
        let items: Vec<_> = (1..=3).map(|i| item(i, "A")).collect();
        let refs: Vec<_> = items.iter().collect();
        let playlist = build(dialect_level(), "A", &refs, &FixedResolver::all_available());

        assert_eq!(playlist.track_index_for_row("001"), Some(0));
        assert_eq!(playlist.track_index_for_row("003"), Some(4));
        assert_eq!(playlist.track_index_for_row("009"), None);
        assert_eq!(playlist.row_at(5), Some((2, "003")));
        assert_eq!(playlist.row_at(6), None);
    }

    #[test]
    fn empty_category_builds_empty_playlist() {
        let playlist = build(dialect_level(), "B", &[], &FixedResolver::all_available());

        assert!(playlist.is_empty());
        assert_eq!(playlist.category(), "B");
        assert_eq!(playlist.percentage_at(0), 0.0);
    }

    #[test]
    fn percentage_is_rounded_to_two_decimals() {
        let items: Vec<_> = (1..=3).map(|i| item(i, "A")).collect();
        let refs: Vec<_> = items.iter().collect();
        let playlist = build(dialect_level(), "A", &refs, &FixedResolver::all_available());

        assert_eq!(playlist.percentage_at(0), 33.33);
        assert_eq!(playlist.percentage_at(1), 66.67);
        assert_eq!(playlist.percentage_at(2), 100.0);
    }
}
