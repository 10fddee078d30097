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

//! Track resolution.
//!
//! A [`TrackResolver`] decides, for one vocabulary row and the active
//! dialect/level, which recordings exist and where they live. The playback
//! engine only ever sees the resulting references; a missing recording is
//! simply `None` and becomes a skipped slot in the playlist.
//!
//! [`CertResolver`] implements the media layout of the certification
//! vocabulary recordings:
//!
//! ```text
//! <base>/<year>/<dir level>/<dialect>/[w/]<file level><dialect>-<no>-<media no>.mp3
//! <base>/<year>/<dir level>/<dialect>/[s/]<file level><dialect>-<no>-<media no>s.mp3
//! ```

use std::{collections::HashMap, fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{
    model::{DialectLevel, Level, TrackRef, VocabularyItem},
    util::format::pad_number,
};

/// File holding the exception and availability tables, looked up in the
/// vocabulary directory.
pub(crate) const AUDIO_TABLES_FILE: &str = "audio_tables.json";

/// The recordings available for one row.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ResolvedAudio {
    pub(crate) word: Option<TrackRef>,
    pub(crate) sentence: Option<TrackRef>,
}

pub(crate) trait TrackResolver {
    fn resolve(&self, item: &VocabularyItem, context: DialectLevel) -> ResolvedAudio;
}

/// A row whose recordings were published under a different year and media
/// number than the rest of its level.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub(crate) struct AudioException {
    pub(crate) level: Level,
    pub(crate) number: String,
    pub(crate) year: String,
    pub(crate) media_no: String,
}

/// A row known to lack one or both recordings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub(crate) struct MissingAudio {
    /// Full dialect/level name, e.g. `四縣基礎級`.
    pub(crate) table: String,
    pub(crate) number: String,
    #[serde(default)]
    pub(crate) word: bool,
    #[serde(default)]
    pub(crate) sentence: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct AudioTables {
    #[serde(default)]
    pub(crate) exceptions: Vec<AudioException>,
    #[serde(default)]
    pub(crate) missing: Vec<MissingAudio>,
}

impl AudioTables {
    /// Loads the tables from a vocabulary directory.
    ///
    /// A directory without a tables file simply has no exceptions.
    pub(crate) fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(AUDIO_TABLES_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Missing {
    word: bool,
    sentence: bool,
}

pub(crate) struct CertResolver {
    base_url: String,
    media_year: String,
    exceptions: HashMap<Level, Vec<AudioException>>,
    missing: HashMap<(DialectLevel, String), Missing>,
}

impl CertResolver {
    pub(crate) fn new(base_url: &str, media_year: &str, tables: AudioTables) -> Self {
        let mut exceptions: HashMap<Level, Vec<AudioException>> = HashMap::new();
        for exception in tables.exceptions {
            exceptions.entry(exception.level).or_default().push(exception);
        }

        let mut missing = HashMap::new();
        for entry in tables.missing {
            match DialectLevel::from_name(&entry.table) {
                Some(dl) => {
                    missing.insert(
                        (dl, entry.number),
                        Missing {
                            word: entry.word,
                            sentence: entry.sentence,
                        },
                    );
                }
                None => log::warn!("Ignoring missing-audio entry for unknown table {}", entry.table),
            }
        }

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            media_year: media_year.to_string(),
            exceptions,
            missing,
        }
    }

    fn exception(&self, level: Level, number: &str) -> Option<&AudioException> {
        self.exceptions
            .get(&level)
            .and_then(|list| list.iter().find(|e| e.number == number))
    }

    fn locate(&self, item: &VocabularyItem, context: DialectLevel) -> Location {
        let (first, second) = item.number.split_once('-').unwrap_or(("", item.number.as_str()));

        let group_width = if context.level == Level::Elementary { 3 } else { 2 };

        let mut location = Location {
            year: self.media_year.clone(),
            dir_level: context.level.code(),
            exception: false,
            file_level: file_level(context.level),
            dialect: context.dialect.code(),
            group: pad_number(first, group_width),
            media_no: pad_number(second, 3),
        };

        if let Some(exception) = self.exception(context.level, &item.number) {
            location.year = exception.year.clone();
            location.media_no = exception.media_no.clone();
            location.exception = true;
            if let Some(dir) = alternate_dir_level(context.level) {
                location.dir_level = dir;
            }
        }

        location
    }
}

impl TrackResolver for CertResolver {
    fn resolve(&self, item: &VocabularyItem, context: DialectLevel) -> ResolvedAudio {
        let location = self.locate(item, context);
        let missing = self
            .missing
            .get(&(context, item.number.clone()))
            .copied()
            .unwrap_or_default();

        let word = (!missing.word).then(|| location.url(&self.base_url, Recording::Word));

        // The advanced level never publishes sentence recordings.
        let has_sentence = item.sentence.is_some() && context.level != Level::Advanced;
        let sentence = (has_sentence && !missing.sentence)
            .then(|| location.url(&self.base_url, Recording::Sentence));

        ResolvedAudio { word, sentence }
    }
}

#[derive(Clone, Copy)]
enum Recording {
    Word,
    Sentence,
}

struct Location {
    year: String,
    dir_level: &'static str,
    exception: bool,
    file_level: &'static str,
    dialect: &'static str,
    group: String,
    media_no: String,
}

impl Location {
    fn url(&self, base: &str, recording: Recording) -> TrackRef {
        let (sub_dir, suffix) = match (recording, self.exception) {
            (Recording::Word, true) => ("w/", ""),
            (Recording::Word, false) => ("", ""),
            (Recording::Sentence, true) => ("s/", "s"),
            (Recording::Sentence, false) => ("", "s"),
        };

        TrackRef::new(format!(
            "{}/{}/{}/{}/{}{}{}-{}-{}{}.mp3",
            base,
            self.year,
            self.dir_level,
            self.dialect,
            sub_dir,
            self.file_level,
            self.dialect,
            self.group,
            self.media_no,
            suffix
        ))
    }
}

fn file_level(level: Level) -> &'static str {
    match level {
        Level::Intermediate => "1",
        Level::UpperIntermediate => "2",
        Level::Advanced => "3",
        Level::Basic | Level::Elementary => "",
    }
}

/// Directory that exception recordings of a level were published under.
fn alternate_dir_level(level: Level) -> Option<&'static str> {
    match level {
        Level::Basic => Some("1"),
        _ => None,
    }
}
