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

//! Domain models and core data structures.
//!
//! This module defines the central entities of the application: dialects and
//! certification levels, vocabulary rows, playable track references and
//! saved bookmarks.

pub(crate) mod chain;
pub(crate) mod playlist;

use std::fmt;

use serde::{Deserialize, Serialize};

/// A Hakka dialect with its own set of certification tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Dialect {
    Sixian,
    Hailu,
    Dapu,
    Raoping,
    Zhaoan,
}

impl Dialect {
    pub(crate) const ALL: [Dialect; 5] = [
        Dialect::Sixian,
        Dialect::Hailu,
        Dialect::Dapu,
        Dialect::Raoping,
        Dialect::Zhaoan,
    ];

    /// Short code used in file names, media paths and shared links.
    pub(crate) fn code(self) -> &'static str {
        match self {
            Dialect::Sixian => "si",
            Dialect::Hailu => "ha",
            Dialect::Dapu => "da",
            Dialect::Raoping => "rh",
            Dialect::Zhaoan => "zh",
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Dialect::Sixian => "四縣",
            Dialect::Hailu => "海陸",
            Dialect::Dapu => "大埔",
            Dialect::Raoping => "饒平",
            Dialect::Zhaoan => "詔安",
        }
    }

    pub(crate) fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.code() == code)
    }
}

/// A certification level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Level {
    Basic,
    Elementary,
    Intermediate,
    UpperIntermediate,
    Advanced,
}

impl Level {
    pub(crate) const ALL: [Level; 5] = [
        Level::Basic,
        Level::Elementary,
        Level::Intermediate,
        Level::UpperIntermediate,
        Level::Advanced,
    ];

    /// Level code, which doubles as the media directory for the level.
    pub(crate) fn code(self) -> &'static str {
        match self {
            Level::Basic => "5",
            Level::Elementary => "1",
            Level::Intermediate => "2",
            Level::UpperIntermediate => "3",
            Level::Advanced => "4",
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Level::Basic => "基礎級",
            Level::Elementary => "初級",
            Level::Intermediate => "中級",
            Level::UpperIntermediate => "中高級",
            Level::Advanced => "高級",
        }
    }

    pub(crate) fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.code() == code)
    }
}

/// The pairing of a dialect and a level, i.e. one vocabulary table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct DialectLevel {
    pub(crate) dialect: Dialect,
    pub(crate) level: Level,
}

impl DialectLevel {
    pub(crate) fn new(dialect: Dialect, level: Level) -> Self {
        Self { dialect, level }
    }

    /// Full display name, e.g. `四縣基礎級`.
    ///
    /// This is the name bookmarks are keyed by.
    pub(crate) fn name(&self) -> String {
        format!("{}{}", self.dialect.name(), self.level.name())
    }

    /// Parses a full display name back into its dialect and level.
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        let dialect = Dialect::ALL
            .into_iter()
            .find(|d| name.starts_with(d.name()))?;

        let rest = &name[dialect.name().len()..];
        let level = [
            Level::Basic,
            Level::Elementary,
            Level::UpperIntermediate,
            Level::Intermediate,
            Level::Advanced,
        ]
        .into_iter()
        .find(|l| rest == l.name())?;

        Some(Self { dialect, level })
    }

    pub(crate) fn from_codes(dialect: &str, level: &str) -> Option<Self> {
        Some(Self {
            dialect: Dialect::from_code(dialect)?,
            level: Level::from_code(level)?,
        })
    }
}

impl fmt::Display for DialectLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// One row of a vocabulary table.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct VocabularyItem {
    /// Source numbering, e.g. `4-23`.
    pub(crate) number: String,
    /// Zero-padded row identifier, e.g. `023`.
    pub(crate) row_id: String,
    pub(crate) categories: Vec<String>,
    pub(crate) headword: String,
    pub(crate) phonetic: String,
    pub(crate) meaning: String,
    pub(crate) sentence: Option<String>,
    pub(crate) translation: Option<String>,
    pub(crate) notes: Option<String>,
}

impl VocabularyItem {
    pub(crate) fn in_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}

/// A reference to a playable audio resource, typically a URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct TrackRef(pub(crate) String);

impl TrackRef {
    pub(crate) fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A saved resumption point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Bookmark {
    #[serde(rename = "tableName")]
    pub(crate) dialect_level: String,
    #[serde(rename = "cat")]
    pub(crate) category: String,
    #[serde(rename = "rowId")]
    pub(crate) row_id: String,
    pub(crate) percentage: f64,
    #[serde(rename = "timestamp")]
    pub(crate) created_at: i64,
}

impl Bookmark {
    pub(crate) fn is_for(&self, dialect_level: &str, category: &str) -> bool {
        self.dialect_level == dialect_level && self.category == category
    }

    /// Key used by the bookmark selector.
    pub(crate) fn key(&self) -> String {
        format!("{}||{}", self.dialect_level, self.category)
    }

    pub(crate) fn label(&self) -> String {
        format!(
            "{} - {} - #{} ({:.2}%)",
            self.dialect_level, self.category, self.row_id, self.percentage
        )
    }
}
