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

//! Bookmark persistence.
//!
//! The [`BookmarkStore`] keeps the learner's resumption points, most recent
//! first. It holds at most [`BOOKMARK_CAPACITY`] entries and never more than
//! one per dialect/level and category. The whole list is written as one JSON
//! document into a named [`Bucket`] after every change.
//!
//! Storage failures are never fatal: an unreadable or corrupt bucket starts
//! the session with an empty list, and a failed write leaves the in-memory
//! list in place.

use std::{cell::RefCell, rc::Rc};

use thiserror::Error;

use crate::model::Bookmark;

/// Name of the bucket holding the bookmark list.
pub(crate) const BOOKMARK_BUCKET: &str = "bookmarks";

pub(crate) const BOOKMARK_CAPACITY: usize = 10;

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("corrupt bookmark list: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A named slot in some persistent store holding one document.
pub(crate) trait Bucket {
    fn read(&self) -> Result<Option<String>, StoreError>;
    fn write(&mut self, value: &str) -> Result<(), StoreError>;
}

/// A bucket that lives only as long as the process.
///
/// Clones share the same contents.
#[derive(Clone, Default)]
pub(crate) struct MemoryBucket {
    value: Rc<RefCell<Option<String>>>,
}

impl MemoryBucket {
    pub(crate) fn contents(&self) -> Option<String> {
        self.value.borrow().clone()
    }
}

impl Bucket for MemoryBucket {
    fn read(&self) -> Result<Option<String>, StoreError> {
        Ok(self.value.borrow().clone())
    }

    fn write(&mut self, value: &str) -> Result<(), StoreError> {
        *self.value.borrow_mut() = Some(value.to_string());
        Ok(())
    }
}

/// One entry of the derived bookmark selector.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SelectorEntry {
    pub(crate) key: String,
    pub(crate) label: String,
}

pub(crate) struct BookmarkStore {
    bucket: Box<dyn Bucket>,
    bookmarks: Vec<Bookmark>,
    selector: Vec<SelectorEntry>,
}

impl BookmarkStore {
    /// Opens the store, loading whatever list the bucket holds.
    pub(crate) fn open(bucket: Box<dyn Bucket>) -> Self {
        let bookmarks = match load(bucket.as_ref()) {
            Ok(bookmarks) => sanitize(bookmarks),
            Err(e) => {
                log::warn!("Bookmarks unavailable, starting with an empty list: {}", e);
                Vec::new()
            }
        };

        let mut store = Self {
            bucket,
            bookmarks,
            selector: Vec::new(),
        };
        store.rebuild_selector();
        store
    }

    /// Records a resumption point.
    ///
    /// Any bookmark for the same dialect/level and category is replaced and
    /// the new one goes to the front. When this overflows the capacity, the
    /// oldest bookmark for a different category of the same dialect/level is
    /// dropped; failing that, the oldest bookmark overall.
    pub(crate) fn save(&mut self, dialect_level: &str, category: &str, row_id: &str, percentage: f64) {
        self.bookmarks.retain(|b| !b.is_for(dialect_level, category));

        self.bookmarks.insert(
            0,
            Bookmark {
                dialect_level: dialect_level.to_string(),
                category: category.to_string(),
                row_id: row_id.to_string(),
                percentage,
                created_at: chrono::Utc::now().timestamp_millis(),
            },
        );

        if self.bookmarks.len() > BOOKMARK_CAPACITY {
            let superseded = self
                .bookmarks
                .iter()
                .enumerate()
                .skip(1)
                .rev()
                .find(|(_, b)| b.dialect_level == dialect_level && b.category != category)
                .map(|(i, _)| i);

            let evicted = self.bookmarks.remove(superseded.unwrap_or(BOOKMARK_CAPACITY));
            log::debug!("Evicted bookmark {}", evicted.label());
        }

        log::debug!("Saved bookmark {} - {} #{}", dialect_level, category, row_id);
        self.persist();
    }

    /// Removes the bookmark for a dialect/level and category.
    ///
    /// Returns whether there was one.
    pub(crate) fn remove(&mut self, dialect_level: &str, category: &str) -> bool {
        let before = self.bookmarks.len();
        self.bookmarks.retain(|b| !b.is_for(dialect_level, category));

        if self.bookmarks.len() == before {
            return false;
        }

        log::debug!("Removed bookmark {} - {}", dialect_level, category);
        self.persist();
        true
    }

    pub(crate) fn entries(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    pub(crate) fn latest(&self) -> Option<&Bookmark> {
        self.bookmarks.first()
    }

    pub(crate) fn get(&self, dialect_level: &str, category: &str) -> Option<&Bookmark> {
        self.bookmarks
            .iter()
            .find(|b| b.is_for(dialect_level, category))
    }

    pub(crate) fn find_by_key(&self, key: &str) -> Option<&Bookmark> {
        self.bookmarks.iter().find(|b| b.key() == key)
    }

    pub(crate) fn selector(&self) -> &[SelectorEntry] {
        &self.selector
    }

    fn persist(&mut self) {
        let result = serde_json::to_string(&self.bookmarks)
            .map_err(StoreError::from)
            .and_then(|json| self.bucket.write(&json));

        if let Err(e) = result {
            log::warn!("Failed to persist bookmarks: {}", e);
        }

        self.rebuild_selector();
    }

    fn rebuild_selector(&mut self) {
        self.selector = self
            .bookmarks
            .iter()
            .take(BOOKMARK_CAPACITY)
            .map(|b| SelectorEntry {
                key: b.key(),
                label: b.label(),
            })
            .collect();
    }
}

fn load(bucket: &dyn Bucket) -> Result<Vec<Bookmark>, StoreError> {
    match bucket.read()? {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => Ok(Vec::new()),
    }
}

/// Restores the store invariants on a list read from outside.
fn sanitize(mut bookmarks: Vec<Bookmark>) -> Vec<Bookmark> {
    let mut seen: Vec<(String, String)> = Vec::new();
    bookmarks.retain(|b| {
        let pair = (b.dialect_level.clone(), b.category.clone());
        if seen.contains(&pair) {
            false
        } else {
            seen.push(pair);
            true
        }
    });
    bookmarks.truncate(BOOKMARK_CAPACITY);
    bookmarks
}
