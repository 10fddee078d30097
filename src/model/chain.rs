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

//! Category chain.
//!
//! The chain is the ordered list of categories of one dialect/level together
//! with a cursor. It drives continuation from one category into the next; it
//! is never used to build playlists.

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CategoryChain {
    names: Vec<String>,
    cursor: usize,
}

impl CategoryChain {
    /// Creates a chain positioned on `current`.
    ///
    /// Returns `None` if `current` is not one of `names`.
    pub(crate) fn new(names: Vec<String>, current: &str) -> Option<Self> {
        let cursor = names.iter().position(|n| n == current)?;
        Some(Self { names, cursor })
    }

    pub(crate) fn current(&self) -> &str {
        &self.names[self.cursor]
    }

    pub(crate) fn peek_next(&self) -> Option<&str> {
        self.names.get(self.cursor + 1).map(String::as_str)
    }

    /// Moves the cursor to the next category, if there is one.
    pub(crate) fn advance(&mut self) -> Option<&str> {
        if self.cursor + 1 < self.names.len() {
            self.cursor += 1;
            Some(&self.names[self.cursor])
        } else {
            None
        }
    }

    /// Moves the cursor to a named category.
    pub(crate) fn select(&mut self, name: &str) -> bool {
        match self.names.iter().position(|n| n == name) {
            Some(cursor) => {
                self.cursor = cursor;
                true
            }
            None => false,
        }
    }
}
