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

//! Shareable references.
//!
//! A reference names a dialect/level, a category and optionally a row, and is
//! exchanged as the query string of a link:
//!
//! ```text
//! https://example.org/?dialect=si&level=5&category=天文地理&row=007
//! ```
//!
//! A reference without a row shows the category without starting playback.

use thiserror::Error;
use url::Url;

use crate::model::{Dialect, DialectLevel, Level};

const PARAM_DIALECT: &str = "dialect";
const PARAM_LEVEL: &str = "level";
const PARAM_CATEGORY: &str = "category";
const PARAM_ROW: &str = "row";

/// Base used to read references given without scheme and host.
const RELATIVE_BASE: &str = "http://localhost/";

#[derive(Debug, Error)]
pub(crate) enum ShareError {
    #[error("invalid reference: {0}")]
    Url(#[from] url::ParseError),
    #[error("reference is missing the {0} parameter")]
    MissingParameter(&'static str),
    #[error("unknown dialect code {0:?}")]
    UnknownDialect(String),
    #[error("unknown level code {0:?}")]
    UnknownLevel(String),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ShareRef {
    pub(crate) dialect_level: DialectLevel,
    pub(crate) category: String,
    pub(crate) row: Option<String>,
}

impl ShareRef {
    pub(crate) fn new(dialect_level: DialectLevel, category: &str, row: Option<&str>) -> Self {
        Self {
            dialect_level,
            category: category.to_string(),
            row: row.map(str::to_string),
        }
    }

    /// Renders the reference as a link on `base`.
    ///
    /// Any query already on `base` is replaced.
    pub(crate) fn to_url(&self, base: &str) -> Result<Url, ShareError> {
        let mut url = Url::parse(base)?;
        {
            let mut query = url.query_pairs_mut();
            query.clear();
            query
                .append_pair(PARAM_DIALECT, self.dialect_level.dialect.code())
                .append_pair(PARAM_LEVEL, self.dialect_level.level.code())
                .append_pair(PARAM_CATEGORY, &self.category);
            if let Some(row) = &self.row {
                query.append_pair(PARAM_ROW, row);
            }
        }
        Ok(url)
    }

    /// Reads a reference from a full link or a bare query such as
    /// `?dialect=ha&level=2&category=人體`.
    pub(crate) fn parse(input: &str) -> Result<Self, ShareError> {
        let input = input.trim();
        let url = match Url::parse(input) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(RELATIVE_BASE)?.join(input)?,
            Err(e) => return Err(e.into()),
        };

        let param = |name: &str| {
            url.query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let dialect = param(PARAM_DIALECT).ok_or(ShareError::MissingParameter(PARAM_DIALECT))?;
        let level = param(PARAM_LEVEL).ok_or(ShareError::MissingParameter(PARAM_LEVEL))?;
        let category = param(PARAM_CATEGORY).ok_or(ShareError::MissingParameter(PARAM_CATEGORY))?;

        let dialect = Dialect::from_code(&dialect).ok_or(ShareError::UnknownDialect(dialect))?;
        let level = Level::from_code(&level).ok_or(ShareError::UnknownLevel(level))?;

        Ok(Self {
            dialect_level: DialectLevel::new(dialect, level),
            category,
            row: param(PARAM_ROW),
        })
    }
}
