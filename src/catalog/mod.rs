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

//! Vocabulary catalog loading.
//!
//! This module discovers the vocabulary tables in a data directory and parses
//! them into [`VocabularyItem`]s.
//!
//! Tables are comma separated text files with a header row, one file per
//! dialect/level, named `<dialect code>-<level code>.csv` (for example
//! `si-5.csv` for 四縣基礎級). Fields may be double quoted to contain commas,
//! and `<br>` inside a field stands for a line break.
//!
//! An optional `categories.txt` next to the tables lists the category order
//! shared by every table, one name per line. A table may have no rows for some
//! of those categories. Without it each table enumerates the categories its
//! rows mention, in order of first appearance.
//!
//! It utilizes `WalkDir` for directory traversal; files that cannot be read or
//! parsed are skipped with a warning so one bad table never hides the rest.

use std::{collections::HashMap, fs, path::Path};

use anyhow::{Context, Result};
use thiserror::Error;
use walkdir::WalkDir;

use crate::{
    model::{DialectLevel, VocabularyItem},
    util::format::pad_number,
};

const COL_NUMBER: &str = "編號";
const COL_CATEGORY: &str = "分類";
const COL_HEADWORD: &str = "客家語";
const COL_PHONETIC: &str = "客語標音";
const COL_MEANING: &str = "華語詞義";
const COL_SENTENCE: &str = "例句";
const COL_TRANSLATION: &str = "翻譯";
const COL_NOTES: &str = "備註";

/// File naming the shared category order.
pub(crate) const CATEGORY_ORDER_FILE: &str = "categories.txt";

const CATEGORY_SEPARATORS: [char; 5] = ['、', '/', ';', '；', '|'];

#[derive(Debug, Error)]
pub(crate) enum CatalogError {
    #[error("table has no header row")]
    MissingHeader,
    #[error("table is missing the {0} column")]
    MissingColumn(&'static str),
    #[error("row {line} has no number")]
    MissingNumber { line: usize },
}

/// One dialect/level table.
#[derive(Debug, Default)]
pub(crate) struct Table {
    items: Vec<VocabularyItem>,
    categories: Vec<String>,
}

/// All loaded vocabulary tables.
#[derive(Debug, Default)]
pub(crate) struct Catalog {
    tables: HashMap<DialectLevel, Table>,
    category_order: Option<Vec<String>>,
}

impl Catalog {
    /// Adds or replaces a table.
    ///
    /// Categories are enumerated in order of first appearance.
    pub(crate) fn insert(&mut self, dialect_level: DialectLevel, items: Vec<VocabularyItem>) {
        let mut categories: Vec<String> = Vec::new();
        for category in items.iter().flat_map(|i| i.categories.iter()) {
            if !categories.contains(category) {
                categories.push(category.clone());
            }
        }

        self.tables.insert(dialect_level, Table { items, categories });
    }

    /// Uses a fixed category order for every table.
    pub(crate) fn set_category_order(&mut self, names: Vec<String>) {
        self.category_order = Some(names).filter(|n| !n.is_empty());
    }

    pub(crate) fn len(&self) -> usize {
        self.tables.len()
    }

    /// Ordered category names of a table.
    pub(crate) fn categories(&self, dialect_level: DialectLevel) -> Option<&[String]> {
        let table = self.tables.get(&dialect_level)?;
        Some(
            self.category_order
                .as_deref()
                .unwrap_or(table.categories.as_slice()),
        )
    }

    /// Items of a category, in table order.
    pub(crate) fn items_in(&self, dialect_level: DialectLevel, category: &str) -> Vec<&VocabularyItem> {
        self.tables
            .get(&dialect_level)
            .map(|t| t.items.iter().filter(|i| i.in_category(category)).collect())
            .unwrap_or_default()
    }

    pub(crate) fn item(&self, dialect_level: DialectLevel, row_id: &str) -> Option<&VocabularyItem> {
        self.tables
            .get(&dialect_level)?
            .items
            .iter()
            .find(|i| i.row_id == row_id)
    }
}

/// Recursively scans a directory for vocabulary tables.
///
/// # Errors
///
/// Only a missing or unreadable root directory is an error, individual tables
/// that fail to load are skipped.
pub(crate) fn load_catalog(root: &Path) -> Result<Catalog> {
    if !root.is_dir() {
        anyhow::bail!("Vocabulary directory {} does not exist", root.display());
    }

    let mut catalog = Catalog::default();

    let order_file = root.join(CATEGORY_ORDER_FILE);
    if order_file.is_file() {
        let text = fs::read_to_string(&order_file)
            .with_context(|| format!("Failed to read {}", order_file.display()))?;
        catalog.set_category_order(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
        );
    }

    for entry in WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map_or(false, |ext| ext == "csv"))
    {
        let path = entry.path();

        let Some(dialect_level) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(parse_table_name)
        else {
            log::warn!("Skipping {}: not named <dialect>-<level>.csv", path.display());
            continue;
        };

        let items = match fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|text| parse_table(&text).map_err(anyhow::Error::from))
        {
            Ok(items) => items,
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        log::debug!("Loaded {} rows for {}", items.len(), dialect_level);
        catalog.insert(dialect_level, items);
    }

    Ok(catalog)
}

/// Parses a table file stem such as `si-5`.
pub(crate) fn parse_table_name(stem: &str) -> Option<DialectLevel> {
    let (dialect, level) = stem.split_once('-')?;
    DialectLevel::from_codes(dialect, level)
}

/// Parses the text of one table.
pub(crate) fn parse_table(text: &str) -> Result<Vec<VocabularyItem>, CatalogError> {
    let mut lines = text.trim().lines();

    let header = lines
        .next()
        .filter(|h| !h.trim().is_empty())
        .ok_or(CatalogError::MissingHeader)?;
    let headers: Vec<String> = split_record(header.trim_start_matches('\u{feff}'));

    let column = |name: &'static str| headers.iter().position(|h| h.trim() == name);
    let number_col = column(COL_NUMBER).ok_or(CatalogError::MissingColumn(COL_NUMBER))?;
    let category_col = column(COL_CATEGORY).ok_or(CatalogError::MissingColumn(COL_CATEGORY))?;
    let headword_col = column(COL_HEADWORD).ok_or(CatalogError::MissingColumn(COL_HEADWORD))?;
    let phonetic_col = column(COL_PHONETIC);
    let meaning_col = column(COL_MEANING);
    let sentence_col = column(COL_SENTENCE);
    let translation_col = column(COL_TRANSLATION);
    let notes_col = column(COL_NOTES);

    let mut items = Vec::new();

    for (offset, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let values = split_record(line);
        let field = |col: Option<usize>| -> String {
            col.and_then(|c| values.get(c))
                .map(|v| v.replace("<br>", "\n").trim().to_string())
                .unwrap_or_default()
        };
        let optional = |col: Option<usize>| Some(field(col)).filter(|v| !v.is_empty());

        let number = field(Some(number_col));
        if number.is_empty() {
            return Err(CatalogError::MissingNumber { line: offset + 2 });
        }

        let row_part = number.split_once('-').map_or(number.as_str(), |(_, r)| r);

        items.push(VocabularyItem {
            row_id: pad_number(row_part, 3),
            categories: split_categories(&field(Some(category_col))),
            headword: field(Some(headword_col)),
            phonetic: field(phonetic_col),
            meaning: field(meaning_col),
            sentence: optional(sentence_col),
            translation: optional(translation_col),
            notes: optional(notes_col),
            number,
        });
    }

    Ok(items)
}

fn split_categories(value: &str) -> Vec<String> {
    value
        .split(CATEGORY_SEPARATORS)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits one record on commas outside double quotes.
///
/// Quotes delimit fields and are dropped; a doubled quote inside a quoted
/// field is a literal quote.
fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.trim_end_matches('\r').chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Dialect, Level};

    const TABLE: &str = "編號,分類,客家語,客語標音,華語詞義,例句,翻譯,備註
1-1,天文地理,日頭,ngit8 teu11,太陽,\"日頭落山,天暗了。\",太陽下山，天黑了。,
1-2,天文地理、時間,月光,ngiad5 gong24,月亮,,,
2-10,人體,頭那,teu11 na11,頭,\"佢講：\"\"頭那痛\"\"。<br>第二行\",他說頭痛。,口語
";

    #[test]
    fn parses_rows_with_quoted_fields() {
        let items = parse_table(TABLE).unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].number, "1-1");
        assert_eq!(items[0].row_id, "001");
        assert_eq!(items[0].sentence.as_deref(), Some("日頭落山,天暗了。"));
        assert_eq!(items[1].sentence, None);
        assert_eq!(items[1].categories, vec!["天文地理", "時間"]);
        assert_eq!(items[2].row_id, "010");
        assert_eq!(
            items[2].sentence.as_deref(),
            Some("佢講：\"頭那痛\"。\n第二行")
        );
        assert_eq!(items[2].notes.as_deref(), Some("口語"));
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let err = parse_table("編號,客家語\n1-1,日頭\n").unwrap_err();
        assert!(matches!(err, CatalogError::MissingColumn(COL_CATEGORY)));

        assert!(matches!(parse_table("  \n"), Err(CatalogError::MissingHeader)));
    }

    #[test]
    fn categories_are_enumerated_in_first_appearance_order() {
        let mut catalog = Catalog::default();
        let dl = DialectLevel::new(Dialect::Sixian, Level::Basic);
        catalog.insert(dl, parse_table(TABLE).unwrap());

        assert_eq!(
            catalog.categories(dl).unwrap(),
            &["天文地理".to_string(), "時間".to_string(), "人體".to_string()]
        );
        assert_eq!(catalog.items_in(dl, "天文地理").len(), 2);
        assert_eq!(catalog.items_in(dl, "時間").len(), 1);
        assert!(catalog.items_in(dl, "不存在").is_empty());
        assert_eq!(catalog.item(dl, "010").map(|i| i.headword.as_str()), Some("頭那"));
    }

    #[test]
    fn loads_tables_from_a_directory_and_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ha-2.csv"), TABLE).unwrap();
        fs::write(dir.path().join("notes.csv"), TABLE).unwrap();
        fs::write(dir.path().join("si-1.csv"), "編號,客家語\n1-1,日頭\n").unwrap();

        let catalog = load_catalog(dir.path()).unwrap();

        assert_eq!(catalog.len(), 1);
        assert!(catalog.categories(DialectLevel::new(Dialect::Hailu, Level::Intermediate)).is_some());
        assert!(load_catalog(&dir.path().join("absent")).is_err());
    }

    #[test]
    fn shared_category_order_includes_categories_without_rows() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("si-5.csv"), TABLE).unwrap();
        fs::write(dir.path().join(CATEGORY_ORDER_FILE), "人體\n數字\n\n天文地理\n").unwrap();

        let catalog = load_catalog(dir.path()).unwrap();
        let dl = DialectLevel::new(Dialect::Sixian, Level::Basic);

        assert_eq!(
            catalog.categories(dl).unwrap(),
            &["人體".to_string(), "數字".to_string(), "天文地理".to_string()]
        );
        assert!(catalog.items_in(dl, "數字").is_empty());
        assert!(catalog.categories(DialectLevel::new(Dialect::Dapu, Level::Basic)).is_none());
    }
}
