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

//! Data access layer.
//!
//! This module handles all interactions with the SQLite database. The
//! application only needs a small named key/value store: each bucket holds
//! one serialised document, such as the bookmark list.
//!
//! # Tables
//!
//! * `buckets` - Named documents, one row per bucket.
//!
//! # Performance
//!
//! Most functions in this module use [`rusqlite::Connection::prepare_cached`]
//! to reduce SQL parsing overhead.

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use crate::bookmarks::{Bucket, StoreError};

/// Opens a connection to the SQLite database and configures performance settings.
///
/// This function performs the following setup:
/// * **WAL Mode**: Enables Write-Ahead Logging so a crashed session never
///   leaves a half-written bucket behind.
/// * **Performance Tuning**: Sets synchronous mode to `NORMAL`.
/// * **Schema**: Executes [`create_schema`] to ensure all tables exist.
///
/// # Arguments
///
/// * `path` - The file system path to the SQLite database file.
///
/// # Errors
///
/// Returns an error if:
/// * The database file cannot be opened.
/// * The initial PRAGMA configurations fail.
/// * The schema initialization fails.
pub(crate) fn init_db(path: &str) -> Result<Connection> {
    let conn = Connection::open(path).with_context(|| format!("Failed to open {}", path))?;

    let journal_mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |r| r.get(0))?;
    if journal_mode != "wal" {
        anyhow::bail!(
            "Failed to switch to WAL mode. Current mode: {}",
            journal_mode
        );
    }

    conn.execute_batch("PRAGMA synchronous = NORMAL;")?;

    conn.set_prepared_statement_cache_capacity(16);

    create_schema(&conn)?;

    Ok(conn)
}

/// Create the database schema.
///
/// # Errors
///
/// Returns an error if the transaction fails, if there are permission issues
/// with the database file, or if the SQL syntax is invalid.
fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "BEGIN;

        CREATE TABLE IF NOT EXISTS buckets (
            name TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        COMMIT;",
    )
    .context("Failed to create schema")
}

/// Reads the document stored in a bucket, if any.
pub(crate) fn read_bucket(conn: &Connection, name: &str) -> rusqlite::Result<Option<String>> {
    let mut stmt = conn.prepare_cached("SELECT value FROM buckets WHERE name = ?")?;
    stmt.query_row([name], |row| row.get(0)).optional()
}

/// Replaces the document stored in a bucket.
pub(crate) fn write_bucket(conn: &Connection, name: &str, value: &str) -> rusqlite::Result<()> {
    let sql = "
        INSERT INTO buckets (name, value)
        VALUES (?1, ?2)
        ON CONFLICT (name)
        DO UPDATE SET value = ?2";

    let mut stmt = conn.prepare_cached(sql)?;
    stmt.execute(params![name, value])?;

    Ok(())
}

/// A [`Bucket`] persisted in the SQLite database.
pub(crate) struct SqliteBucket {
    conn: Connection,
    name: String,
}

impl SqliteBucket {
    pub(crate) fn new(conn: Connection, name: &str) -> Self {
        Self {
            conn,
            name: name.to_string(),
        }
    }
}

impl Bucket for SqliteBucket {
    fn read(&self) -> Result<Option<String>, StoreError> {
        Ok(read_bucket(&self.conn, &self.name)?)
    }

    fn write(&mut self, value: &str) -> Result<(), StoreError> {
        Ok(write_bucket(&self.conn, &self.name, value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(dir: &tempfile::TempDir) -> Connection {
        let path = dir.path().join("store.db");
        init_db(path.to_str().unwrap()).unwrap()
    }

    #[test]
    fn buckets_are_created_and_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let conn = open(&dir);

        assert_eq!(read_bucket(&conn, "bookmarks").unwrap(), None);

        write_bucket(&conn, "bookmarks", "[]").unwrap();
        write_bucket(&conn, "bookmarks", "[1]").unwrap();
        write_bucket(&conn, "other", "{}").unwrap();

        assert_eq!(read_bucket(&conn, "bookmarks").unwrap().as_deref(), Some("[1]"));
        assert_eq!(read_bucket(&conn, "other").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn bucket_survives_reopening_the_database() {
        let dir = tempfile::tempdir().unwrap();

        let mut bucket = SqliteBucket::new(open(&dir), "bookmarks");
        bucket.write("[\"saved\"]").unwrap();
        drop(bucket);

        let bucket = SqliteBucket::new(open(&dir), "bookmarks");
        assert_eq!(bucket.read().unwrap().as_deref(), Some("[\"saved\"]"));
    }
}
