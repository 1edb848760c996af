//! SQLite storage for season windows

use crate::{DataSource, Result, SeasonWindow};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Persistence boundary used by the sync driver
pub trait SeasonStore {
    /// Insert or replace the window for its year
    fn upsert_window(&self, window: &SeasonWindow, source: DataSource) -> Result<()>;

    /// Stored window for a year, if any
    fn find_window(&self, year: i32) -> Result<Option<SeasonWindow>>;
}

/// Database connection and operations
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS season_windows (
                year INTEGER PRIMARY KEY,
                season_start TEXT NOT NULL,
                season_end TEXT NOT NULL,
                source TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;
        Ok(())
    }

    /// All stored windows in year order
    pub fn get_all_windows(&self) -> Result<Vec<SeasonWindow>> {
        let mut stmt = self.conn.prepare(
            "SELECT year, season_start, season_end FROM season_windows ORDER BY year",
        )?;

        let windows = stmt
            .query_map([], Self::row_to_window)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(windows)
    }

    /// Source that last wrote a year's window
    pub fn window_source(&self, year: i32) -> Result<Option<DataSource>> {
        let name: Option<String> = self
            .conn
            .query_row(
                "SELECT source FROM season_windows WHERE year = ?1",
                params![year],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name.and_then(|n| DataSource::from_name(&n)))
    }

    /// Window whose date range contains the given day
    pub fn window_for_date(&self, date: NaiveDate) -> Result<Option<SeasonWindow>> {
        let day = date.format(DATE_FORMAT).to_string();
        let window = self
            .conn
            .query_row(
                "SELECT year, season_start, season_end FROM season_windows
                 WHERE season_start <= ?1 AND season_end >= ?1
                 ORDER BY year LIMIT 1",
                params![day],
                Self::row_to_window,
            )
            .optional()?;
        Ok(window)
    }

    fn row_to_window(row: &rusqlite::Row) -> rusqlite::Result<SeasonWindow> {
        let year: i32 = row.get(0)?;
        let start: String = row.get(1)?;
        let end: String = row.get(2)?;
        Ok(SeasonWindow {
            year,
            season_start: parse_stored_date(1, &start)?,
            season_end: parse_stored_date(2, &end)?,
        })
    }

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let (count, first, last): (i64, Option<i32>, Option<i32>) = self.conn.query_row(
            "SELECT COUNT(*), MIN(year), MAX(year) FROM season_windows",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        Ok(DatabaseStats {
            window_count: count as usize,
            first_year: first,
            last_year: last,
        })
    }
}

impl SeasonStore for Database {
    fn upsert_window(&self, window: &SeasonWindow, source: DataSource) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO season_windows (year, season_start, season_end, source, updated_at)
            VALUES (?1, ?2, ?3, ?4, datetime('now'))
            ON CONFLICT(year) DO UPDATE SET
                season_start = excluded.season_start,
                season_end = excluded.season_end,
                source = excluded.source,
                updated_at = excluded.updated_at
            "#,
            params![
                window.year,
                window.season_start.format(DATE_FORMAT).to_string(),
                window.season_end.format(DATE_FORMAT).to_string(),
                source.to_string(),
            ],
        )?;
        Ok(())
    }

    fn find_window(&self, year: i32) -> Result<Option<SeasonWindow>> {
        let window = self
            .conn
            .query_row(
                "SELECT year, season_start, season_end FROM season_windows WHERE year = ?1",
                params![year],
                Self::row_to_window,
            )
            .optional()?;
        Ok(window)
    }
}

fn parse_stored_date(column: usize, value: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub window_count: usize,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
}
