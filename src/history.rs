use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};
use itertools::Itertools;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::app_dirs::AppDirs;
use crate::discipline::Discipline;
use crate::error::HistoryError;
use crate::scoring::ResultSummary;

/// Key of the single record that holds the whole history list.
pub const HISTORY_KEY: &str = "mnemo_history";

/// One completed run, as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp_millis: i64,
    pub discipline: Discipline,
    pub score: usize,
    pub total: usize,
    pub accuracy: u32,
    #[serde(rename = "timeUsedSeconds")]
    pub time_used_secs: u32,
}

impl HistoryEntry {
    pub fn new(
        id: String,
        timestamp_millis: i64,
        discipline: Discipline,
        summary: &ResultSummary,
    ) -> Self {
        Self {
            id,
            timestamp_millis,
            discipline,
            score: summary.score,
            total: summary.total,
            accuracy: summary.accuracy,
            time_used_secs: summary.time_used_secs,
        }
    }

    pub fn mistakes(&self) -> usize {
        self.total.saturating_sub(self.score)
    }

    pub fn local_time(&self) -> Option<DateTime<Local>> {
        Local.timestamp_millis_opt(self.timestamp_millis).single()
    }
}

/// Append-only run log. Storage order is insertion order.
pub trait HistoryStore {
    fn append(&mut self, entry: HistoryEntry) -> Result<(), HistoryError>;
    fn read_all(&self) -> Result<Vec<HistoryEntry>, HistoryError>;
    fn clear_all(&mut self) -> Result<(), HistoryError>;
}

#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    entries: Vec<HistoryEntry>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn append(&mut self, entry: HistoryEntry) -> Result<(), HistoryError> {
        self.entries.push(entry);
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        Ok(self.entries.clone())
    }

    fn clear_all(&mut self) -> Result<(), HistoryError> {
        self.entries.clear();
        Ok(())
    }
}

/// SQLite-backed store. The history lives in one key/value row holding the
/// JSON list, rewritten wholesale on every append or clear.
#[derive(Debug)]
pub struct SqliteHistoryStore {
    conn: Connection,
}

impl SqliteHistoryStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, HistoryError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, HistoryError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    /// Opens the database under the user's state directory.
    pub fn open_default() -> Result<Self, HistoryError> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("mnemo_history.db"));
        Self::open(path)
    }

    fn with_connection(conn: Connection) -> Result<Self, HistoryError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }

    fn write(&self, entries: &[HistoryEntry]) -> Result<(), HistoryError> {
        let value = serde_json::to_string(entries)?;
        self.conn.execute(
            r#"
            INSERT INTO kv (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
            params![HISTORY_KEY, value],
        )?;
        Ok(())
    }
}

impl HistoryStore for SqliteHistoryStore {
    fn append(&mut self, entry: HistoryEntry) -> Result<(), HistoryError> {
        let mut entries = self.read_all()?;
        entries.push(entry);
        self.write(&entries)
    }

    fn read_all(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                [HISTORY_KEY],
                |row| row.get(0),
            )
            .optional()?;
        match value {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    fn clear_all(&mut self) -> Result<(), HistoryError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", [HISTORY_KEY])?;
        Ok(())
    }
}

/// Display order: newest first. Ties keep insertion order.
pub fn newest_first(entries: &[HistoryEntry]) -> Vec<HistoryEntry> {
    entries
        .iter()
        .cloned()
        .sorted_by(|a, b| b.timestamp_millis.cmp(&a.timestamp_millis))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisciplineSummary {
    pub discipline: Discipline,
    pub runs: usize,
    pub best_accuracy: u32,
    pub average_accuracy: f64,
}

/// Per-discipline aggregates, in discipline order.
pub fn summarize(entries: &[HistoryEntry]) -> Vec<DisciplineSummary> {
    entries
        .iter()
        .into_group_map_by(|e| e.discipline)
        .into_iter()
        .map(|(discipline, runs)| {
            let total: u32 = runs.iter().map(|e| e.accuracy).sum();
            DisciplineSummary {
                discipline,
                runs: runs.len(),
                best_accuracy: runs.iter().map(|e| e.accuracy).max().unwrap_or(0),
                average_accuracy: f64::from(total) / runs.len() as f64,
            }
        })
        .sorted_by_key(|s| s.discipline)
        .collect()
}

#[derive(Serialize)]
struct CsvRow<'a> {
    date: String,
    discipline: &'a str,
    score: usize,
    total: usize,
    accuracy: u32,
    mistakes: usize,
    time_used_secs: u32,
}

/// Writes entries, newest first, as CSV.
pub fn export_csv<P: AsRef<Path>>(
    entries: &[HistoryEntry],
    path: P,
) -> Result<usize, HistoryError> {
    let mut writer = csv::Writer::from_path(path)?;
    let rows = newest_first(entries);
    for entry in &rows {
        writer.serialize(CsvRow {
            date: entry
                .local_time()
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
            discipline: entry.discipline.label(),
            score: entry.score,
            total: entry.total,
            accuracy: entry.accuracy,
            mistakes: entry.mistakes(),
            time_used_secs: entry.time_used_secs,
        })?;
    }
    writer.flush()?;
    Ok(rows.len())
}
