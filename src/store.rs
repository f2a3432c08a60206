//! Append-only SQLite table of per-session dwell totals.

use chrono::Local;
use log::info;
use rusqlite::{params, Connection};
use std::path::Path;
use thiserror::Error;

use crate::dwell::DwellTotals;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS gaze_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT,
    eyes REAL,
    nose REAL,
    mouth REAL
)";

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GazeResultRecord {
    pub id: i64,
    pub timestamp: String,
    pub eyes: f64,
    pub nose: f64,
    pub mouth: f64,
}

pub struct ResultStore {
    conn: Connection,
}

impl ResultStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute(SCHEMA, [])?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute(SCHEMA, [])?;
        Ok(Self { conn })
    }

    /// Inserts one row stamped with local time, returns it with its new id.
    pub fn append(&mut self, totals: &DwellTotals) -> Result<GazeResultRecord, StoreError> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO gaze_results (timestamp, eyes, nose, mouth) VALUES (?1, ?2, ?3, ?4)",
            params![timestamp, totals.eyes, totals.nose, totals.mouth],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(GazeResultRecord {
            id,
            timestamp,
            eyes: totals.eyes,
            nose: totals.nose,
            mouth: totals.mouth,
        })
    }
}

/// Opens the store, appends the session row and closes the connection.
pub fn save_gaze_data<P: AsRef<Path>>(path: P, totals: &DwellTotals) -> Result<GazeResultRecord, StoreError> {
    let mut store = ResultStore::open(path.as_ref())?;
    let record = store.append(totals)?;
    info!("Stored gaze result #{} in {}", record.id, path.as_ref().display());
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_assigns_increasing_ids() {
        let mut store = ResultStore::open_in_memory().unwrap();
        let a = store.append(&DwellTotals { eyes: 1.0, nose: 0.5, mouth: 0.25 }).unwrap();
        let b = store.append(&DwellTotals::default()).unwrap();
        assert!(b.id > a.id);
        assert_eq!(a.eyes, 1.0);
    }

    #[test]
    fn test_timestamp_format() {
        let mut store = ResultStore::open_in_memory().unwrap();
        let rec = store.append(&DwellTotals::default()).unwrap();
        assert!(chrono::NaiveDateTime::parse_from_str(&rec.timestamp, TIMESTAMP_FORMAT).is_ok());
    }
}
