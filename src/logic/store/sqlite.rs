//! SQLite Store
//!
//! rusqlite-backed implementation of the analysis store. Indexed columns
//! for the fields downstream consumers filter on, full JSON payloads for
//! everything else. Schema is created on open.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{AnalysisStore, StoreError};
use crate::logic::countermeasure::types::{Countermeasure, CountermeasureStatus};
use crate::logic::ensemble::types::Verdict;
use crate::logic::flow::FlowRecord;

// ============================================================================
// CONSTANTS
// ============================================================================

const DATA_DIR: &str = "NetSentry";
const DB_FILE: &str = "netsentry.db";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS flows (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    source_addr TEXT NOT NULL,
    dest_addr TEXT NOT NULL,
    protocol TEXT NOT NULL,
    port INTEGER,
    payload_size INTEGER,
    data TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS verdicts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    verdict_id TEXT NOT NULL UNIQUE,
    category TEXT NOT NULL,
    confidence REAL NOT NULL,
    severity TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    data TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS countermeasures (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    countermeasure_id TEXT NOT NULL UNIQUE,
    verdict_id TEXT NOT NULL,
    action TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    data TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_verdicts_created ON verdicts(created_at);
CREATE INDEX IF NOT EXISTS idx_countermeasures_verdict ON countermeasures(verdict_id);
";

// ============================================================================
// STORE
// ============================================================================

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at the given path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Database(e.to_string()))?;
        }
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        log::info!("Opened analysis store: {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open the database at the platform default location
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(&default_db_path())
    }

    /// In-memory database, used by tests
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR)
        .join(DB_FILE)
}

fn encode<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(data: &str) -> Result<T, StoreError> {
    serde_json::from_str(data).map_err(|e| StoreError::Serialization(e.to_string()))
}

impl AnalysisStore for SqliteStore {
    fn save_flow(&self, record: &FlowRecord) -> Result<i64, StoreError> {
        let data = encode(record)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO flows (timestamp, source_addr, dest_addr, protocol, port, payload_size, data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.timestamp.to_rfc3339(),
                record.source_addr.to_string(),
                record.dest_addr.to_string(),
                record.protocol.as_str(),
                record.port,
                record.payload_size.map(|p| p as i64),
                data,
            ],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(conn.last_insert_rowid())
    }

    fn save_verdict(&self, verdict: &Verdict) -> Result<i64, StoreError> {
        let data = encode(verdict)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO verdicts (verdict_id, category, confidence, severity, status, created_at, data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                verdict.id.to_string(),
                verdict.threat_category.as_str(),
                verdict.confidence,
                verdict.severity.as_str(),
                verdict.status.as_str(),
                verdict.created_at.to_rfc3339(),
                data,
            ],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(conn.last_insert_rowid())
    }

    fn save_countermeasure(&self, countermeasure: &Countermeasure) -> Result<i64, StoreError> {
        let data = encode(countermeasure)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO countermeasures (countermeasure_id, verdict_id, action, status, created_at, data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                countermeasure.id.to_string(),
                countermeasure.verdict_id.to_string(),
                countermeasure.action,
                countermeasure.status.as_str(),
                countermeasure.created_at.to_rfc3339(),
                data,
            ],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(conn.last_insert_rowid())
    }

    fn update_countermeasure_status(
        &self,
        id: Uuid,
        status: CountermeasureStatus,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock();

        let mut countermeasure: Countermeasure = {
            let mut stmt = conn
                .prepare("SELECT data FROM countermeasures WHERE countermeasure_id = ?1")
                .map_err(|e| StoreError::Database(e.to_string()))?;
            let data: Option<String> = stmt
                .query_row(params![id.to_string()], |row| row.get(0))
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(StoreError::Database(other.to_string())),
                })?;
            decode(&data.ok_or(StoreError::NotFound { id })?)?
        };

        countermeasure.status = status;
        let data = encode(&countermeasure)?;

        conn.execute(
            "UPDATE countermeasures SET status = ?1, data = ?2 WHERE countermeasure_id = ?3",
            params![status.as_str(), data, id.to_string()],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn recent_verdicts(&self, limit: usize) -> Result<Vec<Verdict>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT data FROM verdicts ORDER BY created_at DESC LIMIT ?1")
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![limit as i64], |row| row.get::<_, String>(0))
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut verdicts = Vec::new();
        for row in rows {
            let data = row.map_err(|e| StoreError::Database(e.to_string()))?;
            verdicts.push(decode(&data)?);
        }
        Ok(verdicts)
    }

    fn countermeasures_for(&self, verdict_id: Uuid) -> Result<Vec<Countermeasure>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT data FROM countermeasures WHERE verdict_id = ?1 ORDER BY id")
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![verdict_id.to_string()], |row| {
                row.get::<_, String>(0)
            })
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut countermeasures = Vec::new();
        for row in rows {
            let data = row.map_err(|e| StoreError::Database(e.to_string()))?;
            countermeasures.push(decode(&data)?);
        }
        Ok(countermeasures)
    }
}

// ============================================================================
// TESTS
// ============================================================================
