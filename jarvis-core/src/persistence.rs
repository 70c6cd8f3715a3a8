//! Durable storage for facts.
//!
//! The fact store talks to a [`FactPersistence`] backend. Two are provided:
//!
//! - [`SqliteFacts`]: one row per fact in an SQLite database.
//! - [`MemoryFacts`]: an in-process map for tests and ephemeral sessions.
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS facts (
//!     topic         TEXT PRIMARY KEY,
//!     id            TEXT NOT NULL,
//!     value         TEXT NOT NULL,   -- JSON
//!     confidence    REAL NOT NULL,
//!     created_at    TEXT NOT NULL,   -- RFC 3339
//!     last_accessed TEXT NOT NULL,   -- RFC 3339
//!     access_count  INTEGER NOT NULL,
//!     source        TEXT NOT NULL,
//!     tags          TEXT NOT NULL    -- JSON array
//! );
//! ```
//!
//! WAL mode allows searches from other connections while a write is in
//! flight. Backups use SQLite's online-backup API.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, params};
use tracing::{debug, info, warn};

use crate::config::PersistenceConfig;
use crate::error::PersistenceError;
use crate::types::{Fact, FactId, FactSource};

/// Result type for backend operations.
pub type PersistResult<T> = std::result::Result<T, PersistenceError>;

/// A durable home for facts, keyed by normalized topic.
///
/// Implementations must make each call atomic: after an error the stored row
/// is either the old record or the new one, never a mix.
pub trait FactPersistence: Send + Sync {
    /// Load every stored fact.
    ///
    /// # Errors
    /// Returns a [`PersistenceError`] if the backend cannot be read.
    fn load_all(&self) -> PersistResult<Vec<Fact>>;

    /// Insert or replace the record for `fact.topic`.
    ///
    /// # Errors
    /// Returns a [`PersistenceError`] if the write was not applied.
    fn upsert(&self, fact: &Fact) -> PersistResult<()>;

    /// Delete the record for `topic`. Returns whether a row existed.
    ///
    /// # Errors
    /// Returns a [`PersistenceError`] if the delete was not applied.
    fn delete(&self, topic: &str) -> PersistResult<bool>;
}

// ---------------------------------------------------------------------------
// SQLite
// ---------------------------------------------------------------------------

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS facts (
    topic         TEXT PRIMARY KEY,
    id            TEXT NOT NULL,
    value         TEXT NOT NULL,
    confidence    REAL NOT NULL,
    created_at    TEXT NOT NULL,
    last_accessed TEXT NOT NULL,
    access_count  INTEGER NOT NULL,
    source        TEXT NOT NULL,
    tags          TEXT NOT NULL
);";

/// SQLite-backed fact persistence.
///
/// The connection sits behind a mutex; SQLite serialises writers anyway and
/// every statement here is short.
pub struct SqliteFacts {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl std::fmt::Debug for SqliteFacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteFacts")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl SqliteFacts {
    /// Open (or create) a database at `path`.
    ///
    /// # Errors
    /// Returns [`PersistenceError::Database`] on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &PersistenceConfig) -> PersistResult<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&db_path, flags)?;

        if config.wal_mode {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;

        info!(path = %db_path.display(), wal = config.wal_mode, "Fact database opened");

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    /// Open an in-memory database (useful for tests).
    ///
    /// # Errors
    /// Returns [`PersistenceError::Database`] on SQLite failures.
    pub fn open_in_memory() -> PersistResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: PathBuf::from(":memory:"),
        })
    }

    /// Number of stored facts.
    ///
    /// # Errors
    /// Returns [`PersistenceError::Database`] on SQLite failures.
    pub fn count(&self) -> PersistResult<usize> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM facts", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Copy the database to `dest_path` with SQLite's online-backup API.
    ///
    /// # Errors
    /// Returns [`PersistenceError::Database`] on SQLite failures.
    pub fn backup<P: AsRef<Path>>(&self, dest_path: P) -> PersistResult<()> {
        let start = Instant::now();
        let mut dest = Connection::open(dest_path.as_ref())?;
        let conn = self.conn.lock();
        let backup = rusqlite::backup::Backup::new(&conn, &mut dest)?;
        backup.run_to_completion(256, std::time::Duration::from_millis(50), None)?;

        info!(
            dest = %dest_path.as_ref().display(),
            elapsed_ms = start.elapsed().as_millis(),
            "Fact database backup completed"
        );
        Ok(())
    }

    /// Run `PRAGMA integrity_check`. `Ok(false)` means corruption was found.
    ///
    /// # Errors
    /// Returns [`PersistenceError::Database`] if the check itself fails.
    pub fn integrity_check(&self) -> PersistResult<bool> {
        let result: String = self
            .conn
            .lock()
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(result == "ok")
    }

    /// Path of the database file (`:memory:` for in-memory databases).
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

/// Raw column values of one `facts` row.
struct FactRow {
    topic: String,
    id: String,
    value: String,
    confidence: f64,
    created_at: String,
    last_accessed: String,
    access_count: i64,
    source: String,
    tags: String,
}

impl FactRow {
    fn into_fact(self) -> PersistResult<Fact> {
        let corrupt = |reason: String| PersistenceError::Corrupt {
            topic: self.topic.clone(),
            reason,
        };

        let id = uuid::Uuid::parse_str(&self.id).map_err(|e| corrupt(format!("id: {e}")))?;
        let value: serde_json::Value =
            serde_json::from_str(&self.value).map_err(|e| corrupt(format!("value: {e}")))?;
        let tags: BTreeSet<String> =
            serde_json::from_str(&self.tags).map_err(|e| corrupt(format!("tags: {e}")))?;
        let source = FactSource::parse(&self.source)
            .ok_or_else(|| corrupt(format!("unknown source '{}'", self.source)))?;
        let created_at = parse_time(&self.created_at).map_err(|e| corrupt(format!("created_at: {e}")))?;
        let last_accessed =
            parse_time(&self.last_accessed).map_err(|e| corrupt(format!("last_accessed: {e}")))?;

        #[allow(clippy::cast_possible_truncation)]
        let confidence = self.confidence.clamp(0.0, 1.0) as f32;

        Ok(Fact {
            id: FactId(id),
            topic: self.topic,
            value,
            confidence,
            created_at,
            last_accessed,
            access_count: u32::try_from(self.access_count.max(0)).unwrap_or(u32::MAX),
            source,
            tags,
        })
    }
}

fn parse_time(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text).map(|t| t.with_timezone(&Utc))
}

impl FactPersistence for SqliteFacts {
    fn load_all(&self) -> PersistResult<Vec<Fact>> {
        let start = Instant::now();
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT topic, id, value, confidence, created_at, last_accessed,
                    access_count, source, tags
             FROM facts",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(FactRow {
                topic: row.get(0)?,
                id: row.get(1)?,
                value: row.get(2)?,
                confidence: row.get(3)?,
                created_at: row.get(4)?,
                last_accessed: row.get(5)?,
                access_count: row.get(6)?,
                source: row.get(7)?,
                tags: row.get(8)?,
            })
        })?;

        let mut facts = Vec::new();
        for row in rows {
            match row?.into_fact() {
                Ok(fact) => facts.push(fact),
                Err(e) => warn!(error = %e, "Skipping unreadable fact row"),
            }
        }

        debug!(
            facts = facts.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Loaded facts"
        );
        Ok(facts)
    }

    fn upsert(&self, fact: &Fact) -> PersistResult<()> {
        let value = serde_json::to_string(&fact.value)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        let tags = serde_json::to_string(&fact.tags)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;

        self.conn.lock().execute(
            "INSERT INTO facts (topic, id, value, confidence, created_at, last_accessed,
                                access_count, source, tags)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(topic) DO UPDATE SET
                id = excluded.id,
                value = excluded.value,
                confidence = excluded.confidence,
                created_at = excluded.created_at,
                last_accessed = excluded.last_accessed,
                access_count = excluded.access_count,
                source = excluded.source,
                tags = excluded.tags",
            params![
                fact.topic,
                fact.id.0.to_string(),
                value,
                f64::from(fact.confidence),
                fact.created_at.to_rfc3339(),
                fact.last_accessed.to_rfc3339(),
                i64::from(fact.access_count),
                fact.source.as_str(),
                tags,
            ],
        )?;

        debug!(topic = %fact.topic, confidence = fact.confidence, "Persisted fact");
        Ok(())
    }

    fn delete(&self, topic: &str) -> PersistResult<bool> {
        let deleted = self
            .conn
            .lock()
            .execute("DELETE FROM facts WHERE topic = ?1", params![topic])?;
        Ok(deleted > 0)
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Map-backed persistence. Nothing survives the process.
///
/// Can be switched to refuse every call, which is how tests simulate a dead
/// disk.
#[derive(Debug, Default)]
pub struct MemoryFacts {
    rows: Mutex<HashMap<String, Fact>>,
    unavailable: AtomicBool,
}

impl MemoryFacts {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored facts.
    #[must_use]
    pub fn count(&self) -> usize {
        self.rows.lock().len()
    }

    fn check(&self) -> PersistResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable("memory backend switched off".into()));
        }
        Ok(())
    }
}

impl FactPersistence for MemoryFacts {
    fn load_all(&self) -> PersistResult<Vec<Fact>> {
        self.check()?;
        Ok(self.rows.lock().values().cloned().collect())
    }

    fn upsert(&self, fact: &Fact) -> PersistResult<()> {
        self.check()?;
        self.rows.lock().insert(fact.topic.clone(), fact.clone());
        Ok(())
    }

    fn delete(&self, topic: &str) -> PersistResult<bool> {
        self.check()?;
        Ok(self.rows.lock().remove(topic).is_some())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
