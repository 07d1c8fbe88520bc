//! SQLite-backed record store: one row per tracked path.

use crate::error::TagdexError;
use crate::tags::TagSet;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde::Serialize;
use std::path::Path;

pub(crate) const SCHEMA_VERSION: i32 = 1;

/// The tags stored for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRecord {
    pub path: String,
    pub tags: TagSet,
}

impl TagRecord {
    pub fn new(path: impl Into<String>, tags: TagSet) -> Self {
        Self {
            path: path.into(),
            tags,
        }
    }
}

/// Persistent path -> tag set mapping.
///
/// Reads go straight to the connection. Writes go through a [`StoreTx`]
/// so that one user action lands as a single commit.
pub struct TagStore {
    conn: Connection,
}

impl TagStore {
    /// Open or create the database file
    pub fn open(db_path: &Path) -> crate::Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA busy_timeout = 5000;
            PRAGMA synchronous = NORMAL;
            ",
        )?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> crate::Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn init_schema(conn: &Connection) -> crate::Result<()> {
        let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version != 0 && version != SCHEMA_VERSION {
            return Err(TagdexError::SchemaVersionMismatch {
                found: version,
                expected: SCHEMA_VERSION,
            });
        }

        if version == 0 {
            conn.execute_batch(
                "
                -- Path is the identity: a moved file is a new record
                CREATE TABLE IF NOT EXISTS records (
                    path TEXT PRIMARY KEY NOT NULL,
                    tags TEXT NOT NULL DEFAULT ''
                ) WITHOUT ROWID;

                PRAGMA user_version = 1;
                ",
            )?;
        }

        Ok(())
    }

    pub fn get(&self, path: &str) -> crate::Result<Option<TagRecord>> {
        get_record(&self.conn, path)
    }

    /// Every record, ordered by path
    pub fn scan_all(&self) -> crate::Result<Vec<TagRecord>> {
        scan_records(&self.conn)
    }

    pub fn count(&self) -> crate::Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// Start a write batch. Dropping it without [`StoreTx::commit`] rolls back.
    pub fn transaction(&mut self) -> crate::Result<StoreTx<'_>> {
        Ok(StoreTx {
            tx: self.conn.transaction()?,
        })
    }
}

/// Pending writes of one user action.
pub struct StoreTx<'a> {
    tx: Transaction<'a>,
}

impl StoreTx<'_> {
    pub fn get(&self, path: &str) -> crate::Result<Option<TagRecord>> {
        get_record(&self.tx, path)
    }

    pub fn scan_all(&self) -> crate::Result<Vec<TagRecord>> {
        scan_records(&self.tx)
    }

    /// Create the record or replace its tag set in place.
    pub fn upsert(&self, path: &str, tags: &TagSet) -> crate::Result<()> {
        self.tx.execute(
            "INSERT INTO records (path, tags) VALUES (?1, ?2)
             ON CONFLICT(path) DO UPDATE SET tags = excluded.tags",
            params![path, tags.encode()],
        )?;
        Ok(())
    }

    /// Create an untagged record unless one exists. Returns true if created.
    pub fn insert_if_absent(&self, path: &str) -> crate::Result<bool> {
        let inserted = self.tx.execute(
            "INSERT OR IGNORE INTO records (path, tags) VALUES (?1, '')",
            params![path],
        )?;
        Ok(inserted > 0)
    }

    /// Returns true if a record was removed.
    pub fn delete(&self, path: &str) -> crate::Result<bool> {
        let deleted = self
            .tx
            .execute("DELETE FROM records WHERE path = ?1", params![path])?;
        Ok(deleted > 0)
    }

    pub fn commit(self) -> crate::Result<()> {
        self.tx.commit()?;
        Ok(())
    }
}

fn get_record(conn: &Connection, path: &str) -> crate::Result<Option<TagRecord>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT tags FROM records WHERE path = ?1",
            params![path],
            |row| row.get(0),
        )
        .optional()?;
    Ok(raw.map(|tags| TagRecord::new(path, TagSet::decode(&tags))))
}

fn scan_records(conn: &Connection) -> crate::Result<Vec<TagRecord>> {
    let mut stmt = conn.prepare("SELECT path, tags FROM records ORDER BY path")?;
    let records = stmt
        .query_map([], |row| {
            let path: String = row.get(0)?;
            let tags: String = row.get(1)?;
            Ok(TagRecord::new(path, TagSet::decode(&tags)))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}
