//! Database repository layer
//!
//! Read-only queries against the conversation store. Every method maps one
//! SQL statement onto the types in [`crate::types`]; nothing here decodes the
//! JSON payloads.

use crate::error::{Error, Result};
use crate::types::{ConversationRecord, DirectoryStats};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags, Row};
use std::path::{Path, PathBuf};

use super::schema::{self, CONVERSATIONS_TABLE};

/// Read-only handle on the conversation store.
///
/// The connection is closed when the handle is dropped, so an early return
/// anywhere in a report still releases it. [`Database::close`] does the same
/// explicitly and surfaces close errors.
pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    /// Open an existing store read-only.
    ///
    /// Fails with [`Error::StoreUnavailable`] when the file is missing,
    /// unreadable, or not an SQLite database.
    pub fn open(path: &Path) -> Result<Self> {
        let unavailable = |source| Error::StoreUnavailable {
            path: path.to_path_buf(),
            source,
        };

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(unavailable)?;

        // SQLite opens lazily; touching the schema is what rejects a non-database file.
        conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(unavailable)?;

        tracing::info!(path = %path.display(), "Opened conversation store");

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Path the store was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the connection, reporting any error SQLite raises while doing so.
    pub fn close(self) -> Result<()> {
        let path = self.path;
        self.conn.close().map_err(|(_, e)| Error::QueryFailed(e))?;
        tracing::info!(path = %path.display(), "Closed conversation store");
        Ok(())
    }

    /// Check that the conversations table has the columns the queries need.
    pub fn verify_schema(&self) -> Result<()> {
        schema::check_conversations_table(&self.conn)
    }

    // ============================================
    // Conversations
    // ============================================

    /// Conversations recorded under exactly `directory_key`, oldest first.
    ///
    /// No path normalisation happens here; an unknown key yields an empty list.
    pub fn conversations_for(&self, directory_key: &str) -> Result<Vec<ConversationRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT key, conversation_id, value, created_at, updated_at
            FROM conversations_v2
            WHERE key = ?1
            ORDER BY created_at ASC, rowid ASC
            "#,
        )?;

        let records = stmt
            .query_map(params![directory_key], record_from_row)?
            .filter_map(|r| match r {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::debug!(error = %e, directory = directory_key, "Skipping unreadable row");
                    None
                }
            })
            .collect();

        Ok(records)
    }

    // ============================================
    // Aggregates
    // ============================================

    /// Per-directory counts and activity bounds, busiest directory first.
    ///
    /// Directories with equal counts keep the order in which they first
    /// appeared in the store.
    pub fn directory_stats(&self) -> Result<Vec<DirectoryStats>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                key,
                COUNT(*)        AS conversation_count,
                MIN(created_at) AS first_activity,
                MAX(updated_at) AS last_activity
            FROM conversations_v2
            GROUP BY key
            ORDER BY conversation_count DESC, MIN(rowid) ASC
            "#,
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(DirectoryStats {
                    directory: row.get(0)?,
                    total_conversations: row.get(1)?,
                    first_activity: row.get(2)?,
                    last_activity: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    /// Row count of one of the store's core tables.
    ///
    /// A missing or unreadable table is reported as [`Error::SchemaMismatch`].
    pub fn count_rows(&self, table: &str) -> Result<i64> {
        if !schema::is_core_table(table) {
            return Err(schema::schema_mismatch(
                table,
                rusqlite::Error::InvalidParameterName(table.to_string()),
            ));
        }

        // Table names cannot be bound; the allow-list above keeps this safe.
        let sql = format!("SELECT COUNT(*) FROM \"{}\"", table);
        self.conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(|source| schema::schema_mismatch(table, source))
    }

    /// Number of distinct directory keys.
    pub fn count_directories(&self) -> Result<i64> {
        let count = self.conn.query_row(
            &format!("SELECT COUNT(DISTINCT key) FROM {}", CONVERSATIONS_TABLE),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

/// Map a `conversations_v2` row. The payload may be stored as TEXT or BLOB.
fn record_from_row(row: &Row<'_>) -> rusqlite::Result<ConversationRecord> {
    let raw_payload = match row.get_ref(2)? {
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
    };

    Ok(ConversationRecord {
        directory_key: row.get(0)?,
        conversation_id: row.get(1)?,
        raw_payload,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::{CORE_TABLES, STORE_DDL};
    use tempfile::TempDir;

    /// Build a store on disk the way the assistant would, then hand back its path.
    fn create_store(dir: &TempDir, rows: &[(&str, &str, &str, i64, i64)]) -> PathBuf {
        let path = dir.path().join("data.sqlite3");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(STORE_DDL).unwrap();
        for (key, id, value, created, updated) in rows {
            conn.execute(
                "INSERT INTO conversations_v2 (key, conversation_id, value, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![key, id, value, created, updated],
            )
            .unwrap();
        }
        path
    }

    #[test]
    fn test_open_missing_file_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let result = Database::open(&dir.path().join("nope.sqlite3"));
        assert!(matches!(result, Err(Error::StoreUnavailable { .. })));
    }

    #[test]
    fn test_open_garbage_file_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("garbage.sqlite3");
        std::fs::write(&path, b"this is definitely not an sqlite database, just text").unwrap();
        let result = Database::open(&path);
        assert!(matches!(result, Err(Error::StoreUnavailable { .. })));
    }

    #[test]
    fn test_conversations_for_orders_by_created_at() {
        let dir = TempDir::new().unwrap();
        let path = create_store(
            &dir,
            &[
                ("/proj", "c-late", "{}", 3_000, 3_000),
                ("/proj", "c-early", "{}", 1_000, 2_000),
                ("/other", "c-other", "{}", 500, 500),
            ],
        );
        let db = Database::open(&path).unwrap();

        let records = db.conversations_for("/proj").unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.conversation_id.as_str()).collect();
        assert_eq!(ids, vec!["c-early", "c-late"]);
        assert_eq!(records[0].created_at, 1_000);
        assert_eq!(records[0].updated_at, 2_000);
    }

    #[test]
    fn test_conversations_for_is_exact_match() {
        let dir = TempDir::new().unwrap();
        let path = create_store(&dir, &[("/proj", "c1", "{}", 1, 1)]);
        let db = Database::open(&path).unwrap();

        assert!(db.conversations_for("/proj/").unwrap().is_empty());
        assert!(db.conversations_for("proj").unwrap().is_empty());
        assert_eq!(db.conversations_for("/proj").unwrap().len(), 1);
    }

    #[test]
    fn test_directory_stats_ranking_and_ties() {
        let dir = TempDir::new().unwrap();
        let path = create_store(
            &dir,
            &[
                ("/b", "1", "{}", 10, 20),
                ("/a", "2", "{}", 5, 50),
                ("/c", "3", "{}", 1, 1),
                ("/c", "4", "{}", 7, 90),
            ],
        );
        let db = Database::open(&path).unwrap();

        let stats = db.directory_stats().unwrap();
        let dirs: Vec<_> = stats.iter().map(|s| s.directory.as_str()).collect();
        // /c has two conversations; /b and /a tie and keep insertion order
        assert_eq!(dirs, vec!["/c", "/b", "/a"]);
        assert_eq!(stats[0].total_conversations, 2);
        assert_eq!(stats[0].first_activity, 1);
        assert_eq!(stats[0].last_activity, 90);
    }

    #[test]
    fn test_directory_stats_counts_every_record() {
        let dir = TempDir::new().unwrap();
        let path = create_store(
            &dir,
            &[
                ("/a", "1", "{}", 100, 200),
                ("/b", "2", "{}", 50, 60),
                ("/a", "3", "not json", 10, 400),
                ("/c", "4", "{}", 70, 70),
                ("/b", "5", "{}", 300, 350),
                ("/a", "6", "{}", 150, 150),
            ],
        );
        let db = Database::open(&path).unwrap();

        let stats = db.directory_stats().unwrap();
        let total: i64 = stats.iter().map(|s| s.total_conversations).sum();
        assert_eq!(total, db.count_rows(CONVERSATIONS_TABLE).unwrap());
        for s in &stats {
            assert!(s.first_activity <= s.last_activity, "{:?}", s);
        }
        assert_eq!(stats[0].directory, "/a");
        assert_eq!(stats[0].first_activity, 10);
        assert_eq!(stats[0].last_activity, 400);
    }

    #[test]
    fn test_directory_stats_unreadable_group_fails() {
        let dir = TempDir::new().unwrap();
        let path = create_store(&dir, &[("/a", "1", "{}", 1, 1)]);
        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "INSERT INTO conversations_v2 (key, conversation_id, value, created_at, updated_at)
             VALUES ('/b', '2', '{}', 'abc', 'abc')",
            [],
        )
        .unwrap();
        drop(conn);
        let db = Database::open(&path).unwrap();

        assert!(matches!(db.directory_stats(), Err(Error::QueryFailed(_))));
    }

    #[test]
    fn test_directory_stats_empty_store() {
        let dir = TempDir::new().unwrap();
        let path = create_store(&dir, &[]);
        let db = Database::open(&path).unwrap();
        assert!(db.directory_stats().unwrap().is_empty());
    }

    #[test]
    fn test_count_rows() {
        let dir = TempDir::new().unwrap();
        let path = create_store(&dir, &[("/p", "1", "{}", 1, 1), ("/p", "2", "{}", 1, 1)]);
        let db = Database::open(&path).unwrap();

        assert_eq!(db.count_rows("conversations_v2").unwrap(), 2);
        for table in CORE_TABLES {
            assert!(db.count_rows(table).is_ok());
        }
        assert!(matches!(
            db.count_rows("sqlite_master"),
            Err(Error::SchemaMismatch { .. })
        ));
        assert_eq!(db.count_directories().unwrap(), 1);
    }

    #[test]
    fn test_count_rows_missing_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.sqlite3");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE conversations_v2 (key TEXT, conversation_id TEXT, value TEXT,
                                            created_at INTEGER, updated_at INTEGER)",
        )
        .unwrap();
        drop(conn);

        let db = Database::open(&path).unwrap();
        assert!(db.count_rows("conversations_v2").is_ok());
        match db.count_rows("history") {
            Err(Error::SchemaMismatch { table, .. }) => assert_eq!(table, "history"),
            other => panic!("expected SchemaMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_blob_payload_is_read_as_text() {
        let dir = TempDir::new().unwrap();
        let path = create_store(&dir, &[]);
        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "INSERT INTO conversations_v2 VALUES ('/p', 'blob', ?1, 1, 1)",
            params![br#"{"history":[]}"#.to_vec()],
        )
        .unwrap();
        drop(conn);

        let db = Database::open(&path).unwrap();
        let records = db.conversations_for("/p").unwrap();
        assert_eq!(records[0].raw_payload, r#"{"history":[]}"#);
    }

    #[test]
    fn test_close() {
        let dir = TempDir::new().unwrap();
        let path = create_store(&dir, &[]);
        let db = Database::open(&path).unwrap();
        assert!(db.verify_schema().is_ok());
        assert!(db.close().is_ok());
    }
}
