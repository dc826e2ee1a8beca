//! Expected layout of the conversation store
//!
//! convlens never migrates or writes the store. The DDL below documents the
//! layout the queries in [`super::repo`] are written against, and lets tests
//! build fixture stores.

use rusqlite::Connection;

use crate::error::{Error, Result};

/// Table holding one row per (directory, conversation).
pub const CONVERSATIONS_TABLE: &str = "conversations_v2";

/// Tables reported in the database overview, in display order.
pub const CORE_TABLES: [&str; 5] = [
    CONVERSATIONS_TABLE,
    "migrations",
    "auth_kv",
    "state",
    "history",
];

/// Columns the conversation queries select.
const CONVERSATION_COLUMNS: [&str; 5] = ["key", "conversation_id", "value", "created_at", "updated_at"];

/// DDL of the store as written by the assistant.
///
/// All timestamps are epoch milliseconds except `history.start_time` and
/// `history.end_time`, which are seconds.
pub const STORE_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS migrations (
        id             INTEGER PRIMARY KEY,
        version        INTEGER NOT NULL,
        migration_time INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS history (
        id          INTEGER PRIMARY KEY,
        command     TEXT,
        shell       TEXT,
        pid         INTEGER,
        session_id  TEXT,
        cwd         TEXT,
        start_time  INTEGER,
        hostname    TEXT,
        exit_code   INTEGER,
        end_time    INTEGER,
        duration    INTEGER
    );

    CREATE TABLE IF NOT EXISTS auth_kv (
        key   TEXT PRIMARY KEY,
        value TEXT
    );

    CREATE TABLE IF NOT EXISTS state (
        key   TEXT PRIMARY KEY,
        value BLOB
    );

    CREATE TABLE IF NOT EXISTS conversations_v2 (
        key             TEXT NOT NULL,
        conversation_id TEXT NOT NULL,
        value           TEXT NOT NULL,
        created_at      INTEGER NOT NULL,
        updated_at      INTEGER NOT NULL,
        PRIMARY KEY (key, conversation_id)
    );
"#;

/// Whether `table` is one of the tables convlens knows how to count.
pub fn is_core_table(table: &str) -> bool {
    CORE_TABLES.contains(&table)
}

/// Verify that the conversations table exposes every column the queries use.
pub fn check_conversations_table(conn: &Connection) -> Result<()> {
    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info(?1)")
        .map_err(|source| schema_mismatch(CONVERSATIONS_TABLE, source))?;

    let columns: Vec<String> = stmt
        .query_map([CONVERSATIONS_TABLE], |row| row.get(0))
        .map_err(|source| schema_mismatch(CONVERSATIONS_TABLE, source))?
        .filter_map(|r| r.ok())
        .collect();

    for expected in CONVERSATION_COLUMNS {
        if !columns.iter().any(|c| c == expected) {
            return Err(schema_mismatch(
                CONVERSATIONS_TABLE,
                rusqlite::Error::InvalidColumnName(expected.to_string()),
            ));
        }
    }

    Ok(())
}

pub(crate) fn schema_mismatch(table: &str, source: rusqlite::Error) -> Error {
    Error::SchemaMismatch {
        table: table.to_string(),
        source,
    }
}
