//! Whole-store statistics for the database overview.

use serde::Serialize;

use crate::db::{Database, CORE_TABLES};
use crate::types::TableCount;

/// Row counts for the store's core tables plus conversation totals.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DatabaseStats {
    /// One entry per core table, in display order
    pub tables: Vec<TableCount>,
    /// Distinct directory keys, when the conversations table is readable
    pub directory_count: Option<i64>,
}

impl DatabaseStats {
    /// Row count of `conversations_v2`, if it could be read.
    pub fn total_conversations(&self) -> Option<i64> {
        self.tables
            .iter()
            .find(|t| t.table == crate::db::schema::CONVERSATIONS_TABLE)
            .and_then(|t| t.rows)
    }

    /// Tables whose count could not be taken.
    pub fn unavailable_tables(&self) -> impl Iterator<Item = &str> {
        self.tables
            .iter()
            .filter(|t| t.rows.is_none())
            .map(|t| t.table.as_str())
    }
}

/// Count every core table.
///
/// A table that cannot be counted degrades to `rows: None` and a warning;
/// the remaining tables are still reported.
pub fn database_stats(db: &Database) -> DatabaseStats {
    let tables = CORE_TABLES
        .iter()
        .map(|table| {
            let rows = match db.count_rows(table) {
                Ok(count) => Some(count),
                Err(e) => {
                    tracing::warn!(table, error = %e, "Table count unavailable");
                    None
                }
            };
            TableCount {
                table: table.to_string(),
                rows,
            }
        })
        .collect();

    let directory_count = match db.count_directories() {
        Ok(count) => Some(count),
        Err(e) => {
            tracing::warn!(error = %e, "Directory count unavailable");
            None
        }
    };

    DatabaseStats {
        tables,
        directory_count,
    }
}
