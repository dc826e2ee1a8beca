//! Per-directory statistics and conversation history.
//!
//! Aggregation works on raw rows only, so a directory's numbers are right even
//! when some of its payloads cannot be decoded. Decoding happens only when a
//! directory's history is loaded, one record at a time.

use serde::Serialize;

use crate::db::Database;
use crate::error::Result;
use crate::types::{ConversationData, ConversationRecord, DirectoryStats};

/// Directory ranking straight from the store.
pub fn directory_stats(db: &Database) -> Result<Vec<DirectoryStats>> {
    db.directory_stats()
}

/// A conversation whose payload decoded successfully.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationEntry {
    pub record: ConversationRecord,
    pub data: ConversationData,
}

/// Everything the conversation history report needs for one directory.
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryHistory {
    /// Directory key as requested
    pub directory: String,
    /// Decoded conversations, oldest first
    pub conversations: Vec<ConversationEntry>,
    /// Records dropped because their payload did not decode
    pub skipped: usize,
    /// Known directories, offered when nothing matched
    pub suggestions: Vec<String>,
}

impl DirectoryHistory {
    /// `true` when the store had no record at all for this directory.
    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty() && self.skipped == 0
    }

    /// Exchanges across all decoded conversations.
    pub fn total_messages(&self) -> usize {
        self.conversations
            .iter()
            .map(|c| c.data.message_count())
            .sum()
    }
}

/// Decode records one by one, dropping those whose payload is malformed.
///
/// Returns the decoded entries and how many records were dropped.
pub fn decode_records(records: Vec<ConversationRecord>) -> (Vec<ConversationEntry>, usize) {
    let mut entries = Vec::with_capacity(records.len());
    let mut skipped = 0;

    for record in records {
        match record.decode() {
            Ok(data) => entries.push(ConversationEntry { record, data }),
            Err(e) => {
                skipped += 1;
                tracing::warn!(
                    directory = %record.directory_key,
                    conversation_id = %record.conversation_id,
                    error = %e,
                    "Skipping conversation with undecodable payload"
                );
            }
        }
    }

    (entries, skipped)
}

/// Load and decode every conversation recorded under `directory`.
///
/// When the directory has no conversations, up to `suggestion_limit` known
/// directories are attached instead. Failing to list them only costs the
/// suggestions.
pub fn conversation_history(
    db: &Database,
    directory: &str,
    suggestion_limit: usize,
) -> Result<DirectoryHistory> {
    let records = db.conversations_for(directory)?;

    if records.is_empty() {
        let suggestions = match db.directory_stats() {
            Ok(stats) => stats
                .into_iter()
                .map(|s| s.directory)
                .take(suggestion_limit)
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not list known directories");
                Vec::new()
            }
        };

        return Ok(DirectoryHistory {
            directory: directory.to_string(),
            conversations: Vec::new(),
            skipped: 0,
            suggestions,
        });
    }

    let (conversations, skipped) = decode_records(records);
    tracing::debug!(
        directory,
        decoded = conversations.len(),
        skipped,
        "Loaded conversation history"
    );

    Ok(DirectoryHistory {
        directory: directory.to_string(),
        conversations,
        skipped,
        suggestions: Vec::new(),
    })
}
