//! Core domain types for convlens
//!
//! These types are read-only projections of rows in the conversation store.
//! Nothing here outlives a single report run.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Directory key** | Absolute path a conversation was recorded under; groups conversations |
//! | **Conversation** | One stored chat session, keyed by (directory, conversation id) |
//! | **Exchange** | One user turn paired with one assistant turn |
//! | **Turn content** | Polymorphic payload of a turn, resolved by which key is present |
//!
//! Both turn unions carry an explicit `Unrecognized` member. Content that matches
//! no known shape is a normal value, never an error.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;

// ============================================
// Store rows
// ============================================

/// One row of `conversations_v2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationRecord {
    /// Absolute path the conversation belongs to
    pub directory_key: String,
    /// UUID-shaped id, unique within a directory
    pub conversation_id: String,
    /// JSON document holding the exchange history
    #[serde(skip)]
    pub raw_payload: String,
    /// Creation time, ms since epoch
    pub created_at: i64,
    /// Last update time, ms since epoch
    pub updated_at: i64,
}

impl ConversationRecord {
    /// First 8 characters of the conversation id.
    pub fn short_id(&self) -> &str {
        let end = self
            .conversation_id
            .char_indices()
            .nth(8)
            .map(|(idx, _)| idx)
            .unwrap_or(self.conversation_id.len());
        &self.conversation_id[..end]
    }

    /// `false` when the record was never touched after creation.
    ///
    /// An inverted record (`created_at > updated_at`) counts as updated.
    pub fn was_updated(&self) -> bool {
        self.created_at != self.updated_at
    }
}

// ============================================
// Decoded conversation
// ============================================

/// Decoded form of [`ConversationRecord::raw_payload`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversationData {
    /// Id embedded in the payload; informational only
    pub conversation_id: Option<String>,
    /// Exchanges in conversation order
    pub history: Vec<MessageExchange>,
}

impl ConversationData {
    pub fn message_count(&self) -> usize {
        self.history.len()
    }
}

/// One user turn and the assistant's reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageExchange {
    pub user: UserTurn,
    pub assistant: AssistantContent,
    /// Timing data; only the first exchange's is ever shown
    pub request_metadata: Option<RequestMetadata>,
}

impl MessageExchange {
    /// An exchange whose encoding matched nothing at all.
    pub fn unrecognized() -> Self {
        Self {
            user: UserTurn {
                content: UserContent::Unrecognized,
                timestamp: None,
                env_context: None,
            },
            assistant: AssistantContent::Unrecognized,
            request_metadata: None,
        }
    }
}

/// The user's side of an exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserTurn {
    pub content: UserContent,
    /// ISO-8601 timestamp as stored
    pub timestamp: Option<String>,
    pub env_context: Option<EnvContext>,
}

impl UserTurn {
    /// Parsed [`Self::timestamp`].
    ///
    /// Accepts RFC 3339, and ISO 8601 without an offset, which is read as
    /// local time.
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        let s = self.timestamp.as_deref()?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// What the user sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UserContent {
    /// Free text typed by the user
    Prompt { prompt: String },
    /// Results of tools the assistant invoked in the previous exchange
    ToolUseResults { results: Vec<ToolResult> },
    /// Any other shape
    Unrecognized,
}

/// A single tool result. Only counted, never displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolResult {
    pub tool_use_id: Option<String>,
    pub status: Option<String>,
}

/// Operating environment captured alongside a user turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnvContext {
    pub operating_system: Option<String>,
    pub current_working_directory: Option<String>,
}

impl EnvContext {
    pub fn is_empty(&self) -> bool {
        self.operating_system.is_none() && self.current_working_directory.is_none()
    }
}

/// What the assistant answered.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssistantContent {
    /// Plain text reply
    Response { content: String },
    /// One or more tool invocations, in call order
    ToolUse { tool_uses: Vec<ToolInvocation> },
    /// Any other shape
    Unrecognized,
}

/// One tool call made by the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolInvocation {
    pub name: String,
    /// `args.command`, when the arguments carry one
    pub command: Option<String>,
}

/// Timing and classification for the request that produced an exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestMetadata {
    /// Latency to the first streamed chunk; 0 when not recorded
    pub time_to_first_chunk_seconds: f64,
    /// Free-form label such as `ToolUse` or `NotToolUse`
    pub conversation_type: Option<String>,
}

// ============================================
// Derived statistics
// ============================================

/// Conversations grouped by directory key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryStats {
    pub directory: String,
    pub total_conversations: i64,
    /// Earliest `created_at` in the group, ms since epoch
    pub first_activity: i64,
    /// Latest `updated_at` in the group, ms since epoch
    pub last_activity: i64,
}

/// Row count of one store table, `None` when the count could not be taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCount {
    pub table: String,
    pub rows: Option<i64>,
}
