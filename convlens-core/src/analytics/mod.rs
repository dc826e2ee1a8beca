//! Analytics module for convlens
//!
//! Aggregates the conversation store into the numbers the reports show:
//! - [`database`]: row counts per core table
//! - [`directory`]: per-directory conversation counts, activity bounds and
//!   decoded history
//!
//! Aggregates never need a payload to decode. Only
//! [`directory::conversation_history`] decodes, and it drops undecodable
//! records individually.

pub mod database;
pub mod directory;

pub use database::{database_stats, DatabaseStats};
pub use directory::{
    conversation_history, decode_records, directory_stats, ConversationEntry, DirectoryHistory,
};
