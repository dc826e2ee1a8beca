//! # convlens-core
//!
//! Core library for convlens - a read-only analyzer for the conversation
//! store kept by the Amazon Q developer CLI.
//!
//! This library provides:
//! - Domain types for conversation records, exchanges and directory stats
//! - Read-only access to the SQLite store
//! - Tolerant decoding of conversation payloads
//! - Aggregation and report presentation
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows one way:
//! - **Store:** `conversations_v2` rows, never written to
//! - **Records:** [`ConversationRecord`] with the payload still raw
//! - **Decoded:** [`ConversationData`], one record at a time
//! - **Reports:** [`report::Report`] lines, shared by the analyzer and the viewer
//!
//! ## Example
//!
//! ```rust,no_run
//! use convlens_core::{analytics, report, Config, Database};
//!
//! let config = Config::load().expect("failed to load config");
//! let path = config.resolve_store(None).expect("no store found");
//! let db = Database::open(&path).expect("failed to open store");
//!
//! let stats = analytics::database_stats(&db);
//! print!("{}", report::database_overview(&stats, &config.display));
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::Database;
pub use decode::decode_conversation;
pub use error::{DecodeError, Error, Result};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod db;
pub mod decode;
pub mod error;
pub mod format;
pub mod logging;
pub mod render;
pub mod report;
pub mod types;
