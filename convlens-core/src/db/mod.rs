//! Read-only access to the conversation store
//!
//! The store is an SQLite file owned by the assistant that writes it.
//! convlens opens it read-only, runs a handful of queries and closes it again:
//! - [`repo`] holds the [`Database`] handle and its queries
//! - [`schema`] names the tables and columns the queries rely on

pub mod repo;
pub mod schema;

pub use repo::Database;
pub use schema::CORE_TABLES;
