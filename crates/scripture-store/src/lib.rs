//! scripture-store
//!
//! Relational verse store on SQLite: import of parsed documents, literal
//! substring search with an occurrence-based relevance score, and corpus
//! listing for the fuzzy and semantic engines.

pub mod sqlite;

pub use sqlite::{occurrence_relevance, SqliteStore};
