//! SQLite-backed response store, one database per generation.
//!
//! A store generation is a named, wholesale-replaceable collection of
//! response snapshots keyed by request identity. Each generation lives in
//! its own database file under the cache directory, so reclaiming a
//! generation is a file deletion, never a row scan. The module provides:
//!
//! - Per-generation connections with WAL mode and automatic migrations
//! - Request-identity hashing (method + canonical URL)
//! - UPSERT entry storage with last-write-wins semantics
//! - Generation enumeration and concurrent reclamation

pub mod connection;
pub mod entries;
pub mod generations;
pub mod identity;
pub mod migrations;

pub use crate::Error;

pub use connection::ResponseStore;
pub use entries::StoredResponse;
