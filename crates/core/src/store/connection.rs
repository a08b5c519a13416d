//! Per-generation database connection management.
//!
//! This module handles opening one SQLite database per store generation,
//! applying the pragmas required for performance and concurrency (WAL
//! mode), and running migrations.

use super::{generations, migrations};
use crate::Error;
use std::path::{Path, PathBuf};
use tokio_rusqlite::Connection;

/// File extension for generation databases inside the cache directory.
pub const GENERATION_EXT: &str = "db";

/// Database path for a named generation inside the cache directory.
pub fn db_path(dir: &Path, generation: &str) -> PathBuf {
    dir.join(format!("{generation}.{GENERATION_EXT}"))
}

/// Handle to one store generation.
///
/// Wraps a tokio-rusqlite Connection that runs database operations on a
/// background thread. Cloning is cheap; all clones share the connection.
#[derive(Clone, Debug)]
pub struct ResponseStore {
    pub(crate) conn: Connection,
    generation: String,
}

impl ResponseStore {
    /// Open the generation named `generation` inside `dir`.
    ///
    /// Creates the cache directory and the database file if absent,
    /// applies performance pragmas, and runs any pending migrations.
    pub async fn open(dir: impl AsRef<Path>, generation: &str) -> Result<Self, Error> {
        generations::validate_name(generation)?;

        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;

        let conn = Connection::open(db_path(dir, generation))
            .await
            .map_err(|e| Error::Database(e.into()))?;

        Self::prepare(conn, generation).await
    }

    /// Open an in-memory generation for testing.
    ///
    /// Same pragma configuration and schema as file-based generations,
    /// but nothing touches disk and the generation cannot be enumerated
    /// or reclaimed.
    pub async fn open_in_memory(generation: &str) -> Result<Self, Error> {
        generations::validate_name(generation)?;

        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;

        Self::prepare(conn, generation).await
    }

    async fn prepare(conn: Connection, generation: &str) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode=WAL;
                 PRAGMA synchronous=NORMAL;
                 PRAGMA temp_store=MEMORY;
                 PRAGMA foreign_keys=ON;",
            )?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        migrations::run_entries(&conn).await?;

        Ok(Self { conn, generation: generation.to_string() })
    }

    /// Name of the generation this handle belongs to.
    pub fn generation(&self) -> &str {
        &self.generation
    }
}
