//! Task persistence store.
//!
//! The task collection is persisted as one JSON value under a fixed key,
//! in its own database file so that task data survives generation
//! reclamation. The contract mirrors the UI layer's usage: `load` once at
//! startup, `save` whenever the non-empty collection changes, and `clear`
//! after a bulk delete. An empty collection is persisted by deleting the
//! stored value, never by writing an empty sequence.

use crate::Error;
use crate::store::migrations;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;
use tokio_rusqlite::Connection;

/// Key the task collection is stored under.
const TASK_KEY: &str = "pwa-tasks";

/// A short text task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Creation-timestamp-derived id (milliseconds since the epoch).
    pub id: i64,
    /// Task title; non-empty after trimming.
    pub title: String,
    /// Whether the task has been completed.
    pub completed: bool,
}

impl Task {
    /// Create a pending task, trimming the title.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the title is empty after trimming.
    pub fn new(title: &str) -> Result<Self, Error> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::InvalidInput("task title must not be empty".into()));
        }
        Ok(Self { id: Utc::now().timestamp_millis(), title: title.to_string(), completed: false })
    }
}

/// Persistent store for the task collection.
#[derive(Clone, Debug)]
pub struct TaskStore {
    conn: Connection,
}

impl TaskStore {
    /// Open the task database at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies performance pragmas,
    /// and runs any pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::prepare(conn).await
    }

    /// Open an in-memory task database for testing.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::prepare(conn).await
    }

    async fn prepare(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode=WAL;
                 PRAGMA synchronous=NORMAL;
                 PRAGMA temp_store=MEMORY;",
            )?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        migrations::run_tasks(&conn).await?;

        Ok(Self { conn })
    }

    /// Load the task collection.
    ///
    /// An absent stored value is an empty collection.
    pub async fn load(&self) -> Result<Vec<Task>, Error> {
        let json = self
            .conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let mut stmt = conn.prepare("SELECT tasks_json FROM task_store WHERE key = ?1")?;
                let result = stmt.query_row(params![TASK_KEY], |row| row.get(0));
                match result {
                    Ok(json) => Ok(Some(json)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        match json {
            Some(json) => {
                serde_json::from_str(&json).map_err(|e| Error::InvalidInput(format!("stored tasks: {e}")))
            }
            None => Ok(Vec::new()),
        }
    }

    /// Persist the full task collection, replacing the stored value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty collection: an empty collection
    /// is persisted by `clear`, never by writing an empty sequence.
    pub async fn save(&self, tasks: &[Task]) -> Result<(), Error> {
        if tasks.is_empty() {
            return Err(Error::InvalidInput("refusing to save an empty task list; use clear".into()));
        }

        let tasks_json = serde_json::to_string(tasks).map_err(|e| Error::InvalidInput(format!("tasks: {e}")))?;
        let saved_at = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO task_store (key, tasks_json, saved_at)
                    VALUES (?1, ?2, ?3)
                    ON CONFLICT(key) DO UPDATE SET
                        tasks_json = excluded.tasks_json,
                        saved_at = excluded.saved_at",
                    params![TASK_KEY, tasks_json, saved_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete the stored value (bulk-clear persistence).
    pub async fn clear(&self) -> Result<(), Error> {
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute("DELETE FROM task_store WHERE key = ?1", params![TASK_KEY])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
