//! Database schema migrations.
//!
//! Uses a simple version table approach to track applied migrations.
//! There are two independent migration sets because response generations
//! and the task store live in separate database files.

use std::num::ParseIntError;

use super::Error;
use tokio_rusqlite::{Connection, params};

/// Migrations for a response-store generation database.
///
/// Migrations must be applied in order. The version number is an
/// incrementing integer used to track which migrations have been applied.
/// All migrations are idempotent using CREATE IF NOT EXISTS.
const ENTRY_MIGRATIONS: &[(&str, &str)] = &[("1", include_str!("../../migrations/001_entries.sql"))];

/// Migrations for the task store database.
const TASK_MIGRATIONS: &[(&str, &str)] = &[("1", include_str!("../../migrations/001_task_store.sql"))];

/// Run any pending migrations for a response-store generation.
pub async fn run_entries(conn: &Connection) -> Result<(), Error> {
    apply(conn, ENTRY_MIGRATIONS).await
}

/// Run any pending migrations for the task store.
pub async fn run_tasks(conn: &Connection) -> Result<(), Error> {
    apply(conn, TASK_MIGRATIONS).await
}

/// Apply a migration set.
///
/// This creates the _migrations table if it doesn't exist, checks the
/// current version, and applies any migrations that haven't been run yet.
///
/// # Errors
///
/// Returns an error if a migration SQL fails to execute.
async fn apply(conn: &Connection, migrations: &'static [(&str, &str)]) -> Result<(), Error> {
    conn.call(move |conn| -> Result<(), Error> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(Error::from)?;

        let current: i64 = conn
            .query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| {
                row.get(0)
            })
            .map_err(Error::from)?;

        for (version, sql) in migrations {
            let version_num: i64 = version
                .parse()
                .map_err(|e: ParseIntError| Error::MigrationFailed(e.to_string()))?;
            if version_num > current {
                conn.execute_batch(sql)?;
                conn.execute(
                    "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                    params![version_num, chrono::Utc::now().to_rfc3339()],
                )
                .map_err(Error::from)?;
            }
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}
