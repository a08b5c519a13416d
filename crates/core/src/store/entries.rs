//! Entry CRUD operations.
//!
//! Provides functions for storing and retrieving response snapshots
//! within one generation.

use super::connection::ResponseStore;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// An immutable snapshot of a network response.
///
/// The body is fully buffered at capture time, so the same snapshot can
/// be persisted and replayed to a consumer without re-reading a stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResponse {
    /// Request identity this snapshot is keyed by.
    pub identity: String,
    /// Uppercased request method.
    pub method: String,
    /// Canonical URL the response was fetched from.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response headers as name/value pairs.
    pub headers: Vec<(String, String)>,
    /// Buffered response body.
    pub body: Vec<u8>,
    /// RFC 3339 timestamp of when the snapshot was written.
    pub stored_at: String,
}

impl ResponseStore {
    /// Insert or update a response snapshot.
    ///
    /// Uses UPSERT semantics: a later write for the same identity
    /// overwrites the earlier one (last write wins).
    pub async fn put(&self, entry: &StoredResponse) -> Result<(), Error> {
        let entry = entry.clone();
        let headers_json =
            serde_json::to_string(&entry.headers).map_err(|e| Error::InvalidInput(format!("headers: {e}")))?;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO entries (identity, method, url, status, headers_json, body, stored_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    ON CONFLICT(identity) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        &entry.identity,
                        &entry.method,
                        &entry.url,
                        entry.status,
                        &headers_json,
                        &entry.body,
                        &entry.stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up a response snapshot by request identity.
    ///
    /// Returns None on a store miss.
    pub async fn get(&self, identity: &str) -> Result<Option<StoredResponse>, Error> {
        let identity = identity.to_string();
        self.conn
            .call(move |conn| -> Result<Option<StoredResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT identity, method, url, status, headers_json, body, stored_at
                    FROM entries WHERE identity = ?1",
                )?;

                let result = stmt.query_row(params![identity], |row| {
                    let headers_json: String = row.get(4)?;
                    Ok(StoredResponse {
                        identity: row.get(0)?,
                        method: row.get(1)?,
                        url: row.get(2)?,
                        status: row.get(3)?,
                        headers: serde_json::from_str(&headers_json).unwrap_or_default(),
                        body: row.get(5)?,
                        stored_at: row.get(6)?,
                    })
                });

                match result {
                    Ok(entry) => Ok(Some(entry)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries in this generation.
    pub async fn len(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
