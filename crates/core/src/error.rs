//! Unified error types for outpost.
//!
//! Store misses are represented as `Ok(None)` at the call sites, never as
//! an error variant.

use tokio_rusqlite::rusqlite;

/// Unified error types for the offline resource proxy.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., an empty task title).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Invalid URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Store generation name failed validation.
    #[error("invalid generation name: {0}")]
    InvalidGeneration(String),

    /// Database operation failed.
    #[error("store error: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("store error: migration failed: {0}")]
    MigrationFailed(String),

    /// Filesystem operation on the generation directory failed.
    #[error("generation directory error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level network failure (offline, DNS, timeout, body read).
    #[error("fetch failed: {0}")]
    FetchFailed(String),

    /// Response body exceeds the configured size cap.
    #[error("fetch too large: {0}")]
    FetchTooLarge(String),

    /// One or more manifest resources could not be provisioned.
    ///
    /// Non-fatal to activation; the gaps backfill opportunistically on
    /// later static-resource routing.
    #[error("provisioning left {} resource(s) unfetched: {}", failed.len(), failed.join(", "))]
    ProvisionIncomplete { failed: Vec<String> },

    /// Terminal routing outcome: neither network nor store produced a
    /// response. The only error a proxy consumer ever observes.
    #[error("no usable response: {0}")]
    NoUsableResponse(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}
