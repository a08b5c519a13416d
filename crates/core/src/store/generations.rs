//! Generation enumeration and reclamation.
//!
//! Generations map one-to-one to database files inside the cache
//! directory, so enumeration is a directory listing and deletion removes
//! the file (plus SQLite WAL sidecars). Reclamation deletes every
//! generation except the survivor, concurrently and order-independently.

use crate::Error;
use std::path::{Path, PathBuf};

use super::connection::{GENERATION_EXT, db_path};

/// Validate a generation name.
///
/// Names become file names, so the accepted alphabet is restricted to
/// `[A-Za-z0-9._-]` and the name must not be empty or dot-only.
pub fn validate_name(name: &str) -> Result<(), Error> {
    if name.is_empty() {
        return Err(Error::InvalidGeneration("name must not be empty".into()));
    }
    if name.chars().all(|c| c == '.') {
        return Err(Error::InvalidGeneration(format!("{name:?} is not a usable name")));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(Error::InvalidGeneration(format!("{name:?} contains {bad:?}")));
    }
    Ok(())
}

/// Enumerate the generation names present in the cache directory.
///
/// A missing cache directory is an empty enumeration, not an error.
/// Names are returned sorted for stable logging and assertions.
pub async fn list(dir: &Path) -> Result<Vec<String>, Error> {
    let mut read_dir = match tokio::fs::read_dir(dir).await {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    while let Some(dir_entry) = read_dir.next_entry().await? {
        let path = dir_entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(GENERATION_EXT) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            names.push(stem.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Delete one generation in its entirety.
///
/// Removes the database file and any `-wal`/`-shm` sidecars left behind
/// by WAL mode. Absent sidecars are not an error.
pub async fn delete(dir: &Path, name: &str) -> Result<(), Error> {
    validate_name(name)?;

    let db = db_path(dir, name);
    tokio::fs::remove_file(&db).await?;

    for suffix in ["-wal", "-shm"] {
        let sidecar = sidecar_path(&db, suffix);
        match tokio::fs::remove_file(&sidecar).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Delete every generation except `keep`.
///
/// Deletions run concurrently; no partial-generation deletion can occur
/// because each generation is a single database file. Returns the names
/// of the generations that were deleted.
pub async fn reclaim(dir: &Path, keep: &str) -> Result<Vec<String>, Error> {
    validate_name(keep)?;

    let stale: Vec<String> = list(dir).await?.into_iter().filter(|name| name != keep).collect();

    let mut set = tokio::task::JoinSet::new();
    for name in stale {
        let dir = dir.to_path_buf();
        set.spawn(async move {
            delete(&dir, &name).await?;
            Ok::<String, Error>(name)
        });
    }

    let mut deleted = Vec::new();
    while let Some(joined) = set.join_next().await {
        let name = joined.map_err(|e| Error::Io(std::io::Error::other(e)))??;
        deleted.push(name);
    }
    deleted.sort();
    Ok(deleted)
}

fn sidecar_path(db: &Path, suffix: &str) -> PathBuf {
    let mut name = db.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ResponseStore;

    #[test]
    fn test_validate_name_accepts_versioned_names() {
        assert!(validate_name("task-manager-v1").is_ok());
        assert!(validate_name("v2.0_rc").is_ok());
    }

    #[test]
    fn test_validate_name_rejects_bad_names() {
        assert!(matches!(validate_name(""), Err(Error::InvalidGeneration(_))));
        assert!(matches!(validate_name(".."), Err(Error::InvalidGeneration(_))));
        assert!(matches!(validate_name("a/b"), Err(Error::InvalidGeneration(_))));
        assert!(matches!(validate_name("v1 final"), Err(Error::InvalidGeneration(_))));
    }

    #[tokio::test]
    async fn test_list_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nothing-here");
        assert!(list(&missing).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_ignores_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let _v1 = ResponseStore::open(dir.path(), "v1").await.unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), b"x").await.unwrap();

        assert_eq!(list(dir.path()).await.unwrap(), vec!["v1".to_string()]);
    }

    #[tokio::test]
    async fn test_reclaim_keeps_only_current() {
        let dir = tempfile::tempdir().unwrap();
        let _v1 = ResponseStore::open(dir.path(), "v1").await.unwrap();
        let _v2 = ResponseStore::open(dir.path(), "v2").await.unwrap();

        let deleted = reclaim(dir.path(), "v2").await.unwrap();
        assert_eq!(deleted, vec!["v1".to_string()]);
        assert_eq!(list(dir.path()).await.unwrap(), vec!["v2".to_string()]);
    }

    #[tokio::test]
    async fn test_reclaim_with_single_generation_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let _v1 = ResponseStore::open(dir.path(), "v1").await.unwrap();

        let deleted = reclaim(dir.path(), "v1").await.unwrap();
        assert!(deleted.is_empty());
        assert_eq!(list(dir.path()).await.unwrap(), vec!["v1".to_string()]);
    }

    #[tokio::test]
    async fn test_reclaim_many_generations() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["v1", "v2", "v3", "v4"] {
            let _store = ResponseStore::open(dir.path(), name).await.unwrap();
        }

        let deleted = reclaim(dir.path(), "v3").await.unwrap();
        assert_eq!(deleted, vec!["v1".to_string(), "v2".to_string(), "v4".to_string()]);
        assert_eq!(list(dir.path()).await.unwrap(), vec!["v3".to_string()]);
    }
}
