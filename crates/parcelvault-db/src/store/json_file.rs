//! Single JSON document on disk.
//!
//! The whole snapshot is rewritten on each change: serialized into a temp file in
//! the same directory, fsynced, then renamed over the target. A crash mid-write
//! leaves the previous file untouched. An advisory lock on a `.lock` file serializes writers
//! across processes sharing the same data file; the revision check under that lock
//! is what detects a peer's write.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;
use serde::Deserialize;
use tempfile::NamedTempFile;

use super::{DataStore, Snapshot, StoreError, StoreResult};

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

/// Cheap view of the stored file used for the revision check.
#[derive(Deserialize)]
struct RevisionProbe {
    #[serde(default)]
    revision: u64,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_snapshot(path: &Path) -> StoreResult<Snapshot> {
        match fs::read(path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Snapshot::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Snapshot::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn read_revision(path: &Path) -> StoreResult<u64> {
        match fs::read(path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(0),
            Ok(bytes) => Ok(serde_json::from_slice::<RevisionProbe>(&bytes)?.revision),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn write_atomic(path: &Path, expected_revision: u64, snapshot: &Snapshot) -> StoreResult<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let _lock = FileLock::acquire(&lock_path(path))?;

        let found = Self::read_revision(path)?;
        if found != expected_revision {
            return Err(StoreError::Conflict {
                expected: expected_revision,
                found,
            });
        }

        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(tmp.as_file_mut(), snapshot)?;
        tmp.as_file_mut().write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    path.with_file_name(name)
}

/// Exclusive `flock` on a sibling lock file. The OS drops it with the handle,
/// so a writer that dies mid-update never wedges the store.
struct FileLock {
    file: fs::File,
}

impl FileLock {
    fn acquire(path: &Path) -> StoreResult<Self> {
        let file = fs::OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;
        FileExt::lock_exclusive(&file)?;
        Ok(Self { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[async_trait]
impl DataStore for JsonFileStore {
    async fn load(&self) -> StoreResult<Snapshot> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || Self::read_snapshot(&path))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn persist(&self, expected_revision: u64, snapshot: &Snapshot) -> StoreResult<()> {
        let path = self.path.clone();
        let snapshot = snapshot.clone();
        let start = std::time::Instant::now();

        tokio::task::spawn_blocking(move || {
            Self::write_atomic(&path, expected_revision, &snapshot)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))??;

        tracing::debug!(
            path = %self.path.display(),
            revision = expected_revision + 1,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Snapshot persisted"
        );
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "json_file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_loads_empty_snapshot() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data/portal.json"));
        let snap = store.load().await.unwrap();
        assert_eq!(snap.revision, 0);
        assert!(snap.access_codes.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_top_level_keys_survive_rewrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("portal.json");
        fs::write(
            &path,
            r#"{"parcels": [], "map_settings": {"zoom": 15}, "access_codes": []}"#,
        )
        .unwrap();

        let store = Store::open(Arc::new(JsonFileStore::new(&path)))
            .await
            .unwrap();
        store.write(|_| Ok(())).await.unwrap();

        let raw: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["map_settings"]["zoom"], 15);
        assert_eq!(raw["revision"], 1);
        assert!(raw.get("parcelles").is_some());
    }

    #[tokio::test]
    async fn test_leftover_lock_file_does_not_block_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("portal.json");
        // A writer that crashed leaves its lock file behind, but not the lock.
        fs::write(lock_path(&path), b"").unwrap();

        let store = Store::open(Arc::new(JsonFileStore::new(&path)))
            .await
            .unwrap();
        for key in ["a", "b"] {
            store
                .write(|snap| {
                    snap.extra.insert(key.to_string(), serde_json::json!(true));
                    Ok(())
                })
                .await
                .unwrap();
        }

        let on_disk = JsonFileStore::new(&path).load().await.unwrap();
        assert_eq!(on_disk.revision, 2);
        assert_eq!(on_disk.extra["b"], true);
    }

    #[tokio::test]
    async fn test_lock_is_released_after_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("portal.json");
        let store = Store::open(Arc::new(JsonFileStore::new(&path)))
            .await
            .unwrap();
        store.write(|_| Ok(())).await.unwrap();

        let lock = fs::OpenOptions::new()
            .write(true)
            .open(lock_path(&path))
            .unwrap();
        lock.try_lock_exclusive().unwrap();
    }

    #[tokio::test]
    async fn test_two_stores_on_one_file_keep_both_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("portal.json");

        let first = Store::open(Arc::new(JsonFileStore::new(&path)))
            .await
            .unwrap();
        let second = Store::open(Arc::new(JsonFileStore::new(&path)))
            .await
            .unwrap();

        first
            .write(|snap| {
                snap.extra.insert("a".to_string(), serde_json::json!(1));
                Ok(())
            })
            .await
            .unwrap();
        // `second` still caches revision 0 and must rebase on the first write.
        second
            .write(|snap| {
                snap.extra.insert("b".to_string(), serde_json::json!(2));
                Ok(())
            })
            .await
            .unwrap();

        let on_disk = JsonFileStore::new(&path).load().await.unwrap();
        assert_eq!(on_disk.revision, 2);
        assert_eq!(on_disk.extra["a"], 1);
        assert_eq!(on_disk.extra["b"], 2);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("portal.json");
        fs::write(&path, "{not json").unwrap();
        let result = JsonFileStore::new(&path).load().await;
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }
}
