//! File-backed store: one JSON file per key inside a data directory

use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use super::{SnapshotStore, StoreError};

#[derive(Debug, Clone)]
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `data_dir`. The directory is created on first write.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the file holding `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.data_dir.join(format!("{}.json", name))
    }

    fn tmp_path(path: &Path) -> PathBuf {
        path.with_extension("json.tmp")
    }

    fn io_error(key: &str, path: &Path, source: std::io::Error) -> StoreError {
        StoreError::Io {
            key: key.to_string(),
            path: path.to_path_buf(),
            source,
        }
    }
}

impl SnapshotStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => Ok(None),
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(key, &path, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        fs::create_dir_all(&self.data_dir).map_err(|e| Self::io_error(key, &path, e))?;

        // readers see the old or the new record, never a partial one
        let tmp = Self::tmp_path(&path);
        let written = fs::File::create(&tmp)
            .and_then(|mut file| {
                file.write_all(value.as_bytes())?;
                file.sync_all()
            })
            .map_err(|e| Self::io_error(key, &tmp, e))
            .and_then(|_| fs::rename(&tmp, &path).map_err(|e| Self::io_error(key, &path, e)));

        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&tmp) {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!("Failed to remove {}: {}", tmp.display(), cleanup);
                }
            }
            return Err(e);
        }

        debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error(key, &path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_key_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("nested"));
        assert!(store.get("pomodoro").unwrap().is_none());
    }

    #[test]
    fn test_write_read_delete() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("nested"));

        store.set("pomodoro", r#"{"a":1}"#).unwrap();
        assert_eq!(store.get("pomodoro").unwrap().as_deref(), Some(r#"{"a":1}"#));
        assert!(store.path_for("pomodoro").exists());

        store.set("pomodoro", r#"{"a":2}"#).unwrap();
        assert_eq!(store.get("pomodoro").unwrap().as_deref(), Some(r#"{"a":2}"#));

        store.delete("pomodoro").unwrap();
        store.delete("pomodoro").unwrap();
        assert!(store.get("pomodoro").unwrap().is_none());
    }

    #[test]
    fn test_keys_are_sanitised() {
        let store = FileStore::new("/data");
        assert_eq!(store.path_for("study/timer:1"), PathBuf::from("/data/study_timer_1.json"));
        assert_eq!(store.path_for("work-2_b"), PathBuf::from("/data/work-2_b.json"));
    }

    #[test]
    fn test_failed_write_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        // a non-empty directory in the way makes the final rename fail
        let target = store.path_for("blocked");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("occupant"), "x").unwrap();

        assert!(matches!(store.set("blocked", "{}"), Err(StoreError::Io { .. })));
        assert!(!FileStore::tmp_path(&target).exists());
    }

    #[test]
    fn test_keys_are_isolated() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        store.set("a", "first").unwrap();
        store.set("b", "second").unwrap();
        store.delete("a").unwrap();

        assert!(store.get("a").unwrap().is_none());
        assert_eq!(store.get("b").unwrap().as_deref(), Some("second"));
    }
}
