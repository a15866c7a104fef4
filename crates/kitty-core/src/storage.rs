//! Keyed JSON documents in a data directory, one `<key>.json` file per key.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::Result;

#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Read the document under `key`. A missing file is `None`; an unreadable
    /// or malformed one is logged and also treated as absent.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read stored document");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring malformed stored document");
                None
            }
        }
    }

    /// Write `value` under `key` via a temp file and rename, so readers never
    /// see a half-written document.
    pub fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(value)?;
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, self.path(key))?;
        Ok(())
    }

    /// Delete the document under `key`. Deleting a missing key is a no-op.
    pub fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("nested"));

        store.write("numbers", &vec![1, 2, 3]).unwrap();
        let back: Option<Vec<i32>> = store.read("numbers");
        assert_eq!(back, Some(vec![1, 2, 3]));
        assert!(!dir.path().join("nested/.numbers.json.tmp").exists());
    }

    #[test]
    fn test_missing_and_malformed_read_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        assert_eq!(store.read::<Vec<i32>>("absent"), None);

        fs::write(store.path("broken"), "{not json").unwrap();
        assert_eq!(store.read::<Vec<i32>>("broken"), None);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        store.write("k", "v").unwrap();
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert!(!store.path("k").exists());
    }
}
