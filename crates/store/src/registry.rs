//! Tracked-file registry.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::fsutil::{load_json, save_json};

/// One registered file.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TrackedFile {
    /// Backup index.
    pub index: u32,
    /// Canonical path of the live file.
    pub path: PathBuf,
}

/// Key-value store mapping backup indices to tracked paths.
pub trait TrackedRegistry: Send + Sync {
    /// Returns the path registered under `index`.
    fn get(&self, index: u32) -> StoreResult<Option<PathBuf>>;

    /// Registers `path` under the next free index and returns that index.
    fn append(&self, path: &Path) -> StoreResult<u32>;

    /// Lists every registered file in index order.
    fn list(&self) -> StoreResult<Vec<TrackedFile>>;
}

/// [`TrackedRegistry`] persisted as a JSON array.
#[derive(Debug)]
pub struct JsonRegistry {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonRegistry {
    /// Opens the registry stored at `path`; the file is created on first append.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TrackedRegistry for JsonRegistry {
    fn get(&self, index: u32) -> StoreResult<Option<PathBuf>> {
        Ok(self
            .list()?
            .into_iter()
            .find(|file| file.index == index)
            .map(|file| file.path))
    }

    fn append(&self, path: &Path) -> StoreResult<u32> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut files = self.list()?;
        let index = files.iter().map(|file| file.index + 1).max().unwrap_or(0);
        files.push(TrackedFile {
            index,
            path: path.to_path_buf(),
        });
        save_json(&self.path, &files)?;
        Ok(index)
    }

    fn list(&self) -> StoreResult<Vec<TrackedFile>> {
        let mut files: Vec<TrackedFile> = load_json(&self.path)?;
        files.sort_by_key(|file| file.index);
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_support::Scratch;

    #[test]
    fn indices_start_at_zero_and_increase() {
        let scratch = Scratch::new();
        let registry = JsonRegistry::new(scratch.join("tracked.json"));
        assert!(registry.list().unwrap().is_empty());
        assert_eq!(registry.append(Path::new("/a")).unwrap(), 0);
        assert_eq!(registry.append(Path::new("/b")).unwrap(), 1);
        assert_eq!(registry.get(1).unwrap(), Some(PathBuf::from("/b")));
        assert_eq!(registry.get(7).unwrap(), None);
    }

    #[test]
    fn survives_reopen() {
        let scratch = Scratch::new();
        JsonRegistry::new(scratch.join("tracked.json"))
            .append(Path::new("/data/file.txt"))
            .unwrap();
        let reopened = JsonRegistry::new(scratch.join("tracked.json"));
        assert_eq!(
            reopened.list().unwrap(),
            vec![TrackedFile {
                index: 0,
                path: PathBuf::from("/data/file.txt"),
            }]
        );
    }

    #[test]
    fn next_index_follows_the_largest() {
        let scratch = Scratch::new();
        let path = scratch.write(
            "tracked.json",
            br#"[{"index": 5, "path": "/x"}, {"index": 2, "path": "/y"}]"#,
        );
        let registry = JsonRegistry::new(path);
        assert_eq!(registry.list().unwrap()[0].index, 2);
        assert_eq!(registry.append(Path::new("/z")).unwrap(), 6);
    }
}
