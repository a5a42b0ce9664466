//! Atomic replacement helpers and JSON persistence.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::{NamedTempFile, TempPath};

use crate::error::{StoreError, StoreResult};

pub(crate) fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Creates an empty temporary file beside `path`.
pub(crate) fn sibling_temp(path: &Path) -> io::Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix(".bak-")
        .tempfile_in(parent_dir(path))
}

/// Replaces `path` with `bytes` via a sibling temporary file and a rename.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut temp = sibling_temp(path)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path)?;
    Ok(())
}

/// Copies `from` into a temporary file beside `beside` and returns its path.
pub(crate) fn stage_copy(from: &Path, beside: &Path) -> io::Result<TempPath> {
    let mut temp = sibling_temp(beside)?;
    io::copy(&mut File::open(from)?, temp.as_file_mut())?;
    temp.as_file().sync_all()?;
    Ok(temp.into_temp_path())
}

/// Loads a JSON document, returning the default when the file is absent.
pub(crate) fn load_json<T>(path: &Path) -> StoreResult<T>
where
    T: DeserializeOwned + Default,
{
    match fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Registry {
            path: path.to_path_buf(),
            source,
        }),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(T::default()),
        Err(error) => Err(error.into()),
    }
}

/// Atomically writes `value` as pretty-printed JSON.
pub(crate) fn save_json<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    let mut bytes = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Registry {
        path: path.to_path_buf(),
        source,
    })?;
    bytes.push(b'\n');
    write_atomic(path, &bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use test_support::Scratch;

    #[test]
    fn write_atomic_replaces_contents() {
        let scratch = Scratch::new();
        let path = scratch.write("file", b"old contents");
        write_atomic(&path, b"new").unwrap();
        assert_eq!(scratch.read("file"), b"new");
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 1);
    }

    #[test]
    fn json_round_trip_and_missing_default() {
        let scratch = Scratch::new();
        let path = scratch.join("map.json");
        let empty: BTreeMap<String, String> = load_json(&path).unwrap();
        assert!(empty.is_empty());

        let mut map = BTreeMap::new();
        map.insert("1".to_owned(), "first".to_owned());
        save_json(&path, &map).unwrap();
        let loaded: BTreeMap<String, String> = load_json(&path).unwrap();
        assert_eq!(loaded, map);
    }

    #[test]
    fn corrupt_json_is_a_registry_error() {
        let scratch = Scratch::new();
        let path = scratch.write("bad.json", b"{not json");
        let err = load_json::<BTreeMap<String, String>>(&path).unwrap_err();
        assert!(matches!(err, StoreError::Registry { .. }));
    }

    #[test]
    fn stage_copy_lands_beside_target() {
        let scratch = Scratch::new();
        let source = scratch.write("source", b"payload");
        let staged = stage_copy(&source, &scratch.join("target")).unwrap();
        assert_eq!(staged.parent(), Some(scratch.path()));
        assert_eq!(fs::read(&staged).unwrap(), b"payload");
    }
}
