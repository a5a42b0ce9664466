//! Per-version checksum and message maps.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::StoreResult;
use crate::fsutil::{load_json, save_json};
use crate::timestamp::Timestamp;

/// Key-value metadata recorded for each version, keyed by timestamp.
pub trait MetadataStore {
    /// Returns the hex SHA-256 recorded for `timestamp`.
    fn get_checksum(&self, timestamp: Timestamp) -> StoreResult<Option<String>>;

    /// Records the hex SHA-256 for `timestamp`.
    fn set_checksum(&self, timestamp: Timestamp, checksum: &str) -> StoreResult<()>;

    /// Returns the message recorded for `timestamp`.
    fn get_message(&self, timestamp: Timestamp) -> StoreResult<Option<String>>;

    /// Records the message for `timestamp`, replacing any previous one.
    fn set_message(&self, timestamp: Timestamp, message: &str) -> StoreResult<()>;

    /// Drops the checksum and message of `timestamp`.
    ///
    /// Both maps are attempted even if the first one fails; the first error
    /// is returned.
    fn forget(&self, timestamp: Timestamp) -> StoreResult<()>;
}

type JsonMap = BTreeMap<String, String>;

/// [`MetadataStore`] backed by two JSON objects keyed by decimal timestamp.
#[derive(Clone, Debug)]
pub struct JsonMetadata {
    checksums: PathBuf,
    messages: PathBuf,
}

impl JsonMetadata {
    /// Uses the given checksum and message files.
    #[must_use]
    pub fn new(checksums: impl Into<PathBuf>, messages: impl Into<PathBuf>) -> Self {
        Self {
            checksums: checksums.into(),
            messages: messages.into(),
        }
    }

    /// Loads every recorded checksum.
    pub fn checksums(&self) -> StoreResult<BTreeMap<Timestamp, String>> {
        Self::load(&self.checksums)
    }

    /// Loads every recorded message.
    pub fn messages(&self) -> StoreResult<BTreeMap<Timestamp, String>> {
        Self::load(&self.messages)
    }

    fn load(path: &Path) -> StoreResult<BTreeMap<Timestamp, String>> {
        let raw: JsonMap = load_json(path)?;
        // Keys that are not timestamps cannot belong to a chain entry.
        Ok(raw
            .into_iter()
            .filter_map(|(key, value)| key.parse().ok().map(|ts| (ts, value)))
            .collect())
    }

    fn get(path: &Path, timestamp: Timestamp) -> StoreResult<Option<String>> {
        let mut raw: JsonMap = load_json(path)?;
        Ok(raw.remove(&timestamp.to_string()))
    }

    fn set(path: &Path, timestamp: Timestamp, value: &str) -> StoreResult<()> {
        let mut raw: JsonMap = load_json(path)?;
        raw.insert(timestamp.to_string(), value.to_owned());
        save_json(path, &raw)
    }

    fn unset(path: &Path, timestamp: Timestamp) -> StoreResult<()> {
        let mut raw: JsonMap = load_json(path)?;
        if raw.remove(&timestamp.to_string()).is_some() {
            save_json(path, &raw)?;
        }
        Ok(())
    }
}

impl MetadataStore for JsonMetadata {
    fn get_checksum(&self, timestamp: Timestamp) -> StoreResult<Option<String>> {
        Self::get(&self.checksums, timestamp)
    }

    fn set_checksum(&self, timestamp: Timestamp, checksum: &str) -> StoreResult<()> {
        Self::set(&self.checksums, timestamp, checksum)
    }

    fn get_message(&self, timestamp: Timestamp) -> StoreResult<Option<String>> {
        Self::get(&self.messages, timestamp)
    }

    fn set_message(&self, timestamp: Timestamp, message: &str) -> StoreResult<()> {
        Self::set(&self.messages, timestamp, message)
    }

    fn forget(&self, timestamp: Timestamp) -> StoreResult<()> {
        let checksums = Self::unset(&self.checksums, timestamp);
        let messages = Self::unset(&self.messages, timestamp);
        checksums.and(messages)
    }
}
