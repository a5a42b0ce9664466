//! Explicit configuration for a [`VersionStore`](crate::VersionStore).

use std::path::{Path, PathBuf};

use container::Compression;
use delta::{
    DEFAULT_BATCH_SIZE, DEFAULT_CONCURRENT_THRESHOLD, DEFAULT_MAX_WORKERS, PatchEngine,
};

use crate::timestamp::Timestamp;

/// File name of the tracked-file registry under the root.
pub const REGISTRY_FILE: &str = "tracked.json";

/// Store location and tuning knobs.
///
/// Every on-disk path the store touches is derived from `root`:
///
/// ```text
/// <root>/tracked.json
/// <root>/<index>/head
/// <root>/<index>/active
/// <root>/<index>/checksums.json
/// <root>/<index>/messages.json
/// <root>/<index>/deltas/<timestamp>.delta
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoreConfig {
    root: PathBuf,
    batch_size: usize,
    max_workers: usize,
    concurrent_threshold: usize,
    compression: Compression,
}

impl StoreConfig {
    /// Creates a configuration rooted at `root` with default tuning.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_workers: DEFAULT_MAX_WORKERS,
            concurrent_threshold: DEFAULT_CONCURRENT_THRESHOLD,
            compression: Compression::default(),
        }
    }

    /// Sets the number of changes per concurrent patch batch.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Caps concurrent patch workers.
    #[must_use]
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Sets the change count at which restores patch concurrently.
    #[must_use]
    pub fn with_concurrent_threshold(mut self, threshold: usize) -> Self {
        self.concurrent_threshold = threshold;
        self
    }

    /// Sets the compression used for new containers.
    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Returns the backup root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the batch size.
    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Returns the worker cap.
    #[must_use]
    pub const fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Returns the concurrent patch threshold.
    #[must_use]
    pub const fn concurrent_threshold(&self) -> usize {
        self.concurrent_threshold
    }

    /// Returns the compression for new containers.
    #[must_use]
    pub const fn compression(&self) -> Compression {
        self.compression
    }

    /// Path of the tracked-file registry.
    #[must_use]
    pub fn registry_path(&self) -> PathBuf {
        self.root.join(REGISTRY_FILE)
    }

    /// Directory holding everything stored for backup `index`.
    #[must_use]
    pub fn backup_dir(&self, index: u32) -> PathBuf {
        self.root.join(index.to_string())
    }

    /// Head snapshot of backup `index`.
    #[must_use]
    pub fn head_path(&self, index: u32) -> PathBuf {
        self.backup_dir(index).join("head")
    }

    /// Active-pointer file of backup `index`.
    #[must_use]
    pub fn active_path(&self, index: u32) -> PathBuf {
        self.backup_dir(index).join("active")
    }

    /// Checksum map of backup `index`.
    #[must_use]
    pub fn checksums_path(&self, index: u32) -> PathBuf {
        self.backup_dir(index).join("checksums.json")
    }

    /// Message map of backup `index`.
    #[must_use]
    pub fn messages_path(&self, index: u32) -> PathBuf {
        self.backup_dir(index).join("messages.json")
    }

    /// Directory holding the delta containers of backup `index`.
    #[must_use]
    pub fn deltas_dir(&self, index: u32) -> PathBuf {
        self.backup_dir(index).join("deltas")
    }

    /// Container file for version `timestamp` of backup `index`.
    #[must_use]
    pub fn delta_path(&self, index: u32, timestamp: Timestamp) -> PathBuf {
        self.deltas_dir(index).join(format!("{timestamp}.delta"))
    }

    /// Builds a patch engine honouring the tuning knobs.
    #[must_use]
    pub fn patch_engine(&self) -> PatchEngine {
        PatchEngine::new()
            .with_batch_size(self.batch_size)
            .with_max_workers(self.max_workers)
            .with_concurrent_threshold(self.concurrent_threshold)
    }
}
