//! The version store: head snapshots, delta chains and restore.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use checksums::{digest_file, to_hex, strong::Sha256};
use container::DeltaContainer;
use delta::{ChangeSummary, DiffEngine};
use logging::{trace_store, warn_store};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::fsutil::{sibling_temp, stage_copy, write_atomic};
use crate::metadata::{JsonMetadata, MetadataStore};
use crate::registry::{JsonRegistry, TrackedFile, TrackedRegistry};
use crate::timestamp::Timestamp;

const DELTA_SUFFIX: &str = ".delta";

/// One entry of a backup's version chain.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VersionInfo {
    /// Version identifier.
    pub timestamp: Timestamp,
    /// Hex SHA-256 of the file content at this version.
    pub checksum: Option<String>,
    /// Optional user message.
    pub message: Option<String>,
    /// Whether the live file is expected to match this version.
    pub active: bool,
    /// Size of the stored container in bytes.
    pub stored_len: u64,
}

/// Outcome of [`VersionStore::create_version`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CreatedVersion {
    /// New version identifier.
    pub timestamp: Timestamp,
    /// Counters for the recorded change list.
    pub summary: ChangeSummary,
}

/// Versioned delta backups for a set of tracked files.
///
/// Each tracked file owns a head snapshot (its content as of the newest
/// version), an append-only chain of delta containers, a checksum and a
/// message map keyed by timestamp, and an active pointer naming the version
/// the live file currently matches.
///
/// Mutating operations on the same backup index are serialised through a
/// per-index lock; different indices proceed independently.
#[derive(Debug)]
pub struct VersionStore<R = JsonRegistry> {
    config: StoreConfig,
    registry: R,
    diff: DiffEngine,
    locks: Mutex<HashMap<u32, Arc<Mutex<()>>>>,
}

impl VersionStore<JsonRegistry> {
    /// Opens the store under `config.root()`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the root cannot be created.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        let registry = JsonRegistry::new(config.registry_path());
        Self::with_registry(config, registry)
    }
}

impl<R: TrackedRegistry> VersionStore<R> {
    /// Opens the store with a caller-provided registry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the root cannot be created.
    pub fn with_registry(config: StoreConfig, registry: R) -> StoreResult<Self> {
        fs::create_dir_all(config.root())?;
        Ok(Self {
            config,
            registry,
            diff: DiffEngine::new(),
            locks: Mutex::new(HashMap::new()),
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the registry.
    #[must_use]
    pub const fn registry(&self) -> &R {
        &self.registry
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    /// Starts tracking `path` and returns its backup index.
    ///
    /// The path is canonicalised, so the file must exist. The head snapshot
    /// starts empty, making the first version a full copy of the file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyTracked`] if the canonical path is
    /// already registered.
    pub fn track(&self, path: &Path) -> StoreResult<u32> {
        let canonical = fs::canonicalize(path)?;
        if let Some(existing) = self
            .registry
            .list()?
            .into_iter()
            .find(|file| file.path == canonical)
        {
            return Err(StoreError::AlreadyTracked {
                index: existing.index,
                path: canonical,
            });
        }

        let index = self.registry.append(&canonical)?;
        fs::create_dir_all(self.config.deltas_dir(index))?;
        write_atomic(&self.config.head_path(index), &[])?;
        trace_store!(index, path = %canonical.display(), "tracking file");
        Ok(index)
    }

    /// Lists every tracked file.
    ///
    /// # Errors
    ///
    /// Fails if the registry cannot be read.
    pub fn tracked(&self) -> StoreResult<Vec<TrackedFile>> {
        self.registry.list()
    }

    /// Returns the live path tracked under `index`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::BackupNotFound`] for an unknown index.
    pub fn tracked_path(&self, index: u32) -> StoreResult<PathBuf> {
        self.registry
            .get(index)?
            .ok_or(StoreError::BackupNotFound(index))
    }

    // ------------------------------------------------------------------
    // Chain inspection
    // ------------------------------------------------------------------

    /// Returns the chain of `index`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::BackupNotFound`] for an unknown index.
    pub fn chain(&self, index: u32) -> StoreResult<Vec<Timestamp>> {
        self.tracked_path(index)?;
        self.read_chain(index)
    }

    /// Returns the version the live file is expected to match.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::BackupNotFound`] for an unknown index.
    pub fn active(&self, index: u32) -> StoreResult<Option<Timestamp>> {
        self.tracked_path(index)?;
        self.read_active(index)
    }

    /// Lists the versions of `index`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::BackupNotFound`] for an unknown index.
    pub fn versions(&self, index: u32) -> StoreResult<Vec<VersionInfo>> {
        let chain = self.chain(index)?;
        let active = self.read_active(index)?;
        let metadata = self.metadata(index);
        let mut checksums = metadata.checksums()?;
        let mut messages = metadata.messages()?;
        chain
            .into_iter()
            .map(|timestamp| {
                let stored_len = fs::metadata(self.config.delta_path(index, timestamp))?.len();
                Ok(VersionInfo {
                    timestamp,
                    checksum: checksums.remove(&timestamp),
                    message: messages.remove(&timestamp),
                    active: active == Some(timestamp),
                    stored_len,
                })
            })
            .collect()
    }

    /// Returns `true` when the live file no longer matches the active version.
    ///
    /// A backup without versions has unsaved changes as soon as the live file
    /// is non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::BackupNotFound`] for an unknown index.
    pub fn has_unsaved_changes(&self, index: u32) -> StoreResult<bool> {
        let live = self.tracked_path(index)?;
        self.live_diverges(index, &live)
    }

    // ------------------------------------------------------------------
    // Create and restore
    // ------------------------------------------------------------------

    /// Records the current content of the tracked file as a new version.
    ///
    /// The live file is first copied aside so the diff, the checksum and the
    /// new head snapshot all describe the same bytes even if the file keeps
    /// changing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoChanges`] when the file matches its head
    /// snapshot; nothing is written in that case. Any other failure removes
    /// the partially recorded version, leaving the chain as it was.
    pub fn create_version(&self, index: u32, message: Option<&str>) -> StoreResult<CreatedVersion> {
        let lock = self.lock_for(index);
        let _guard = acquire(&lock);

        let live = self.tracked_path(index)?;
        let head = self.config.head_path(index);
        fs::create_dir_all(self.config.deltas_dir(index))?;
        if !head.exists() {
            write_atomic(&head, &[])?;
        }

        let snapshot = stage_copy(&live, &head)?;
        let changes = self.diff.diff_files(&head, &snapshot)?;
        if changes.is_empty() {
            return Err(StoreError::NoChanges { index });
        }

        let chain = self.read_chain(index)?;
        let previous = self.read_active(index)?;
        let timestamp = Timestamp::next_after(chain.last().copied());
        let checksum = to_hex(&digest_file(&snapshot)?);
        let container = DeltaContainer::new(changes);
        let summary = container.summary();
        let delta_path = self.config.delta_path(index, timestamp);
        container.write_file(&delta_path, self.config.compression())?;

        // The head snapshot moves last; until then every step can be undone.
        let metadata = self.metadata(index);
        let committed = metadata
            .set_checksum(timestamp, &checksum)
            .and_then(|()| match message {
                Some(message) => metadata.set_message(timestamp, message),
                None => Ok(()),
            })
            .and_then(|()| self.write_active(index, timestamp))
            .and_then(|()| snapshot.persist(&head).map_err(|err| err.error.into()));
        if let Err(error) = committed {
            self.discard_version(index, timestamp, previous, &metadata);
            return Err(error);
        }

        trace_store!(
            index,
            %timestamp,
            changes = summary.total(),
            added_bytes = summary.added_bytes,
            removed_bytes = summary.removed_bytes,
            "version created"
        );
        Ok(CreatedVersion { timestamp, summary })
    }

    /// Rewrites the tracked file with its content at `timestamp`.
    ///
    /// Unless `force` is set, the live file must still match the active
    /// version. The content is rebuilt by replaying the chain from the oldest
    /// version onto an empty scratch file beside the live file, which then
    /// atomically replaces it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TimestampNotFound`] for an unknown version and
    /// [`StoreError::UnsavedChanges`] when unforced and the live file has
    /// diverged. The live file is untouched on every error.
    pub fn restore_version(&self, index: u32, timestamp: Timestamp, force: bool) -> StoreResult<()> {
        let lock = self.lock_for(index);
        let _guard = acquire(&lock);

        let live = self.tracked_path(index)?;
        let prefix = self.chain_prefix(index, timestamp)?;
        if !force && self.live_diverges(index, &live)? {
            return Err(StoreError::UnsavedChanges { index, path: live });
        }

        let scratch = sibling_temp(&live)?.into_temp_path();
        let engine = self.config.patch_engine();
        for link in &prefix {
            let container = DeltaContainer::read_file(&self.config.delta_path(index, *link))?;
            engine.apply_to_file(&scratch, container.changes())?;
        }
        if let Ok(existing) = fs::metadata(&live) {
            fs::set_permissions(&scratch, existing.permissions())?;
        }
        scratch.persist(&live).map_err(|err| err.error)?;
        self.write_active(index, timestamp)?;

        trace_store!(index, %timestamp, replayed = prefix.len(), "version restored");
        Ok(())
    }

    /// Replaces the message of an existing version.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TimestampNotFound`] for an unknown version.
    pub fn set_message(&self, index: u32, timestamp: Timestamp, message: &str) -> StoreResult<()> {
        let lock = self.lock_for(index);
        let _guard = acquire(&lock);
        self.chain_prefix(index, timestamp)?;
        self.metadata(index).set_message(timestamp, message)
    }

    // ------------------------------------------------------------------
    // Verification
    // ------------------------------------------------------------------

    /// Rebuilds the content of version `timestamp` in memory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TimestampNotFound`] for an unknown version and
    /// [`StoreError::Container`] or [`StoreError::Io`] if a link cannot be
    /// decoded or applied.
    pub fn reconstruct(&self, index: u32, timestamp: Timestamp) -> StoreResult<Vec<u8>> {
        let prefix = self.chain_prefix(index, timestamp)?;
        let engine = self.config.patch_engine();
        prefix.iter().try_fold(Vec::new(), |content, link| {
            let container = DeltaContainer::read_file(&self.config.delta_path(index, *link))?;
            Ok(engine.apply_to_vec(&content, container.changes())?)
        })
    }

    /// Checks that replaying the chain up to `timestamp` reproduces the
    /// recorded checksum.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`Self::reconstruct`].
    pub fn verify(&self, index: u32, timestamp: Timestamp) -> StoreResult<bool> {
        let content = self.reconstruct(index, timestamp)?;
        let actual = to_hex(&Sha256::digest(&content));
        let recorded = self.metadata(index).get_checksum(timestamp)?;
        let matches = recorded.as_deref() == Some(actual.as_str());
        if !matches {
            warn_store!(index, %timestamp, ?recorded, %actual, "chain replay does not match recorded checksum");
        }
        Ok(matches)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn metadata(&self, index: u32) -> JsonMetadata {
        JsonMetadata::new(
            self.config.checksums_path(index),
            self.config.messages_path(index),
        )
    }

    fn lock_for(&self, index: u32) -> Arc<Mutex<()>> {
        let mut locks = acquire(&self.locks);
        Arc::clone(locks.entry(index).or_default())
    }

    fn read_chain(&self, index: u32) -> StoreResult<Vec<Timestamp>> {
        let entries = match fs::read_dir(self.config.deltas_dir(index)) {
            Ok(entries) => entries,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(error.into()),
        };
        let mut chain = Vec::new();
        for entry in entries {
            let name = entry?.file_name();
            // Temporary files from interrupted writes carry no timestamp.
            if let Some(timestamp) = name
                .to_str()
                .and_then(|name| name.strip_suffix(DELTA_SUFFIX))
                .and_then(|stem| stem.parse().ok())
            {
                chain.push(timestamp);
            }
        }
        chain.sort_unstable();
        Ok(chain)
    }

    /// Returns the chain from the oldest link through `timestamp`.
    fn chain_prefix(&self, index: u32, timestamp: Timestamp) -> StoreResult<Vec<Timestamp>> {
        let mut chain = self.chain(index)?;
        let position = chain
            .iter()
            .position(|link| *link == timestamp)
            .ok_or(StoreError::TimestampNotFound { index, timestamp })?;
        chain.truncate(position + 1);
        Ok(chain)
    }

    fn read_active(&self, index: u32) -> StoreResult<Option<Timestamp>> {
        let path = self.config.active_path(index);
        match fs::read_to_string(&path) {
            Ok(text) => text.parse().map(Some).map_err(|_| {
                StoreError::Io(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("{} does not hold a timestamp", path.display()),
                ))
            }),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    /// Undoes a partially recorded version so the chain stays replayable.
    fn discard_version(
        &self,
        index: u32,
        timestamp: Timestamp,
        previous: Option<Timestamp>,
        metadata: &JsonMetadata,
    ) {
        if let Err(error) = fs::remove_file(self.config.delta_path(index, timestamp)) {
            warn_store!(index, %timestamp, %error, "could not remove abandoned delta");
        }
        if let Err(error) = metadata.forget(timestamp) {
            warn_store!(index, %timestamp, %error, "could not clear abandoned metadata");
        }
        let restored = match previous {
            Some(active) => self.write_active(index, active),
            None => match fs::remove_file(self.config.active_path(index)) {
                Err(error) if error.kind() != io::ErrorKind::NotFound => Err(error.into()),
                _ => Ok(()),
            },
        };
        if let Err(error) = restored {
            warn_store!(index, %timestamp, %error, "could not reset active version");
        }
    }

    fn write_active(&self, index: u32, timestamp: Timestamp) -> StoreResult<()> {
        write_atomic(
            &self.config.active_path(index),
            format!("{timestamp}\n").as_bytes(),
        )?;
        Ok(())
    }

    /// A missing live file never diverges: restoring it loses nothing.
    fn live_diverges(&self, index: u32, live: &Path) -> StoreResult<bool> {
        let current = match digest_file(live) {
            Ok(digest) => to_hex(&digest),
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(error) => return Err(error.into()),
        };
        let recorded = match self.read_active(index)? {
            Some(active) => self.metadata(index).get_checksum(active)?,
            None => Some(to_hex(&Sha256::digest(&[]))),
        };
        Ok(recorded.as_deref() != Some(current.as_str()))
    }
}

fn acquire<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
