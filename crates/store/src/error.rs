//! Error taxonomy for version store operations.

use std::io;
use std::path::PathBuf;

use container::ContainerError;
use thiserror::Error;

use crate::timestamp::Timestamp;

/// Result type for version store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures raised by the [`VersionStore`](crate::VersionStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The tracked file matches its head snapshot; nothing was recorded.
    #[error("no changes since the last version of backup {index}")]
    NoChanges {
        /// Backup index.
        index: u32,
    },
    /// The live file differs from the active version and `force` was not set.
    #[error(
        "{} has changes that are not saved in any version of backup {index}; restore with force to discard them",
        path.display()
    )]
    UnsavedChanges {
        /// Backup index.
        index: u32,
        /// Live file path.
        path: PathBuf,
    },
    /// No version with this timestamp exists for the backup.
    #[error("backup {index} has no version with timestamp {timestamp}")]
    TimestampNotFound {
        /// Backup index.
        index: u32,
        /// Requested timestamp.
        timestamp: Timestamp,
    },
    /// No tracked file has this backup index.
    #[error("no tracked file with backup index {0}")]
    BackupNotFound(u32),
    /// The path is already registered.
    #[error("{} is already tracked as backup {index}", path.display())]
    AlreadyTracked {
        /// Existing backup index.
        index: u32,
        /// Canonical path.
        path: PathBuf,
    },
    /// Filesystem failure.
    #[error("backup store I/O failed: {0}")]
    Io(#[from] io::Error),
    /// A delta container could not be read or written.
    #[error("delta container: {0}")]
    Container(#[from] ContainerError),
    /// A JSON registry or metadata file could not be decoded or encoded.
    #[error("{}: {source}", path.display())]
    Registry {
        /// File being read or written.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Returns `true` for the recoverable conditions a caller is expected to
    /// handle, as opposed to I/O or format failures.
    #[must_use]
    pub const fn is_condition(&self) -> bool {
        matches!(
            self,
            Self::NoChanges { .. }
                | Self::UnsavedChanges { .. }
                | Self::TimestampNotFound { .. }
                | Self::BackupNotFound(_)
                | Self::AlreadyTracked { .. }
        )
    }
}
