#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `store` keeps versioned delta backups of individual files. Each tracked
//! file is identified by a small integer backup index and owns:
//!
//! - a **head** snapshot holding the file content as of its newest version;
//! - a **chain** of delta containers, one per version, ordered by
//!   [`Timestamp`];
//! - a checksum map and a message map keyed by timestamp;
//! - an **active** pointer naming the version the live file should match.
//!
//! [`VersionStore::create_version`] diffs the head against the live file,
//! stores the change list as a new chain link and advances the head.
//! [`VersionStore::restore_version`] replays the chain from its first link
//! up to the requested version onto an empty file and atomically swaps the
//! result in for the live file.
//!
//! # Design
//!
//! All paths derive from an explicit [`StoreConfig`]; there is no global
//! state. The registry and per-version metadata sit behind the
//! [`TrackedRegistry`] and [`MetadataStore`] traits with JSON
//! implementations. Every file the store replaces goes through a sibling
//! temporary file and a rename, so readers never observe partial writes.
//!
//! # Examples
//!
//! ```
//! use store::{StoreConfig, StoreError, VersionStore};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let file = dir.path().join("notes.txt");
//! std::fs::write(&file, b"first draft").unwrap();
//!
//! let store = VersionStore::open(StoreConfig::new(dir.path().join("backups"))).unwrap();
//! let index = store.track(&file).unwrap();
//! let first = store.create_version(index, Some("initial")).unwrap();
//! assert!(matches!(
//!     store.create_version(index, None),
//!     Err(StoreError::NoChanges { .. })
//! ));
//!
//! std::fs::write(&file, b"second draft").unwrap();
//! store.create_version(index, None).unwrap();
//! store.restore_version(index, first.timestamp, false).unwrap();
//! assert_eq!(std::fs::read(&file).unwrap(), b"first draft");
//! ```

mod config;
mod error;
mod fsutil;
mod metadata;
mod registry;
mod timestamp;
mod version_store;

pub use config::{REGISTRY_FILE, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use metadata::{JsonMetadata, MetadataStore};
pub use registry::{JsonRegistry, TrackedFile, TrackedRegistry};
pub use timestamp::Timestamp;
pub use version_store::{CreatedVersion, VersionInfo, VersionStore};
