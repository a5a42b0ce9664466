#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Delta container codec.
//!
//! # Overview
//!
//! A [`DeltaContainer`] is the on-disk form of one link in a version chain:
//! the ordered change list produced by the diff engine. It is stored as a
//! compressed tar archive with exactly two entries:
//!
//! - `instructions`: UTF-8 text with one `<kind> <position> <size>\n` line
//!   per change, where kind `0` is an addition and `1` a removal;
//! - `changes`: every change's content concatenated in the same order with
//!   no separators.
//!
//! Decoding walks the instructions and slices `size` bytes off the payload
//! for each one, so the payload must be consumed exactly.
//!
//! # Design
//!
//! Archives are written with deterministic headers (zero mtime, uid and gid)
//! so identical change lists always produce identical bytes. The reader
//! detects zstd or gzip from the magic bytes, so containers written with
//! either [`Compression`] stay readable after the configured default
//! changes.
//!
//! # Examples
//!
//! ```
//! use container::{Compression, DeltaContainer};
//! use delta::Change;
//!
//! let container = DeltaContainer::new(vec![Change::add(5, b" add".to_vec())]);
//! let bytes = container.to_bytes(Compression::Zstd).unwrap();
//! let decoded = DeltaContainer::from_bytes(&bytes).unwrap();
//! assert_eq!(decoded, container);
//! ```

mod codec;
mod compression;
mod error;
mod instructions;

use std::io::{Read, Write};
use std::path::Path;

use delta::{Change, ChangeSummary};

pub use codec::{CHANGES_ENTRY, INSTRUCTIONS_ENTRY};
pub use compression::{Compression, ParseCompressionError};
pub use error::{ContainerError, ContainerResult};

/// Serialisable change list for one version.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DeltaContainer {
    changes: Vec<Change>,
}

impl DeltaContainer {
    /// Wraps an ordered change list.
    #[must_use]
    pub const fn new(changes: Vec<Change>) -> Self {
        Self { changes }
    }

    /// Returns the changes in creation order.
    #[must_use]
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Consumes the container and returns its changes.
    #[must_use]
    pub fn into_changes(self) -> Vec<Change> {
        self.changes
    }

    /// Returns `true` when there are no changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Returns counters describing the change list.
    #[must_use]
    pub fn summary(&self) -> ChangeSummary {
        ChangeSummary::of(&self.changes)
    }

    /// Renders the `instructions` entry.
    #[must_use]
    pub fn instruction_text(&self) -> String {
        instructions::render(&self.changes)
    }

    /// Encodes the container into `sink` and returns the sink.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::Io`] if compression or writing fails.
    pub fn write_to<W: Write>(&self, sink: W, compression: Compression) -> ContainerResult<W> {
        codec::write(self, sink, compression)
    }

    /// Encodes the container into a byte vector.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::Io`] if compression fails.
    pub fn to_bytes(&self, compression: Compression) -> ContainerResult<Vec<u8>> {
        self.write_to(Vec::new(), compression)
    }

    /// Atomically writes the container to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::Io`] on any filesystem failure; `path` is
    /// either fully written or left as it was.
    pub fn write_file(&self, path: &Path, compression: Compression) -> ContainerResult<()> {
        codec::write_file(self, path, compression)
    }

    /// Decodes a container from `source`.
    ///
    /// # Errors
    ///
    /// Returns a format error for unknown compression, missing or extra
    /// entries, malformed instruction lines, or a payload whose length does
    /// not match the instructions.
    pub fn read_from<R: Read>(source: R) -> ContainerResult<Self> {
        codec::read(source)
    }

    /// Decodes a container from a byte slice.
    ///
    /// # Errors
    ///
    /// See [`Self::read_from`].
    pub fn from_bytes(bytes: &[u8]) -> ContainerResult<Self> {
        Self::read_from(bytes)
    }

    /// Decodes the container stored at `path`.
    ///
    /// # Errors
    ///
    /// See [`Self::read_from`]; also fails if `path` cannot be opened.
    pub fn read_file(path: &Path) -> ContainerResult<Self> {
        codec::read_file(path)
    }
}

impl From<Vec<Change>> for DeltaContainer {
    fn from(changes: Vec<Change>) -> Self {
        Self::new(changes)
    }
}
