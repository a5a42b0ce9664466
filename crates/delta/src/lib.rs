#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Byte-level diff and patch engines for versioned delta backups.
//!
//! This crate turns two versions of a file into an ordered list of
//! [`Change`] records and applies such a list back onto a file:
//! - [`DiffEngine`] scans two byte streams and emits additions and removals
//! - [`PatchEngine`] applies a change list to a file, either sequentially or
//!   across a pool of batch workers
//! - [`ChangeSummary`] condenses a change list into counters for reporting
//!
//! # Design
//!
//! Every change position is expressed in the coordinate space of the original
//! file. The patch engines keep a running offset (added bytes minus removed
//! bytes so far) to map those positions onto the partially edited output, so
//! a change list never needs to be rewritten after the diff produces it.
//!
//! The concurrent patch path splits the list into fixed-size batches, patches
//! each batch's byte window on a worker thread and writes the results in
//! batch order into a temporary file that atomically replaces the target.
//!
//! # Examples
//!
//! ```
//! use delta::{DiffEngine, PatchEngine};
//!
//! let old = b"hello world";
//! let new = b"hello brave new world";
//! let changes = DiffEngine::new().diff_bytes(old, new);
//! let patched = PatchEngine::new().apply_to_vec(old, &changes).unwrap();
//! assert_eq!(patched, new);
//! ```

mod change;
mod diff;
pub mod patch;
mod stream;

pub use change::{Change, ChangeKind, ChangeSummary};
pub use diff::{DEFAULT_BUFFER_LEN, DiffEngine, diff};
pub use patch::{
    CancellationToken, DEFAULT_BATCH_SIZE, DEFAULT_CONCURRENT_THRESHOLD, DEFAULT_MAX_WORKERS,
    PatchEngine, PatchMode, PatchReport,
};
pub use stream::{ByteSource, ReaderSource, SliceSource};
