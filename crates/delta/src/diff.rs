//! Resynchronising byte diff.
//!
//! # Overview
//!
//! [`DiffEngine`] walks the old and new inputs in lock step. While the bytes
//! agree both cursors simply advance. On the first disagreement, at old
//! offset `i` and new offset `j`, the scanner looks ahead on both sides at
//! once:
//!
//! - the *removal* hypothesis holds once some later old byte equals `new[j]`,
//!   meaning `old[i..]` up to that byte was deleted;
//! - the *addition* hypothesis holds once some later new byte equals `old[i]`,
//!   meaning `new[j..]` up to that byte was inserted.
//!
//! Whichever hypothesis resolves first wins. When both resolve on the same
//! step the region is a substitution and is emitted as an addition followed
//! by a removal at the same original position. If an input ends before any
//! hypothesis resolves, the accumulated bytes are emitted anyway and the
//! change stays *open*, which lets the next change extend it in place when
//! the two are contiguous and of the same kind.
//!
//! # Design
//!
//! The scanner is generic over [`ByteSource`] so it runs unchanged over
//! buffered files and in-memory slices. Only two cursors are ever live and
//! neither is rewound further back than the point where the current
//! mismatch began.

use std::fs::File;
use std::io::{self, Read, Seek};
use std::path::Path;

use logging::trace_diff;

use crate::change::{Change, ChangeKind, ChangeSummary};
use crate::stream::{ByteSource, ReaderSource, SliceSource};

/// Default read buffer used for each input stream.
pub const DEFAULT_BUFFER_LEN: usize = 64 * 1024;

/// Computes change lists between two versions of a byte stream.
#[derive(Clone, Copy, Debug)]
pub struct DiffEngine {
    buffer_len: usize,
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffEngine {
    /// Creates an engine with [`DEFAULT_BUFFER_LEN`] read buffers.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer_len: DEFAULT_BUFFER_LEN,
        }
    }

    /// Overrides the per-stream read buffer length.
    #[must_use]
    pub const fn with_buffer_len(mut self, len: usize) -> Self {
        self.buffer_len = len;
        self
    }

    /// Returns the configured read buffer length.
    #[must_use]
    pub const fn buffer_len(&self) -> usize {
        self.buffer_len
    }

    /// Diffs two seekable readers from their current positions to the end.
    ///
    /// Positions in the result are relative to where `old` stood on entry.
    ///
    /// # Errors
    ///
    /// Propagates any read or seek failure from either input.
    pub fn diff<O, N>(&self, old: O, new: N) -> io::Result<Vec<Change>>
    where
        O: Read + Seek,
        N: Read + Seek,
    {
        let mut old = ReaderSource::with_capacity(self.buffer_len, old);
        let mut new = ReaderSource::with_capacity(self.buffer_len, new);
        let changes = scan(&mut old, &mut new)?;
        log_summary(&changes);
        Ok(changes)
    }

    /// Diffs two files on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be opened or read.
    pub fn diff_files(&self, old: &Path, new: &Path) -> io::Result<Vec<Change>> {
        self.diff(File::open(old)?, File::open(new)?)
    }

    /// Diffs two in-memory buffers.
    #[must_use]
    pub fn diff_bytes(&self, old: &[u8], new: &[u8]) -> Vec<Change> {
        let Ok(changes) = scan(&mut SliceSource::new(old), &mut SliceSource::new(new));
        log_summary(&changes);
        changes
    }
}

/// Diffs two in-memory buffers with a default [`DiffEngine`].
#[must_use]
pub fn diff(old: &[u8], new: &[u8]) -> Vec<Change> {
    DiffEngine::new().diff_bytes(old, new)
}

fn log_summary(changes: &[Change]) {
    let summary = ChangeSummary::of(changes);
    trace_diff!(
        additions = summary.additions,
        removals = summary.removals,
        added_bytes = summary.added_bytes,
        removed_bytes = summary.removed_bytes,
        "diff complete"
    );
}

/// Whether a freshly emitted change may still absorb a contiguous successor.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Closure {
    /// Ended because an input ran out before resynchronising.
    Open,
    /// Ended on a resynchronisation point.
    Closed,
}

/// Accumulates emitted changes and applies the merge rule.
#[derive(Debug, Default)]
struct ChangeList {
    changes: Vec<Change>,
    last_open: bool,
}

impl ChangeList {
    fn push(&mut self, kind: ChangeKind, position: u64, content: Vec<u8>, closure: Closure) {
        let merged = match self.changes.last_mut() {
            // Additions at the same spot and back-to-back removals both
            // satisfy `original_end == position`.
            Some(last)
                if self.last_open && last.kind() == kind && last.original_end() == position =>
            {
                last.extend(&content);
                true
            }
            _ => false,
        };
        if !merged {
            self.changes.push(Change::new(kind, position, content));
        }
        self.last_open = closure == Closure::Open;
    }

    fn into_changes(self) -> Vec<Change> {
        self.changes
    }
}

fn scan<O, N, E>(old: &mut O, new: &mut N) -> Result<Vec<Change>, E>
where
    O: ByteSource<Error = E>,
    N: ByteSource<Error = E>,
{
    let mut list = ChangeList::default();
    loop {
        let old_pos = old.position();
        let new_pos = new.position();
        match (old.next_byte()?, new.next_byte()?) {
            (Some(a), Some(b)) if a == b => {}
            (Some(a), Some(b)) => resync(old, new, a, b, old_pos, new_pos, &mut list)?,
            (None, None) => break,
            (None, Some(b)) => {
                let mut rest = vec![b];
                new.read_remaining(&mut rest)?;
                list.push(ChangeKind::Add, old_pos, rest, Closure::Open);
                break;
            }
            (Some(a), None) => {
                let mut rest = vec![a];
                old.read_remaining(&mut rest)?;
                list.push(ChangeKind::Remove, old_pos, rest, Closure::Open);
                break;
            }
        }
    }
    Ok(list.into_changes())
}

/// Resolves one mismatch that began at `old_pos`/`new_pos`.
///
/// On return both cursors stand on the first pair of bytes that has not been
/// attributed to a change.
#[allow(clippy::too_many_arguments)]
fn resync<O, N, E>(
    old: &mut O,
    new: &mut N,
    old_byte: u8,
    new_byte: u8,
    old_pos: u64,
    new_pos: u64,
    list: &mut ChangeList,
) -> Result<(), E>
where
    O: ByteSource<Error = E>,
    N: ByteSource<Error = E>,
{
    let mut removed = vec![old_byte];
    let mut added = vec![new_byte];
    loop {
        let next_old = old.next_byte()?;
        let next_new = new.next_byte()?;
        let remove_resolved = next_old == Some(new_byte);
        let add_resolved = next_new == Some(old_byte);

        match (remove_resolved, add_resolved) {
            (true, true) => {
                removed.extend(next_old);
                added.extend(next_new);
                list.push(ChangeKind::Add, old_pos, added, Closure::Closed);
                list.push(ChangeKind::Remove, old_pos, removed, Closure::Closed);
                return Ok(());
            }
            (true, false) => {
                old.rewind_to(old_pos + removed.len() as u64)?;
                new.rewind_to(new_pos)?;
                list.push(ChangeKind::Remove, old_pos, removed, Closure::Closed);
                return Ok(());
            }
            (false, true) => {
                old.rewind_to(old_pos)?;
                new.rewind_to(new_pos + added.len() as u64)?;
                list.push(ChangeKind::Add, old_pos, added, Closure::Closed);
                return Ok(());
            }
            (false, false) => {}
        }

        match (next_old, next_new) {
            (Some(a), Some(b)) => {
                removed.push(a);
                added.push(b);
            }
            (None, None) => {
                list.push(ChangeKind::Add, old_pos, added, Closure::Open);
                list.push(ChangeKind::Remove, old_pos, removed, Closure::Open);
                return Ok(());
            }
            (Some(_), None) => {
                // The new side ran out: call it a removal, but hand the last
                // looked-at old byte back so the main loop can re-examine it.
                if removed.len() > 1 {
                    removed.pop();
                }
                old.rewind_to(old_pos + removed.len() as u64)?;
                new.rewind_to(new_pos)?;
                list.push(ChangeKind::Remove, old_pos, removed, Closure::Open);
                return Ok(());
            }
            (None, Some(_)) => {
                if added.len() > 1 {
                    added.pop();
                }
                old.rewind_to(old_pos)?;
                new.rewind_to(new_pos + added.len() as u64)?;
                list.push(ChangeKind::Add, old_pos, added, Closure::Open);
                return Ok(());
            }
        }
    }
}
