//! Applying change lists to files.
//!
//! # Overview
//!
//! [`PatchEngine`] applies an ordered change list, expressed in original
//! coordinates, to a file on disk or to an in-memory buffer. Two execution
//! paths exist:
//!
//! - **Sequential**: one thread loads the span of the file touched by the
//!   changes, splices it, and streams the untouched prefix and suffix
//!   around it.
//! - **Concurrent**: the list is cut into batches of
//!   [`DEFAULT_BATCH_SIZE`] changes, each batch window is patched on a
//!   worker thread, and the results are written back strictly in batch
//!   order.
//!
//! Both paths write into a temporary file next to the target and rename it
//! over the target only after every batch succeeded, so a failure or a
//! cancellation leaves the original file untouched.
//!
//! # Examples
//!
//! ```
//! use delta::{Change, PatchEngine};
//!
//! let patched = PatchEngine::new()
//!     .apply_to_vec(b"apply test", &[Change::add(5, b" add".to_vec())])
//!     .unwrap();
//! assert_eq!(patched, b"apply add test");
//! ```

mod concurrent;
mod plan;
mod sequential;

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use logging::trace_patch;

use crate::change::Change;

/// Number of changes handled by one concurrent worker job.
pub const DEFAULT_BATCH_SIZE: usize = 255;

/// Upper bound on concurrent worker threads.
pub const DEFAULT_MAX_WORKERS: usize = 20;

/// Change count at which [`PatchMode::Auto`] switches to the concurrent path.
pub const DEFAULT_CONCURRENT_THRESHOLD: usize = 4096;

/// Selects the execution path used by [`PatchEngine::apply_to_file`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PatchMode {
    /// Pick based on the number of changes.
    #[default]
    Auto,
    /// Single-threaded.
    Sequential,
    /// Batch workers with an ordered supervisor.
    Concurrent,
}

/// Shared flag that aborts an in-flight patch.
///
/// Clones observe the same flag. Once cancelled, running patch operations
/// return [`io::ErrorKind::Interrupted`] and discard their temporary output.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns `true` once [`Self::cancel`] has been called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub(crate) fn check(&self) -> io::Result<()> {
        if self.is_cancelled() {
            Err(io::Error::new(io::ErrorKind::Interrupted, "patch cancelled"))
        } else {
            Ok(())
        }
    }
}

/// Outcome of a file patch.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PatchReport {
    /// Path actually taken; never [`PatchMode::Auto`].
    pub mode: PatchMode,
    /// Number of changes applied.
    pub changes: usize,
    /// Number of batches written.
    pub batches: usize,
    /// File length before patching.
    pub original_len: u64,
    /// File length after patching.
    pub patched_len: u64,
}

/// Applies change lists sequentially or with a pool of batch workers.
#[derive(Clone, Debug)]
pub struct PatchEngine {
    batch_size: usize,
    max_workers: usize,
    concurrent_threshold: usize,
    mode: PatchMode,
    cancel: CancellationToken,
}

impl Default for PatchEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PatchEngine {
    /// Creates an engine with the default batch size, worker cap and threshold.
    #[must_use]
    pub fn new() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_workers: DEFAULT_MAX_WORKERS,
            concurrent_threshold: DEFAULT_CONCURRENT_THRESHOLD,
            mode: PatchMode::Auto,
            cancel: CancellationToken::new(),
        }
    }

    /// Sets how many changes each concurrent job handles. Zero is treated as one.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Caps the number of concurrent worker threads. Zero is treated as one.
    #[must_use]
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Sets the change count at which automatic mode goes concurrent.
    #[must_use]
    pub fn with_concurrent_threshold(mut self, threshold: usize) -> Self {
        self.concurrent_threshold = threshold;
        self
    }

    /// Attaches a cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Forces the sequential path.
    #[must_use]
    pub fn sequential(mut self) -> Self {
        self.mode = PatchMode::Sequential;
        self
    }

    /// Forces the concurrent path.
    #[must_use]
    pub fn concurrent(mut self) -> Self {
        self.mode = PatchMode::Concurrent;
        self
    }

    /// Returns the configured batch size.
    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Returns the worker cap.
    #[must_use]
    pub const fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Returns the configured mode.
    #[must_use]
    pub const fn mode(&self) -> PatchMode {
        self.mode
    }

    /// Returns the cancellation token observed by this engine.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Resolves [`PatchMode::Auto`] for a list of `change_count` entries.
    #[must_use]
    pub fn resolve_mode(&self, change_count: usize) -> PatchMode {
        match self.mode {
            PatchMode::Auto if change_count >= self.concurrent_threshold => PatchMode::Concurrent,
            PatchMode::Auto => PatchMode::Sequential,
            forced => forced,
        }
    }

    /// Applies `changes` to `original` and returns the patched bytes.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::InvalidInput`] when the list is unsorted,
    /// overlapping, or reaches past the end of `original`.
    pub fn apply_to_vec(&self, original: &[u8], changes: &[Change]) -> io::Result<Vec<u8>> {
        self.cancel.check()?;
        match plan::validate(changes, original.len() as u64)? {
            Some(_) => plan::splice_window(original, 0, changes),
            None => Ok(original.to_vec()),
        }
    }

    /// Applies `changes` to the file at `path`, replacing it atomically.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::InvalidInput`] for an invalid change list,
    /// [`io::ErrorKind::Interrupted`] after cancellation, and any I/O error
    /// raised while reading the target or writing its replacement. The target
    /// is left unmodified in every error case.
    pub fn apply_to_file(&self, path: &Path, changes: &[Change]) -> io::Result<PatchReport> {
        self.cancel.check()?;
        let original_len = fs::metadata(path)?.len();
        let Some(span) = plan::validate(changes, original_len)? else {
            return Ok(PatchReport {
                mode: self.resolve_mode(0),
                changes: 0,
                batches: 0,
                original_len,
                patched_len: original_len,
            });
        };

        let mode = self.resolve_mode(changes.len());
        trace_patch!(
            path = %path.display(),
            changes = changes.len(),
            ?mode,
            "applying change list"
        );
        match mode {
            PatchMode::Concurrent => concurrent::apply(
                path,
                changes,
                span,
                original_len,
                self.batch_size,
                self.max_workers,
                &self.cancel,
            ),
            PatchMode::Sequential | PatchMode::Auto => {
                sequential::apply(path, changes, span, original_len, &self.cancel)
            }
        }
    }
}
