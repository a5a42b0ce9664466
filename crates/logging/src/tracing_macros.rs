//! Convenience macros for workspace-specific tracing.
//!
//! These macros provide ergonomic wrappers around standard tracing macros
//! with the appropriate target for each subsystem.

/// Emit a diff engine trace.
///
/// # Example
/// ```ignore
/// trace_diff!(changes = list.len(), "diff complete");
/// ```
#[macro_export]
macro_rules! trace_diff {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "backtrack::diff", $($arg)*);
    };
}

/// Emit a patch engine trace.
///
/// # Example
/// ```ignore
/// trace_patch!(batches = count, "concurrent patch started");
/// ```
#[macro_export]
macro_rules! trace_patch {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "backtrack::patch", $($arg)*);
    };
}

/// Emit a delta container trace.
///
/// # Example
/// ```ignore
/// trace_container!(path = %path.display(), "container written");
/// ```
#[macro_export]
macro_rules! trace_container {
    ($($arg:tt)*) => {
        ::tracing::trace!(target: "backtrack::container", $($arg)*);
    };
}

/// Emit a version store trace.
///
/// # Example
/// ```ignore
/// trace_store!(index, timestamp, "version created");
/// ```
#[macro_export]
macro_rules! trace_store {
    ($($arg:tt)*) => {
        ::tracing::info!(target: "backtrack::store", $($arg)*);
    };
}

/// Emit a version store warning.
///
/// # Example
/// ```ignore
/// warn_store!(index, "live file diverges from active version");
/// ```
#[macro_export]
macro_rules! warn_store {
    ($($arg:tt)*) => {
        ::tracing::warn!(target: "backtrack::store", $($arg)*);
    };
}
