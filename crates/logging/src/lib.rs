#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` owns the diagnostic plumbing shared by every crate in the
//! workspace. Library code emits events through the subsystem macros
//! ([`trace_diff!`], [`trace_patch!`], [`trace_container!`],
//! [`trace_store!`]) so each event carries a stable `backtrack::*` target,
//! and binaries call [`init_tracing`] once to route those events to stderr.
//!
//! # Design
//!
//! Verbosity follows the familiar `-v` counting convention. A
//! [`VerbosityConfig`] translates the count into a `tracing` level that is
//! applied to the `backtrack` target prefix; an explicit `RUST_LOG` always
//! wins so developers can narrow output to a single subsystem.
//!
//! # Examples
//!
//! ```
//! use logging::VerbosityConfig;
//!
//! let config = VerbosityConfig::from_verbose_level(2);
//! assert_eq!(config.directive(), "warn,backtrack=debug");
//! ```

mod config;
mod tracing_bridge;
mod tracing_macros;

pub use config::VerbosityConfig;
pub use tracing_bridge::{TARGET_PREFIX, init_tracing};
