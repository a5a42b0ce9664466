#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `checksums` provides the strong digests that fingerprint every recorded
//! file version. The version store records a SHA-256 digest for each backup
//! and compares it against the live file before a restore is allowed to
//! overwrite local edits.
//!
//! # Design
//!
//! Hashers implement [`strong::StrongDigest`], a small streaming trait that
//! mirrors the `digest` crate without exposing its generic-array types. The
//! [`file`] module layers buffered whole-file hashing and hex rendering on top
//! so callers never need to juggle read buffers.
//!
//! # Examples
//!
//! ```
//! use checksums::{strong::Sha256, to_hex};
//!
//! let digest = Sha256::digest(b"abc");
//! assert_eq!(
//!     to_hex(&digest),
//!     "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
//! );
//! ```

pub mod file;
pub mod strong;

pub use file::{digest_file, digest_reader, parse_hex, to_hex};
