#![deny(unsafe_code)]

//! Shared fixtures for tests across the workspace.
//!
//! Provides scratch directories, file helpers and a small deterministic
//! byte generator so tests can build large, reproducible inputs without
//! pulling a random number generator into every crate.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Scratch directory removed on drop.
#[derive(Debug)]
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    /// Creates a fresh directory under the system temp location.
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create scratch dir"),
        }
    }

    /// Returns the directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Returns `name` joined onto the directory.
    #[must_use]
    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Writes `contents` to `name` and returns the full path.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write scratch file");
        path
    }

    /// Reads `name` back.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be read.
    #[must_use]
    pub fn read(&self, name: &str) -> Vec<u8> {
        fs::read(self.join(name)).expect("read scratch file")
    }
}

impl Default for Scratch {
    fn default() -> Self {
        Self::new()
    }
}

/// Deterministic linear congruential byte generator.
#[derive(Clone, Debug)]
pub struct ByteGen {
    state: u64,
}

impl ByteGen {
    /// Creates a generator from `seed`.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: seed ^ 0x9E37_79B9_7F4A_7C15,
        }
    }

    /// Returns the next byte.
    pub fn next_byte(&mut self) -> u8 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.state >> 56) as u8
    }

    /// Returns the next value in `0..bound`. `bound` must be non-zero.
    pub fn below(&mut self, bound: usize) -> usize {
        let wide = (u64::from(self.next_byte()) << 8) | u64::from(self.next_byte());
        (wide as usize) % bound
    }

    /// Returns `len` bytes drawn from `alphabet`.
    pub fn text(&mut self, len: usize, alphabet: &[u8]) -> Vec<u8> {
        (0..len).map(|_| alphabet[self.below(alphabet.len())]).collect()
    }

    /// Returns `len` arbitrary bytes.
    pub fn bytes(&mut self, len: usize) -> Vec<u8> {
        (0..len).map(|_| self.next_byte()).collect()
    }

    /// Returns a copy of `base` with roughly `edits` scattered insertions,
    /// deletions and overwrites.
    pub fn mutate(&mut self, base: &[u8], edits: usize) -> Vec<u8> {
        let mut out = base.to_vec();
        for _ in 0..edits {
            let at = if out.is_empty() { 0 } else { self.below(out.len()) };
            match self.below(3) {
                0 => {
                    let len = 1 + self.below(8);
                    let insert = self.text(len, b"abcdefghij");
                    out.splice(at..at, insert);
                }
                1 if !out.is_empty() => {
                    let end = (at + 1 + self.below(8)).min(out.len());
                    out.drain(at..end);
                }
                _ if !out.is_empty() => out[at] = self.next_byte(),
                _ => out.push(self.next_byte()),
            }
        }
        out
    }
}
