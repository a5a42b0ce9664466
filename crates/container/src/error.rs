//! Error types for container encoding and decoding.

use std::io;

use thiserror::Error;

/// Result type for container operations.
pub type ContainerResult<T> = Result<T, ContainerError>;

/// Failures raised while reading or writing a delta container.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Underlying I/O, compression or archive failure.
    #[error("container I/O failed: {0}")]
    Io(#[from] io::Error),
    /// The leading bytes match no supported compression format.
    #[error("unrecognised container compression (leading bytes {0:02x?})")]
    UnknownCompression(Vec<u8>),
    /// A required archive entry is absent.
    #[error("container is missing the `{0}` entry")]
    MissingEntry(&'static str),
    /// The archive holds an entry other than `instructions` or `changes`.
    #[error("container holds unexpected entry `{0}`")]
    UnexpectedEntry(String),
    /// An entry appears more than once.
    #[error("container holds `{0}` more than once")]
    DuplicateEntry(&'static str),
    /// An instruction line could not be parsed.
    #[error("instruction line {line}: {reason}")]
    MalformedInstruction {
        /// One-based line number.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },
    /// The payload length disagrees with the sizes in the instruction stream.
    #[error("payload holds {actual} bytes but instructions describe {expected}")]
    PayloadLength {
        /// Bytes the instructions account for.
        expected: u64,
        /// Bytes actually present.
        actual: u64,
    },
}

impl ContainerError {
    /// Returns `true` when the artifact was readable but structurally invalid.
    #[must_use]
    pub const fn is_format_error(&self) -> bool {
        !matches!(self, Self::Io(_))
    }

    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedInstruction {
            line,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_are_not_format_errors() {
        let err = ContainerError::from(io::Error::other("disk gone"));
        assert!(!err.is_format_error());
        assert!(err.to_string().contains("disk gone"));
    }

    #[test]
    fn malformed_reports_line() {
        let err = ContainerError::malformed(3, "expected three fields");
        assert!(err.is_format_error());
        assert_eq!(err.to_string(), "instruction line 3: expected three fields");
    }

    #[test]
    fn unknown_compression_shows_hex() {
        let err = ContainerError::UnknownCompression(vec![0xde, 0xad]);
        assert_eq!(
            err.to_string(),
            "unrecognised container compression (leading bytes [de, ad])"
        );
    }
}
