//! Whole-file hashing and hex rendering helpers.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::strong::{Sha256, StrongDigest};

/// Read buffer used when hashing streams.
const READ_BUFFER_LEN: usize = 64 * 1024;

/// Hashes everything `reader` yields with the hasher `D`.
pub fn digest_reader<D, R>(mut reader: R) -> io::Result<D::Digest>
where
    D: StrongDigest,
    R: Read,
{
    let mut hasher = D::new();
    let mut buffer = vec![0u8; READ_BUFFER_LEN];
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        };
        hasher.update(&buffer[..read]);
    }
    Ok(hasher.finalize())
}

/// Computes the SHA-256 digest of the file at `path`.
pub fn digest_file(path: &Path) -> io::Result<[u8; 32]> {
    let file = File::open(path)?;
    digest_reader::<Sha256, _>(file)
}

/// Renders `bytes` as a lowercase hex string.
#[must_use]
pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        // Writing into a String cannot fail.
        let _ = write!(&mut out, "{byte:02x}");
    }
    out
}

/// Parses a hex string produced by [`to_hex`]. Returns `None` on odd length
/// or non-hex characters.
#[must_use]
pub fn parse_hex(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 {
        return None;
    }
    text.as_bytes()
        .chunks_exact(2)
        .map(|pair| {
            let high = (pair[0] as char).to_digit(16)?;
            let low = (pair[1] as char).to_digit(16)?;
            Some((high * 16 + low) as u8)
        })
        .collect()
}
