//! Strong (cryptographic) digests.
//!
//! Only SHA-256 is needed today; the [`StrongDigest`] trait keeps call-sites
//! generic so hashing helpers such as [`crate::digest_reader`] work with any
//! hasher added later.

mod sha256;

pub use sha256::Sha256;

/// Streaming digest interface shared by the strong hashers.
pub trait StrongDigest: Sized {
    /// Final digest output.
    type Digest: AsRef<[u8]> + Copy + Eq;

    /// Creates a hasher with an empty state.
    fn new() -> Self;

    /// Feeds additional bytes into the digest state.
    fn update(&mut self, data: &[u8]);

    /// Finalises the digest.
    fn finalize(self) -> Self::Digest;

    /// Computes the digest of `data` in one shot.
    fn digest(data: &[u8]) -> Self::Digest {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }
}
