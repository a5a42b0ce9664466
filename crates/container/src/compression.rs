//! Compression formats a container may be wrapped in.

use core::fmt;
use core::str::FromStr;
use std::io::{self, BufRead, Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::error::{ContainerError, ContainerResult};

const ZSTD_MAGIC: [u8; 4] = [0x28, 0xb5, 0x2f, 0xfd];
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Compression applied to the container archive.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Compression {
    /// Zstandard.
    #[default]
    Zstd,
    /// gzip (deflate).
    Gzip,
}

impl Compression {
    /// Every supported format.
    pub const ALL: [Self; 2] = [Self::Zstd, Self::Gzip];

    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Zstd => "zstd",
            Self::Gzip => "gzip",
        }
    }

    /// Identifies the format from the first bytes of an artifact.
    #[must_use]
    pub fn detect(prefix: &[u8]) -> Option<Self> {
        if prefix.starts_with(&ZSTD_MAGIC) {
            Some(Self::Zstd)
        } else if prefix.starts_with(&GZIP_MAGIC) {
            Some(Self::Gzip)
        } else {
            None
        }
    }

    pub(crate) fn encoder<W: Write>(self, sink: W) -> io::Result<Encoder<W>> {
        Ok(match self {
            Self::Zstd => Encoder::Zstd(zstd::stream::write::Encoder::new(sink, 0)?),
            Self::Gzip => Encoder::Gzip(GzEncoder::new(sink, flate2::Compression::default())),
        })
    }

    pub(crate) fn decoder<'a, R: BufRead + 'a>(mut source: R) -> ContainerResult<Box<dyn Read + 'a>> {
        let prefix = source.fill_buf()?;
        let Some(compression) = Self::detect(prefix) else {
            return Err(ContainerError::UnknownCompression(
                prefix.iter().take(ZSTD_MAGIC.len()).copied().collect(),
            ));
        };
        let decoder: Box<dyn Read + 'a> = match compression {
            Self::Zstd => Box::new(zstd::stream::read::Decoder::with_buffer(source)?),
            Self::Gzip => Box::new(GzDecoder::new(source)),
        };
        Ok(decoder)
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown compression name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseCompressionError(String);

impl fmt::Display for ParseCompressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown compression `{}` (expected zstd or gzip)", self.0)
    }
}

impl std::error::Error for ParseCompressionError {}

impl FromStr for Compression {
    type Err = ParseCompressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zstd" | "zst" => Ok(Self::Zstd),
            "gzip" | "gz" => Ok(Self::Gzip),
            other => Err(ParseCompressionError(other.to_owned())),
        }
    }
}

/// Streaming compressor over either format.
pub(crate) enum Encoder<W: Write> {
    Zstd(zstd::stream::write::Encoder<'static, W>),
    Gzip(GzEncoder<W>),
}

impl<W: Write> Encoder<W> {
    /// Writes the stream trailer and returns the sink.
    pub(crate) fn finish(self) -> io::Result<W> {
        match self {
            Self::Zstd(encoder) => encoder.finish(),
            Self::Gzip(encoder) => encoder.finish(),
        }
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Zstd(encoder) => encoder.write(buf),
            Self::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Zstd(encoder) => encoder.flush(),
            Self::Gzip(encoder) => encoder.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_magic_bytes() {
        assert_eq!(Compression::detect(&[0x28, 0xb5, 0x2f, 0xfd, 0]), Some(Compression::Zstd));
        assert_eq!(Compression::detect(&[0x1f, 0x8b, 8]), Some(Compression::Gzip));
        assert_eq!(Compression::detect(b"ustar"), None);
        assert_eq!(Compression::detect(&[]), None);
    }

    #[test]
    fn encoders_emit_detectable_output() {
        for compression in Compression::ALL {
            let mut encoder = compression.encoder(Vec::new()).unwrap();
            encoder.write_all(b"payload").unwrap();
            let bytes = encoder.finish().unwrap();
            assert_eq!(Compression::detect(&bytes), Some(compression));
        }
    }

    #[test]
    fn parses_names() {
        assert_eq!("zstd".parse::<Compression>().unwrap(), Compression::Zstd);
        assert_eq!(" GZ ".parse::<Compression>().unwrap(), Compression::Gzip);
        let err = "lz4".parse::<Compression>().unwrap_err();
        assert!(err.to_string().contains("lz4"));
    }

    #[test]
    fn default_is_zstd() {
        assert_eq!(Compression::default(), Compression::Zstd);
        assert_eq!(Compression::Gzip.to_string(), "gzip");
    }
}
