//! Human-readable output for version listings.

use std::io::{self, Write};

use store::{TrackedFile, Timestamp, VersionInfo};
use time::OffsetDateTime;
use time::format_description::FormatItem;
use time::macros::format_description;

/// Timestamp format used by `log`.
pub(crate) const LOG_TIMESTAMP_FORMAT: &[FormatItem<'static>] = format_description!(
    "[year]/[month padding:zero]/[day padding:zero] [hour padding:zero]:[minute padding:zero]:[second padding:zero]"
);

const CHECKSUM_PREFIX: usize = 12;

pub(crate) fn format_date(timestamp: Timestamp) -> String {
    OffsetDateTime::from(timestamp.to_system_time())
        .format(LOG_TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| "????/??/?? ??:??:??".to_owned())
}

pub(crate) fn write_tracked<W: Write>(out: &mut W, files: &[TrackedFile]) -> io::Result<()> {
    for file in files {
        writeln!(out, "{}\t{}", file.index, file.path.display())?;
    }
    Ok(())
}

pub(crate) fn write_versions<W: Write>(out: &mut W, versions: &[VersionInfo]) -> io::Result<()> {
    for version in versions {
        let marker = if version.active { '*' } else { ' ' };
        let checksum = version
            .checksum
            .as_deref()
            .map_or("-", |hex| &hex[..hex.len().min(CHECKSUM_PREFIX)]);
        write!(
            out,
            "{marker} {}  {}  {checksum}",
            version.timestamp,
            format_date(version.timestamp)
        )?;
        match &version.message {
            Some(message) => writeln!(out, "  {message}")?,
            None => writeln!(out)?,
        }
    }
    Ok(())
}
