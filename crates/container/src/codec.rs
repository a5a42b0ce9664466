//! Tar bundling of the instruction and payload streams.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use logging::trace_container;
use tar::{Archive, Builder, EntryType, Header, HeaderMode};
use tempfile::NamedTempFile;

use crate::compression::Compression;
use crate::error::{ContainerError, ContainerResult};
use crate::instructions;
use crate::DeltaContainer;

/// Archive entry holding the instruction text.
pub const INSTRUCTIONS_ENTRY: &str = "instructions";
/// Archive entry holding the concatenated change contents.
pub const CHANGES_ENTRY: &str = "changes";

pub(crate) fn write<W: Write>(
    container: &DeltaContainer,
    sink: W,
    compression: Compression,
) -> ContainerResult<W> {
    let text = instructions::render(container.changes());
    let payload_len: u64 = container.changes().iter().map(|change| change.size()).sum();

    let mut builder = Builder::new(compression.encoder(sink)?);
    builder.mode(HeaderMode::Deterministic);
    append_entry(&mut builder, INSTRUCTIONS_ENTRY, text.len() as u64, text.as_bytes())?;
    let payload = container.changes().iter().map(|change| change.content());
    append_entry(&mut builder, CHANGES_ENTRY, payload_len, ChainedSlices::new(payload))?;
    let sink = builder.into_inner()?.finish()?;

    trace_container!(
        changes = container.changes().len(),
        payload_len,
        %compression,
        "container encoded"
    );
    Ok(sink)
}

fn append_entry<W: Write, R: Read>(
    builder: &mut Builder<W>,
    name: &str,
    size: u64,
    data: R,
) -> ContainerResult<()> {
    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Regular);
    header.set_mode(0o644);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mtime(0);
    header.set_size(size);
    header.set_path(name)?;
    header.set_cksum();
    builder.append(&header, data)?;
    Ok(())
}

pub(crate) fn read<R: Read>(source: R) -> ContainerResult<DeltaContainer> {
    let decoder = Compression::decoder(BufReader::new(source))?;
    let mut archive = Archive::new(decoder);

    let mut text: Option<String> = None;
    let mut payload: Option<Vec<u8>> = None;
    let mut seen = HashSet::new();
    for entry in archive.entries()? {
        let mut entry = entry?;
        let name = entry.path()?.to_string_lossy().into_owned();
        let slot = match name.as_str() {
            INSTRUCTIONS_ENTRY => INSTRUCTIONS_ENTRY,
            CHANGES_ENTRY => CHANGES_ENTRY,
            _ => return Err(ContainerError::UnexpectedEntry(name)),
        };
        if !seen.insert(slot) {
            return Err(ContainerError::DuplicateEntry(slot));
        }
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;
        if slot == INSTRUCTIONS_ENTRY {
            let decoded = String::from_utf8(bytes)
                .map_err(|_| ContainerError::malformed(0, "instruction stream is not UTF-8"))?;
            text = Some(decoded);
        } else {
            payload = Some(bytes);
        }
    }

    let text = text.ok_or(ContainerError::MissingEntry(INSTRUCTIONS_ENTRY))?;
    let payload = payload.ok_or(ContainerError::MissingEntry(CHANGES_ENTRY))?;
    let parsed = instructions::parse(&text)?;
    let changes = instructions::assemble(&parsed, &payload)?;
    trace_container!(changes = changes.len(), payload_len = payload.len(), "container decoded");
    Ok(DeltaContainer::new(changes))
}

pub(crate) fn write_file(
    container: &DeltaContainer,
    path: &Path,
    compression: Compression,
) -> ContainerResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let temp = NamedTempFile::new_in(dir)?;
    let writer = write(container, BufWriter::new(temp), compression)?;
    let temp = writer.into_inner().map_err(|err| err.into_error())?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| err.error)?;
    trace_container!(path = %path.display(), "container written");
    Ok(())
}

pub(crate) fn read_file(path: &Path) -> ContainerResult<DeltaContainer> {
    read(File::open(path)?)
}

/// Reads a sequence of slices back to back without copying them together.
struct ChainedSlices<'a, I: Iterator<Item = &'a [u8]>> {
    slices: I,
    current: &'a [u8],
}

impl<'a, I: Iterator<Item = &'a [u8]>> ChainedSlices<'a, I> {
    fn new(slices: I) -> Self {
        Self {
            slices,
            current: &[],
        }
    }
}

impl<'a, I: Iterator<Item = &'a [u8]>> Read for ChainedSlices<'a, I> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        while self.current.is_empty() {
            match self.slices.next() {
                Some(next) => self.current = next,
                None => return Ok(0),
            }
        }
        self.current.read(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chained_slices_concatenate() {
        let parts: Vec<&[u8]> = vec![b"ab", b"", b"cde", b"f"];
        let mut out = Vec::new();
        ChainedSlices::new(parts.into_iter()).read_to_end(&mut out).unwrap();
        assert_eq!(out, b"abcdef");
    }
}
