//! Single-threaded patch path.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use super::plan::{Span, splice_window};
use super::{CancellationToken, PatchMode, PatchReport};
use crate::change::Change;

/// Rewrites `path` with `changes` applied, loading only the touched span.
pub(super) fn apply(
    path: &Path,
    changes: &[Change],
    span: Span,
    original_len: u64,
    cancel: &CancellationToken,
) -> io::Result<PatchReport> {
    let mut source = File::open(path)?;
    let permissions = source.metadata()?.permissions();
    let mut writer = BufWriter::new(NamedTempFile::new_in(parent_dir(path))?);

    io::copy(&mut (&mut source).take(span.start), &mut writer)?;

    let mut window = vec![0u8; span.len()?];
    source.read_exact(&mut window)?;
    cancel.check()?;
    let patched = splice_window(&window, span.start, changes)?;
    drop(window);
    writer.write_all(&patched)?;

    source.seek(SeekFrom::Start(span.end))?;
    io::copy(&mut source, &mut writer)?;

    let temp = writer.into_inner().map_err(io::IntoInnerError::into_error)?;
    let patched_len = temp.as_file().metadata()?.len();
    cancel.check()?;
    fs::set_permissions(temp.path(), permissions)?;
    temp.persist(path)?;

    Ok(PatchReport {
        mode: PatchMode::Sequential,
        changes: changes.len(),
        batches: 1,
        original_len,
        patched_len,
    })
}

/// Directory holding `path`, used to keep the temporary file on one filesystem.
pub(super) fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
