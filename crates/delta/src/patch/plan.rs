//! Validation and windowing shared by both patch paths.

use std::io;

use crate::change::{Change, ChangeKind};

/// Range of original bytes touched by a change list.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Span {
    /// Position of the first change.
    pub(crate) start: u64,
    /// First original byte after every change.
    pub(crate) end: u64,
}

impl Span {
    pub(crate) fn len(&self) -> io::Result<usize> {
        to_usize(self.end - self.start)
    }
}

/// One batch of changes with the original window it rewrites.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BatchWindow<'a> {
    pub(crate) index: usize,
    pub(crate) start: u64,
    pub(crate) end: u64,
    pub(crate) changes: &'a [Change],
}

pub(crate) fn invalid(message: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message.into())
}

pub(crate) fn to_usize(value: u64) -> io::Result<usize> {
    usize::try_from(value).map_err(|_| invalid(format!("window of {value} bytes exceeds memory")))
}

/// Checks ordering and bounds, returning the touched span.
///
/// A change may not start before the end of any earlier removal, and no
/// removal may run past `original_len`. Returns `None` for an empty list.
pub(crate) fn validate(changes: &[Change], original_len: u64) -> io::Result<Option<Span>> {
    let Some(first) = changes.first() else {
        return Ok(None);
    };
    let mut floor = first.position();
    for (index, change) in changes.iter().enumerate() {
        if change.position() < floor {
            return Err(invalid(format!(
                "change {index} at {} overlaps or precedes byte {floor}",
                change.position()
            )));
        }
        floor = change.original_end();
        if floor > original_len {
            return Err(invalid(format!(
                "change {index} ({} of {} bytes at {}) ends past original length {original_len}",
                change.kind(),
                change.size(),
                change.position()
            )));
        }
    }
    Ok(Some(Span {
        start: first.position(),
        end: floor,
    }))
}

/// Splits `changes` into windows of `batch_size` that tile `[span.start, span.end)`.
///
/// Each window stretches to the first position of the following batch so
/// unchanged bytes between batches belong to exactly one window.
pub(crate) fn batch_windows(changes: &[Change], batch_size: usize, span: Span) -> Vec<BatchWindow<'_>> {
    let batches: Vec<&[Change]> = changes.chunks(batch_size.max(1)).collect();
    batches
        .iter()
        .enumerate()
        .map(|(index, batch)| {
            let start = batch.first().map_or(span.end, Change::position);
            let end = batches
                .get(index + 1)
                .and_then(|next| next.first())
                .map_or(span.end, Change::position);
            BatchWindow {
                index,
                start,
                end,
                changes: batch,
            }
        })
        .collect()
}

/// Applies `changes` to `window`, whose first byte sits at `window_start`
/// in original coordinates.
///
/// Walking the window with a copy cursor yields the same bytes as splicing
/// each change at `position + offset`, where the offset sums the lengths
/// added minus the lengths removed so far.
pub(crate) fn splice_window(
    window: &[u8],
    window_start: u64,
    changes: &[Change],
) -> io::Result<Vec<u8>> {
    let growth: usize = changes
        .iter()
        .filter(|change| change.kind() == ChangeKind::Add)
        .map(|change| change.content().len())
        .sum();
    let mut out = Vec::with_capacity(window.len() + growth);
    let mut cursor = 0usize;
    for change in changes {
        let at = change
            .position()
            .checked_sub(window_start)
            .ok_or_else(|| invalid("change precedes its window"))
            .and_then(to_usize)?;
        let unchanged = window
            .get(cursor..at)
            .ok_or_else(|| invalid(format!("change at {} falls outside its window", change.position())))?;
        out.extend_from_slice(unchanged);
        cursor = at;
        match change.kind() {
            ChangeKind::Add => out.extend_from_slice(change.content()),
            ChangeKind::Remove => {
                cursor += change.content().len();
                if cursor > window.len() {
                    return Err(invalid(format!(
                        "removal at {} runs past its window",
                        change.position()
                    )));
                }
            }
        }
    }
    out.extend_from_slice(&window[cursor..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_reports_span() {
        let changes = vec![
            Change::add(2, b"x".to_vec()),
            Change::remove(4, b"ab".to_vec()),
            Change::add(6, b"y".to_vec()),
        ];
        let span = validate(&changes, 10).unwrap().unwrap();
        assert_eq!(span, Span { start: 2, end: 6 });
        assert_eq!(validate(&[], 0).unwrap(), None);
    }

    #[test]
    fn validate_rejects_unsorted() {
        let changes = vec![Change::add(5, b"x".to_vec()), Change::add(2, b"y".to_vec())];
        let err = validate(&changes, 10).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn validate_rejects_change_inside_removal() {
        let changes = vec![
            Change::remove(2, b"abcd".to_vec()),
            Change::add(4, b"y".to_vec()),
        ];
        assert!(validate(&changes, 10).is_err());
    }

    #[test]
    fn validate_rejects_out_of_bounds() {
        assert!(validate(&[Change::remove(8, b"abc".to_vec())], 10).is_err());
        assert!(validate(&[Change::add(11, b"a".to_vec())], 10).is_err());
        assert!(validate(&[Change::add(10, b"a".to_vec())], 10).is_ok());
    }

    #[test]
    fn substitution_pair_is_valid() {
        let changes = vec![Change::add(3, b"YZ".to_vec()), Change::remove(3, b"X".to_vec())];
        assert!(validate(&changes, 4).is_ok());
        assert_eq!(splice_window(b"abcXd", 0, &changes).unwrap(), b"abcYZd");
    }

    #[test]
    fn windows_tile_the_span() {
        let changes: Vec<Change> = (0..7).map(|i| Change::remove(i * 10, b"a".to_vec())).collect();
        let span = validate(&changes, 100).unwrap().unwrap();
        let windows = batch_windows(&changes, 3, span);
        let bounds: Vec<(u64, u64)> = windows.iter().map(|w| (w.start, w.end)).collect();
        assert_eq!(bounds, vec![(0, 30), (30, 60), (60, 61)]);
        assert_eq!(windows[2].changes.len(), 1);
    }

    #[test]
    fn splice_window_honours_offset() {
        let window = b"cdefgh";
        let changes = vec![Change::add(3, b"XX".to_vec()), Change::remove(5, b"fg".to_vec())];
        assert_eq!(splice_window(window, 2, &changes).unwrap(), b"cXXdeh");
    }
}
