use std::fmt;

/// Direction of a single edit.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ChangeKind {
    /// Bytes inserted into the original.
    Add,
    /// Bytes deleted from the original.
    Remove,
}

impl ChangeKind {
    /// Returns the integer tag used by the container instruction stream.
    #[must_use]
    pub const fn as_tag(self) -> u8 {
        match self {
            Self::Add => 0,
            Self::Remove => 1,
        }
    }

    /// Parses an instruction tag, returning `None` for unknown values.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Add),
            1 => Some(Self::Remove),
            _ => None,
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => f.write_str("add"),
            Self::Remove => f.write_str("remove"),
        }
    }
}

/// A single edit record produced by the diff engine.
///
/// `position` is always expressed in the coordinate space of the original
/// (pre-edit) file. A removal starts at `position`; an addition is inserted
/// before the original byte at `position`, so appends use the original
/// length. A substitution is an [`ChangeKind::Add`] followed by a
/// [`ChangeKind::Remove`] at the same position.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Change {
    kind: ChangeKind,
    position: u64,
    content: Vec<u8>,
}

impl Change {
    /// Creates a change from its parts.
    #[must_use]
    pub const fn new(kind: ChangeKind, position: u64, content: Vec<u8>) -> Self {
        Self {
            kind,
            position,
            content,
        }
    }

    /// Creates an insertion of `content` before original byte `position`.
    #[must_use]
    pub fn add(position: u64, content: impl Into<Vec<u8>>) -> Self {
        Self::new(ChangeKind::Add, position, content.into())
    }

    /// Creates a removal of `content` starting at original byte `position`.
    #[must_use]
    pub fn remove(position: u64, content: impl Into<Vec<u8>>) -> Self {
        Self::new(ChangeKind::Remove, position, content.into())
    }

    /// Returns the change kind.
    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        self.kind
    }

    /// Returns the position in original-file coordinates.
    #[must_use]
    pub const fn position(&self) -> u64 {
        self.position
    }

    /// Returns the inserted or removed bytes.
    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Consumes the change and returns its content.
    #[must_use]
    pub fn into_content(self) -> Vec<u8> {
        self.content
    }

    /// Returns the number of bytes in [`Self::content`].
    #[must_use]
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    /// Returns the first original byte not covered by this change.
    ///
    /// Additions cover no original bytes, so their end equals their position.
    #[must_use]
    pub fn original_end(&self) -> u64 {
        match self.kind {
            ChangeKind::Add => self.position,
            ChangeKind::Remove => self.position + self.size(),
        }
    }

    /// Returns the signed length difference this change applies to the target.
    #[must_use]
    pub fn delta_len(&self) -> i64 {
        match self.kind {
            ChangeKind::Add => self.size() as i64,
            ChangeKind::Remove => -(self.size() as i64),
        }
    }

    pub(crate) fn extend(&mut self, bytes: &[u8]) {
        self.content.extend_from_slice(bytes);
    }
}

/// Aggregate counters describing a change list.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ChangeSummary {
    /// Number of [`ChangeKind::Add`] entries.
    pub additions: usize,
    /// Number of [`ChangeKind::Remove`] entries.
    pub removals: usize,
    /// Total bytes inserted.
    pub added_bytes: u64,
    /// Total bytes deleted.
    pub removed_bytes: u64,
}

impl ChangeSummary {
    /// Computes the summary for `changes`.
    #[must_use]
    pub fn of(changes: &[Change]) -> Self {
        changes.iter().fold(Self::default(), |mut summary, change| {
            match change.kind() {
                ChangeKind::Add => {
                    summary.additions += 1;
                    summary.added_bytes += change.size();
                }
                ChangeKind::Remove => {
                    summary.removals += 1;
                    summary.removed_bytes += change.size();
                }
            }
            summary
        })
    }

    /// Returns the total number of entries.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.additions + self.removals
    }
}
