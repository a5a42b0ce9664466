//! Text instruction stream: one `<kind> <position> <size>\n` line per change.

use std::fmt::Write as _;

use delta::{Change, ChangeKind};

use crate::error::{ContainerError, ContainerResult};

/// Parsed instruction line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Instruction {
    pub(crate) kind: ChangeKind,
    pub(crate) position: u64,
    pub(crate) size: u64,
}

/// Renders the instruction stream for `changes`.
pub(crate) fn render(changes: &[Change]) -> String {
    let mut text = String::with_capacity(changes.len() * 12);
    for change in changes {
        // Writing into a String cannot fail.
        let _ = writeln!(
            text,
            "{} {} {}",
            change.kind().as_tag(),
            change.position(),
            change.size()
        );
    }
    text
}

/// Parses an instruction stream. Every line, including the last, must end in `\n`.
pub(crate) fn parse(text: &str) -> ContainerResult<Vec<Instruction>> {
    if !text.is_empty() && !text.ends_with('\n') {
        let line = text.lines().count();
        return Err(ContainerError::malformed(line, "missing trailing newline"));
    }
    text.split_terminator('\n')
        .enumerate()
        .map(|(index, line)| parse_line(index + 1, line))
        .collect()
}

fn parse_line(number: usize, line: &str) -> ContainerResult<Instruction> {
    let mut fields = line.split(' ');
    let (Some(kind), Some(position), Some(size), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(ContainerError::malformed(number, format!("expected three fields in {line:?}")));
    };
    let tag: u8 = parse_field(number, "kind", kind)?;
    let kind = ChangeKind::from_tag(tag)
        .ok_or_else(|| ContainerError::malformed(number, format!("unknown kind {tag}")))?;
    Ok(Instruction {
        kind,
        position: parse_field(number, "position", position)?,
        size: parse_field(number, "size", size)?,
    })
}

fn parse_field<T: std::str::FromStr>(number: usize, name: &str, field: &str) -> ContainerResult<T> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ContainerError::malformed(number, format!("{name} {field:?} is not a non-negative integer")));
    }
    field
        .parse()
        .map_err(|_| ContainerError::malformed(number, format!("{name} {field} is out of range")))
}

/// Splits `payload` according to `instructions`, consuming it exactly.
pub(crate) fn assemble(instructions: &[Instruction], payload: &[u8]) -> ContainerResult<Vec<Change>> {
    let expected = instructions
        .iter()
        .try_fold(0u64, |total, instruction| total.checked_add(instruction.size))
        .ok_or(ContainerError::PayloadLength {
            expected: u64::MAX,
            actual: payload.len() as u64,
        })?;
    if expected != payload.len() as u64 {
        return Err(ContainerError::PayloadLength {
            expected,
            actual: payload.len() as u64,
        });
    }

    let mut cursor = 0usize;
    Ok(instructions
        .iter()
        .map(|instruction| {
            // Lengths were checked above, so every slice is in bounds.
            let end = cursor + instruction.size as usize;
            let content = payload[cursor..end].to_vec();
            cursor = end;
            Change::new(instruction.kind, instruction.position, content)
        })
        .collect())
}
