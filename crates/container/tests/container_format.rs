//! Container encoding, decoding and rejection of damaged artifacts.

use std::io::Write;

use container::{
    CHANGES_ENTRY, Compression, ContainerError, DeltaContainer, INSTRUCTIONS_ENTRY,
};
use delta::{Change, diff};
use proptest::prelude::*;
use tar::{Builder, Header};
use test_support::{ByteGen, Scratch};

fn sample() -> DeltaContainer {
    DeltaContainer::new(vec![
        Change::add(2, b"YX".to_vec()),
        Change::remove(2, b"XY".to_vec()),
        Change::add(40, b"tail".to_vec()),
    ])
}

/// Builds a zstd-compressed tar from raw `(name, bytes)` entries.
fn raw_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = Builder::new(Vec::new());
    for (name, bytes) in entries {
        let mut header = Header::new_gnu();
        header.set_size(bytes.len() as u64);
        header.set_mode(0o644);
        header.set_path(name).unwrap();
        header.set_cksum();
        builder.append(&header, *bytes).unwrap();
    }
    let tar = builder.into_inner().unwrap();
    let mut encoder = zstd::stream::write::Encoder::new(Vec::new(), 0).unwrap();
    encoder.write_all(&tar).unwrap();
    encoder.finish().unwrap()
}

// ============================================================================
// Round trips
// ============================================================================

#[test]
fn both_compressions_round_trip() {
    let container = sample();
    for compression in Compression::ALL {
        let bytes = container.to_bytes(compression).unwrap();
        assert_eq!(Compression::detect(&bytes), Some(compression));
        assert_eq!(DeltaContainer::from_bytes(&bytes).unwrap(), container);
    }
}

#[test]
fn instruction_text_matches_wire_format() {
    assert_eq!(sample().instruction_text(), "0 2 2\n1 2 2\n0 40 4\n");
}

#[test]
fn empty_container_round_trips() {
    let empty = DeltaContainer::default();
    let bytes = empty.to_bytes(Compression::Gzip).unwrap();
    assert!(DeltaContainer::from_bytes(&bytes).unwrap().is_empty());
}

#[test]
fn encoding_is_deterministic() {
    let a = sample().to_bytes(Compression::Zstd).unwrap();
    let b = sample().to_bytes(Compression::Zstd).unwrap();
    assert_eq!(a, b);
}

#[test]
fn file_round_trip_creates_parent_dirs() {
    let scratch = Scratch::new();
    let path = scratch.join("deltas/nested/1700000000.delta");
    sample().write_file(&path, Compression::Zstd).unwrap();
    assert_eq!(DeltaContainer::read_file(&path).unwrap(), sample());
}

#[test]
fn large_diff_survives_container() {
    let mut generator = ByteGen::new(77);
    let old = generator.bytes(30_000);
    let new = generator.mutate(&old, 300);
    let container = DeltaContainer::new(diff(&old, &new));
    let decoded = DeltaContainer::from_bytes(&container.to_bytes(Compression::Zstd).unwrap()).unwrap();
    assert_eq!(decoded.summary(), container.summary());
    assert_eq!(decoded, container);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn arbitrary_diffs_decode_to_the_same_changes(
        old in proptest::collection::vec(any::<u8>(), 0..256),
        new in proptest::collection::vec(any::<u8>(), 0..256),
    ) {
        let container = DeltaContainer::new(diff(&old, &new));
        let bytes = container.to_bytes(Compression::Gzip).unwrap();
        prop_assert_eq!(DeltaContainer::from_bytes(&bytes).unwrap(), container);
    }
}

// ============================================================================
// Damaged artifacts
// ============================================================================

#[test]
fn rejects_unknown_compression() {
    let err = DeltaContainer::from_bytes(b"plain text, not an archive").unwrap_err();
    assert!(matches!(err, ContainerError::UnknownCompression(_)));
}

#[test]
fn rejects_missing_entries() {
    let only_instructions = raw_archive(&[(INSTRUCTIONS_ENTRY, b"")]);
    assert!(matches!(
        DeltaContainer::from_bytes(&only_instructions),
        Err(ContainerError::MissingEntry(CHANGES_ENTRY))
    ));

    let only_changes = raw_archive(&[(CHANGES_ENTRY, b"")]);
    assert!(matches!(
        DeltaContainer::from_bytes(&only_changes),
        Err(ContainerError::MissingEntry(INSTRUCTIONS_ENTRY))
    ));
}

#[test]
fn rejects_extra_and_duplicate_entries() {
    let extra = raw_archive(&[
        (INSTRUCTIONS_ENTRY, b""),
        (CHANGES_ENTRY, b""),
        ("README", b"hi"),
    ]);
    assert!(matches!(
        DeltaContainer::from_bytes(&extra),
        Err(ContainerError::UnexpectedEntry(name)) if name == "README"
    ));

    let duplicate = raw_archive(&[
        (INSTRUCTIONS_ENTRY, b""),
        (INSTRUCTIONS_ENTRY, b""),
        (CHANGES_ENTRY, b""),
    ]);
    assert!(matches!(
        DeltaContainer::from_bytes(&duplicate),
        Err(ContainerError::DuplicateEntry(INSTRUCTIONS_ENTRY))
    ));
}

#[test]
fn rejects_payload_length_mismatch() {
    let short = raw_archive(&[(INSTRUCTIONS_ENTRY, b"0 0 5\n"), (CHANGES_ENTRY, b"abc")]);
    let err = DeltaContainer::from_bytes(&short).unwrap_err();
    assert!(matches!(err, ContainerError::PayloadLength { expected: 5, actual: 3 }));
    assert!(err.is_format_error());
}

#[test]
fn rejects_bad_instruction_lines() {
    let archive = raw_archive(&[(INSTRUCTIONS_ENTRY, b"0 0 1\n9 1 1\n"), (CHANGES_ENTRY, b"ab")]);
    assert!(matches!(
        DeltaContainer::from_bytes(&archive),
        Err(ContainerError::MalformedInstruction { line: 2, .. })
    ));
}

#[test]
fn rejects_truncated_archive() {
    let bytes = sample().to_bytes(Compression::Gzip).unwrap();
    let err = DeltaContainer::from_bytes(&bytes[..bytes.len() / 2]).unwrap_err();
    assert!(matches!(err, ContainerError::Io(_) | ContainerError::MissingEntry(_)));
}
