//! End-to-end diff/patch behaviour on in-memory inputs.

use delta::{Change, ChangeKind, DiffEngine, PatchEngine, diff};
use proptest::prelude::*;
use std::io::Cursor;
use test_support::ByteGen;

fn round_trip(old: &[u8], new: &[u8]) -> Vec<Change> {
    let changes = diff(old, new);
    let patched = PatchEngine::new().apply_to_vec(old, &changes).unwrap();
    assert_eq!(patched, new, "patched output diverged from the new input");
    changes
}

// ============================================================================
// Fixed scenarios
// ============================================================================

#[test]
fn insertion_into_sentence() {
    let patched = PatchEngine::new()
        .apply_to_vec(b"apply test", &[Change::add(5, b" add".to_vec())])
        .unwrap();
    assert_eq!(patched, b"apply add test");
}

#[test]
fn removal_of_prefix() {
    let patched = PatchEngine::new()
        .apply_to_vec(b"apply test", &[Change::remove(0, b"apply ".to_vec())])
        .unwrap();
    assert_eq!(patched, b"test");
}

#[test]
fn sentence_rewrite_reproduces_new_text() {
    let changes = round_trip(
        b"this is an example of very short a file",
        b"this is an example from a file",
    );
    assert!(changes.iter().any(|c| c.kind() == ChangeKind::Add));
    assert!(changes.iter().any(|c| c.kind() == ChangeKind::Remove));
}

#[test]
fn unrelated_strings_reach_both_ends_together() {
    round_trip(b"3tWpQlfCWlTOWxY7Cc2Lt", b"gxTVznFfHd4Izlvmq");
}

#[test]
fn identical_content_has_no_changes() {
    let text = b"nothing to see here".repeat(40);
    assert!(diff(&text, &text).is_empty());
}

#[test]
fn empty_sides() {
    assert_eq!(round_trip(b"", b"fresh file"), vec![Change::add(0, b"fresh file".to_vec())]);
    assert_eq!(round_trip(b"gone", b""), vec![Change::remove(0, b"gone".to_vec())]);
}

#[test]
fn positions_stay_in_original_coordinates() {
    let changes = round_trip(b"0123456789", b"01ab23456789cd");
    assert_eq!(
        changes,
        vec![Change::add(2, b"ab".to_vec()), Change::add(10, b"cd".to_vec())]
    );
}

// ============================================================================
// Generated inputs
// ============================================================================

#[test]
fn scattered_edits_on_large_text() {
    let mut generator = ByteGen::new(42);
    let base = generator.text(20_000, b"abcdefghijklmnopqrstuvwxyz \n");
    for round in 0..8 {
        let edited = generator.mutate(&base, 10 + round * 25);
        round_trip(&base, &edited);
        round_trip(&edited, &base);
    }
}

#[test]
fn reader_diff_matches_slice_diff_with_tiny_buffers() {
    let mut generator = ByteGen::new(9);
    let old = generator.text(4_000, b"xyz01");
    let new = generator.mutate(&old, 60);
    let expected = diff(&old, &new);
    for buffer_len in [1, 2, 7, 64, 4096] {
        let actual = DiffEngine::new()
            .with_buffer_len(buffer_len)
            .diff(Cursor::new(&old), Cursor::new(&new))
            .unwrap();
        assert_eq!(actual, expected, "buffer length {buffer_len}");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn patch_of_diff_reproduces_new(
        old in proptest::collection::vec(0u8..6, 0..200),
        new in proptest::collection::vec(0u8..6, 0..200),
    ) {
        let changes = diff(&old, &new);
        let patched = PatchEngine::new().apply_to_vec(&old, &changes).unwrap();
        prop_assert_eq!(patched, new);
    }

    #[test]
    fn change_positions_never_decrease(
        old in proptest::collection::vec(any::<u8>(), 0..128),
        new in proptest::collection::vec(any::<u8>(), 0..128),
    ) {
        let changes = diff(&old, &new);
        for pair in changes.windows(2) {
            prop_assert!(pair[0].position() <= pair[1].position());
        }
        for change in &changes {
            prop_assert!(!change.content().is_empty());
            prop_assert!(change.original_end() <= old.len() as u64);
        }
    }
}
