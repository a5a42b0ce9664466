//! SHA-256 tests against the FIPS 180-2 example vectors plus streaming
//! equivalence properties.

use checksums::strong::{Sha256, StrongDigest};
use checksums::{digest_reader, to_hex};
use proptest::prelude::*;

#[test]
fn fips_abc() {
    assert_eq!(
        to_hex(&Sha256::digest(b"abc")),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn fips_two_block_message() {
    assert_eq!(
        to_hex(&Sha256::digest(
            b"abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq"
        )),
        "248d6a61d20638b8e5c026930c3e6039a33ce45964ff2167f6ecedd419db06c1"
    );
}

#[test]
fn empty_input() {
    assert_eq!(
        to_hex(&Sha256::digest(b"")),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

proptest! {
    #[test]
    fn split_updates_match_one_shot(data in proptest::collection::vec(any::<u8>(), 0..2048), split in 0usize..2048) {
        let split = split.min(data.len());
        let mut hasher = Sha256::new();
        hasher.update(&data[..split]);
        hasher.update(&data[split..]);
        prop_assert_eq!(hasher.finalize(), Sha256::digest(&data));
    }

    #[test]
    fn reader_digest_matches_one_shot(data in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let streamed = digest_reader::<Sha256, _>(data.as_slice()).unwrap();
        prop_assert_eq!(streamed, <Sha256 as StrongDigest>::digest(&data));
    }
}
