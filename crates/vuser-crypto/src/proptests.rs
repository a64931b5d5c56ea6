//! Property-based tests for hashing primitives.

use proptest::prelude::*;

use crate::Hash256;

proptest! {
    /// Hashing is a pure function of its input.
    #[test]
    fn hash_many_deterministic(a: Vec<u8>, b: Vec<u8>) {
        prop_assert_eq!(
            Hash256::hash_many(&[&a, &b]),
            Hash256::hash_many(&[&a, &b])
        );
    }

    /// Moving the split point between two fields changes the digest.
    #[test]
    fn hash_many_field_boundaries_matter(
        data in prop::collection::vec(any::<u8>(), 2..64),
        split in 1usize..63,
    ) {
        let split = split.min(data.len() - 1);
        let (left, right) = data.split_at(split);
        let joined = Hash256::hash_many(&[&data]);
        let separated = Hash256::hash_many(&[left, right]);
        prop_assert_ne!(joined, separated);
    }

    /// Hex encoding roundtrips for arbitrary digests.
    #[test]
    fn hex_roundtrip(data: Vec<u8>) {
        let hash = Hash256::hash(&data);
        let parsed = Hash256::from_hex(&hash.to_hex()).unwrap();
        prop_assert_eq!(hash, parsed);
    }

    /// Parsing arbitrary strings never panics.
    #[test]
    fn from_hex_never_panics(s in "\\PC{0,80}") {
        let _ = Hash256::from_hex(&s);
    }
}
