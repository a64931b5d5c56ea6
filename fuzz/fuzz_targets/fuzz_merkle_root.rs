//! Fuzz target for the merkle fold and inclusion proofs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use vuser_chain::{merkle_root, MerkleTree};
use vuser_crypto::Hash256;

fuzz_target!(|data: &[u8]| {
    let leaves: Vec<Hash256> = data.chunks(4).map(Hash256::hash).collect();

    let tree = MerkleTree::new(leaves.clone());
    let root = merkle_root(&leaves);
    assert_eq!(tree.root(), root);

    for index in 0..leaves.len() {
        let proof = tree.generate_proof(index).unwrap();
        assert!(proof.verify(&root));
    }
});
