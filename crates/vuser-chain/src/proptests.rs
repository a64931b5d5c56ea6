//! Property-based tests for the ledger layer.

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use vuser_crypto::Hash256;

use crate::{
    merkle_root, parse_block_range, Block, Blockchain, ChainError, FeeSchedule, LedgerEntry,
    MerkleTree, ProposalPool,
};

fn leaves(count: usize) -> Vec<Hash256> {
    (0..count)
        .map(|i| Hash256::hash(format!("leaf{}", i).as_bytes()))
        .collect()
}

proptest! {
    #[test]
    fn prop_entry_id_is_pure(
        sender in "[a-z]{1,8}",
        recipient in "[a-z]{1,8}",
        amount: u64,
        nonce: u64,
        payload in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let a = LedgerEntry::new(sender.clone(), recipient.clone(), amount, nonce, payload.clone());
        let b = LedgerEntry::new(sender, recipient, amount, nonce, payload);
        prop_assert_eq!(a.id(), b.id());
        prop_assert!(a.verify_id());
    }

    #[test]
    fn prop_fee_grows_with_payload(len in 0usize..10_000) {
        let schedule = FeeSchedule::default();
        let fee = schedule.fee_for(len);
        prop_assert_eq!(fee.clone(), num_bigint::BigUint::from(1 + len as u64 / 100));
        prop_assert!(schedule.fee_for(len + 100) > fee);
    }

    #[test]
    fn prop_merkle_tree_matches_fold(count in 0usize..64) {
        let l = leaves(count);
        prop_assert_eq!(MerkleTree::new(l.clone()).root(), merkle_root(&l));
    }

    #[test]
    fn prop_merkle_all_proofs_valid(count in 1usize..40) {
        let tree = MerkleTree::new(leaves(count));
        let root = tree.root();
        for i in 0..count {
            prop_assert!(tree.generate_proof(i).unwrap().verify(&root));
        }
    }

    #[test]
    fn prop_merkle_swap_changes_root(count in 2usize..32, i in 0usize..32, j in 0usize..32) {
        let (i, j) = (i % count, j % count);
        prop_assume!(i != j);
        let original = leaves(count);
        let mut swapped = original.clone();
        swapped.swap(i, j);
        prop_assert_ne!(merkle_root(&original), merkle_root(&swapped));
    }

    #[test]
    fn prop_fallback_rotation_covers_pool(size in 1usize..16, seed: u64) {
        let mut pool = ProposalPool::new();
        pool.begin_round();
        for i in 0..size {
            pool.submit(format!("miner-{}", i), vec![]).unwrap();
        }

        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let primary = pool.select_primary(&mut rng).unwrap();

        let mut seen = std::collections::HashSet::new();
        let mut current = primary.clone();
        for _ in 0..size {
            seen.insert(current.miner_address.clone());
            current = pool.fallback(&current).unwrap();
        }
        prop_assert_eq!(seen.len(), size);
        prop_assert_eq!(current, primary);
    }

    #[test]
    fn prop_only_successor_is_accepted(offset in 0u64..10, timestamp: u64) {
        let mut chain = Blockchain::with_genesis_timestamp(0, vec![]);
        let tip = chain.tip().clone();
        let mut candidate = Block::generate_at(&tip, vec![], "v", vec![], timestamp);
        candidate.index = tip.index + 1 + offset;
        candidate.hash = candidate.compute_hash();

        let result = chain.append(candidate).map(|b| b.index);
        if offset == 0 {
            prop_assert_eq!(result, Ok(1));
        } else {
            prop_assert_eq!(
                result,
                Err(ChainError::IndexMismatch { expected: 1, actual: 1 + offset })
            );
        }
    }

    #[test]
    fn prop_block_range_parse_never_panics(s in "\\PC*") {
        let _ = parse_block_range(&s);
    }

    #[test]
    fn prop_block_range_accepts_formatted(start: u64, end: u64) {
        let formatted = crate::format_block_range(start, end);
        prop_assert_eq!(parse_block_range(&formatted), Ok((start, end)));
    }
}
