//! Merkle root fold over entry identifiers.
//!
//! Leaves are entry identifiers in order. Each level pairs adjacent nodes
//! left to right; on an odd-length level the last node is paired with
//! itself. The single remaining node is the root. An empty leaf set has
//! the all-zero root.
//!
//! ```text
//! [a]       -> H(a, a)
//! [a, b]    -> H(a, b)
//! [a, b, c] -> H(H(a, b), H(c, c))
//! ```
//!
//! ## Example
//!
//! ```
//! use vuser_crypto::Hash256;
//! use vuser_chain::merkle::MerkleTree;
//!
//! let leaves = vec![
//!     Hash256::hash(b"tx1"),
//!     Hash256::hash(b"tx2"),
//!     Hash256::hash(b"tx3"),
//! ];
//!
//! let tree = MerkleTree::new(leaves);
//! let proof = tree.generate_proof(1).unwrap();
//! assert!(proof.verify(&tree.root()));
//! ```

use serde::{Deserialize, Serialize};
use vuser_crypto::Hash256;

use crate::{ChainError, Result};

/// Domain separator for internal merkle node hashing.
const MERKLE_DOMAIN: &[u8] = b"VUSER-MERKLE-v1";

/// Hash two sibling nodes into their parent.
pub fn hash_pair(left: &Hash256, right: &Hash256) -> Hash256 {
    Hash256::hash_many(&[MERKLE_DOMAIN, left.as_bytes(), right.as_bytes()])
}

/// Compute the merkle root of `leaves` without keeping the tree.
pub fn merkle_root(leaves: &[Hash256]) -> Hash256 {
    if leaves.is_empty() {
        return Hash256::zero();
    }

    let mut level = next_level(leaves);
    while level.len() > 1 {
        level = next_level(&level);
    }
    level.swap_remove(0)
}

/// Pair adjacent nodes, duplicating the last one on odd-length levels.
fn next_level(current: &[Hash256]) -> Vec<Hash256> {
    current
        .chunks(2)
        .map(|pair| hash_pair(&pair[0], pair.get(1).unwrap_or(&pair[0])))
        .collect()
}

/// Side on which a sibling sits when recomputing a parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Sibling is on the left side.
    Left,
    /// Sibling is on the right side.
    Right,
}

/// A merkle tree with every level retained, for inclusion proofs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleTree {
    /// Levels from the leaves (index 0) up to the level holding the root.
    ///
    /// A single leaf still gets a parent level, because the fold always
    /// hashes at least once.
    levels: Vec<Vec<Hash256>>,
}

impl MerkleTree {
    /// Build a tree over `leaves`.
    pub fn new(leaves: Vec<Hash256>) -> Self {
        let mut levels = vec![leaves];
        if levels[0].is_empty() {
            return Self { levels };
        }

        loop {
            let next = next_level(&levels[levels.len() - 1]);
            let done = next.len() == 1;
            levels.push(next);
            if done {
                break;
            }
        }

        Self { levels }
    }

    /// Root of the tree; all zeros for an empty tree.
    pub fn root(&self) -> Hash256 {
        match self.levels.last() {
            Some(top) if self.levels.len() > 1 => top[0].clone(),
            _ => Hash256::zero(),
        }
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.levels[0].len()
    }

    /// Whether the tree has no leaves.
    pub fn is_empty(&self) -> bool {
        self.levels[0].is_empty()
    }

    /// The leaves in order.
    pub fn leaves(&self) -> &[Hash256] {
        &self.levels[0]
    }

    /// Build an inclusion proof for the leaf at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::InvalidLeafIndex`] if `index` is out of bounds.
    pub fn generate_proof(&self, index: usize) -> Result<MerkleProof> {
        if index >= self.len() {
            return Err(ChainError::InvalidLeafIndex {
                index,
                size: self.len(),
            });
        }

        let mut siblings = Vec::with_capacity(self.levels.len() - 1);
        let mut position = index;

        for level in &self.levels[..self.levels.len() - 1] {
            let (sibling_position, direction) = if position % 2 == 0 {
                (position + 1, Direction::Right)
            } else {
                (position - 1, Direction::Left)
            };
            // Odd tail: the node was paired with itself.
            let sibling = level
                .get(sibling_position)
                .unwrap_or(&level[position])
                .clone();
            siblings.push((sibling, direction));
            position /= 2;
        }

        Ok(MerkleProof {
            leaf_hash: self.levels[0][index].clone(),
            leaf_index: index,
            siblings,
        })
    }
}

/// Proof that a leaf is included under a merkle root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// The proven leaf.
    pub leaf_hash: Hash256,
    /// Position of the leaf in the original ordering.
    pub leaf_index: usize,
    /// Sibling hashes from the leaf level upward.
    pub siblings: Vec<(Hash256, Direction)>,
}

impl MerkleProof {
    /// Root implied by this proof.
    pub fn compute_root(&self) -> Hash256 {
        self.siblings
            .iter()
            .fold(self.leaf_hash.clone(), |node, (sibling, direction)| {
                match direction {
                    Direction::Left => hash_pair(sibling, &node),
                    Direction::Right => hash_pair(&node, sibling),
                }
            })
    }

    /// Whether the proof leads to `root`.
    pub fn verify(&self, root: &Hash256) -> bool {
        !self.siblings.is_empty() && &self.compute_root() == root
    }
}
