//! Main chain storage and append-time validation.
//!
//! - [`BlockValidation`]: the three linkage/integrity rules
//! - [`Blockchain`]: append-only block sequence starting at genesis
//!
//! [`Blockchain::append`] is the only way a block enters the chain, and it
//! always runs [`BlockValidation::validate_block`] first. The rules are
//! checked in a fixed order and the first violation is reported:
//!
//! 1. index contiguity (`IndexMismatch`)
//! 2. previous-hash linkage (`PreviousHashMismatch`)
//! 3. hash integrity (`HashIntegrity`)
//!
//! ## Example
//!
//! ```
//! use vuser_chain::{Blockchain, LedgerEntry};
//!
//! let genesis_entry = LedgerEntry::new("0", "Treasury", 1_000u32, 0, "genesis");
//! let mut chain = Blockchain::with_genesis_timestamp(0, vec![genesis_entry]);
//!
//! let candidate = chain.generate_next(vec![], "miner-1", vec![]);
//! chain.append(candidate).unwrap();
//! assert_eq!(chain.height(), 1);
//! ```

use num_bigint::{BigInt, BigUint};
use tracing::{info, warn};
use vuser_crypto::Hash256;

use crate::block::Block;
use crate::entry::LedgerEntry;
use crate::sidechain::SidechainHeader;
use crate::{now_millis, ChainError, Result};

// ============================================================================
// Block Validation
// ============================================================================

/// Block validation rules.
///
/// All checks are pure; nothing here mutates chain state.
pub struct BlockValidation;

impl BlockValidation {
    /// Validate `candidate` as the successor of `previous`.
    ///
    /// # Errors
    ///
    /// - [`ChainError::IndexMismatch`] if `candidate.index != previous.index + 1`
    /// - [`ChainError::PreviousHashMismatch`] if the candidate does not link to `previous.hash`
    /// - [`ChainError::HashIntegrity`] if the stored hash differs from the recomputed one
    pub fn validate_block(candidate: &Block, previous: &Block) -> Result<()> {
        let expected_index = previous.index + 1;
        if candidate.index != expected_index {
            return Err(ChainError::IndexMismatch {
                expected: expected_index,
                actual: candidate.index,
            });
        }

        if candidate.previous_hash != previous.hash {
            return Err(ChainError::PreviousHashMismatch {
                expected: previous.hash.clone(),
                actual: candidate.previous_hash.clone(),
            });
        }

        let computed = candidate.compute_hash();
        if computed != candidate.hash {
            return Err(ChainError::HashIntegrity {
                stored: candidate.hash.clone(),
                computed,
            });
        }

        Ok(())
    }
}

// ============================================================================
// Blockchain
// ============================================================================

/// Append-only main chain. Index 0 is always the genesis block.
#[derive(Debug, Clone)]
pub struct Blockchain {
    blocks: Vec<Block>,
}

impl Blockchain {
    /// Create a chain whose genesis block carries `genesis_entries`,
    /// stamped with the current time.
    pub fn new(genesis_entries: Vec<LedgerEntry>) -> Self {
        Self::with_genesis_timestamp(now_millis(), genesis_entries)
    }

    /// Create a chain with a genesis block at `timestamp` (ms).
    pub fn with_genesis_timestamp(timestamp: u64, genesis_entries: Vec<LedgerEntry>) -> Self {
        let genesis = Block::genesis(timestamp, genesis_entries);
        info!(hash = %genesis.hash, entries = genesis.entries.len(), "Genesis block created");
        Self {
            blocks: vec![genesis],
        }
    }

    /// Create a chain from an existing genesis block.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::IndexMismatch`] if the block is not at index 0,
    /// [`ChainError::PreviousHashMismatch`] if it has a parent, or
    /// [`ChainError::HashIntegrity`] if its hash does not verify.
    pub fn with_genesis(genesis: Block) -> Result<Self> {
        if genesis.index != 0 {
            return Err(ChainError::IndexMismatch {
                expected: 0,
                actual: genesis.index,
            });
        }
        if !genesis.previous_hash.is_zero() {
            return Err(ChainError::PreviousHashMismatch {
                expected: Hash256::zero(),
                actual: genesis.previous_hash.clone(),
            });
        }
        let computed = genesis.compute_hash();
        if computed != genesis.hash {
            return Err(ChainError::HashIntegrity {
                stored: genesis.hash.clone(),
                computed,
            });
        }

        Ok(Self {
            blocks: vec![genesis],
        })
    }

    /// Build a candidate on top of the current tip.
    ///
    /// The candidate is not appended; pass it to [`Blockchain::append`].
    pub fn generate_next(
        &self,
        entries: Vec<LedgerEntry>,
        validator: impl Into<String>,
        anchored_headers: Vec<SidechainHeader>,
    ) -> Block {
        Block::generate(self.tip(), entries, validator, anchored_headers)
    }

    /// Validate `candidate` against the tip and append it.
    ///
    /// On failure the candidate is dropped and the chain is unchanged.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule; see [`BlockValidation::validate_block`].
    pub fn append(&mut self, candidate: Block) -> Result<&Block> {
        if let Err(e) = BlockValidation::validate_block(&candidate, self.tip()) {
            warn!(index = candidate.index, error = %e, "Rejected block");
            return Err(e);
        }

        info!(
            index = candidate.index,
            hash = %candidate.hash,
            validator = %candidate.validator,
            entries = candidate.entries.len(),
            anchored = candidate.anchored_headers.len(),
            "Block appended"
        );

        self.blocks.push(candidate);
        Ok(self.tip())
    }

    /// The most recent block.
    pub fn tip(&self) -> &Block {
        // The genesis block is never removed.
        &self.blocks[self.blocks.len() - 1]
    }

    /// The genesis block.
    pub fn genesis(&self) -> &Block {
        &self.blocks[0]
    }

    /// Hash of the genesis block.
    pub fn genesis_hash(&self) -> &Hash256 {
        &self.genesis().hash
    }

    /// Index of the tip.
    pub fn height(&self) -> u64 {
        self.tip().index
    }

    /// Number of blocks, genesis included.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Block at `index`.
    pub fn get_block(&self, index: u64) -> Option<&Block> {
        usize::try_from(index).ok().and_then(|i| self.blocks.get(i))
    }

    /// Block at `index`, or [`ChainError::BlockNotFound`].
    pub fn block(&self, index: u64) -> Result<&Block> {
        self.get_block(index)
            .ok_or(ChainError::BlockNotFound { index })
    }

    /// Iterate from genesis to tip.
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    /// Net amount received by `address` over every committed entry.
    ///
    /// Only transfer amounts count. Fees are never debited from the sender
    /// here, so a fee-paying sender's balance is overstated by its fees.
    pub fn balance_of(&self, address: &str) -> BigInt {
        let mut balance = BigInt::default();
        for entry in self.blocks.iter().flat_map(|b| b.entries.iter()) {
            if entry.sender() == address {
                balance -= BigInt::from(entry.amount().clone());
            }
            if entry.recipient() == address {
                balance += BigInt::from(entry.amount().clone());
            }
        }
        balance
    }

    /// Total amount moved by all committed entries.
    pub fn total_transferred(&self) -> BigUint {
        self.blocks
            .iter()
            .flat_map(|b| b.entries.iter())
            .fold(BigUint::default(), |acc, e| acc + e.amount())
    }

    /// Re-check every link of the chain.
    ///
    /// # Errors
    ///
    /// Returns the first violation found, walking from genesis.
    pub fn verify_chain(&self) -> Result<()> {
        let genesis = self.genesis();
        if !genesis.verify_hash() {
            return Err(ChainError::HashIntegrity {
                stored: genesis.hash.clone(),
                computed: genesis.compute_hash(),
            });
        }
        for pair in self.blocks.windows(2) {
            BlockValidation::validate_block(&pair[1], &pair[0])?;
        }
        Ok(())
    }
}
