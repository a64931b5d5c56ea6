//! Main-chain blocks.
//!
//! ## Block Structure
//!
//! ```text
//! Block
//! ├── index            (0 for genesis, +1 per block)
//! ├── timestamp        (unix ms)
//! ├── entries          (ordered LedgerEntry sequence)
//! ├── hash             (computed)
//! ├── previous_hash    (all zeros for genesis)
//! ├── validator        (address of the elected proposer)
//! └── anchored_headers (sidechain headers bound into this block)
//! ```
//!
//! ## Hashing
//!
//! ```text
//! hash = BLAKE3(VUSER-BLOCK-v1 || index || timestamp || entry ids
//!               || previous_hash || validator || anchored merkle roots)
//! ```
//!
//! Folding each anchored header's merkle root into the block hash binds the
//! summarized sidechain state into main-chain integrity.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use vuser_crypto::Hash256;

use crate::entry::{total_fees, LedgerEntry};
use crate::now_millis;
use crate::sidechain::SidechainHeader;

/// Domain separator for block hash computation.
const BLOCK_HASH_DOMAIN: &[u8] = b"VUSER-BLOCK-v1";

/// Validator recorded on the main-chain genesis block.
pub const GENESIS_VALIDATOR: &str = "";

/// A main-chain block.
///
/// Blocks are built once by [`Block::generate`] (or [`Block::genesis`]) and
/// never modified afterwards. Only [`crate::chain::Blockchain::append`]
/// decides whether a block becomes part of the chain.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
    /// Position in the chain.
    pub index: u64,

    /// Unix timestamp in milliseconds when the block was generated.
    pub timestamp: u64,

    /// Entries committed by this block, in order.
    pub entries: Vec<LedgerEntry>,

    /// Hash over the block contents.
    pub hash: Hash256,

    /// Hash of the preceding block (all zeros for genesis).
    pub previous_hash: Hash256,

    /// Address of the proposer that produced the block.
    pub validator: String,

    /// Sidechain headers anchored by this block.
    #[serde(default)]
    pub anchored_headers: Vec<SidechainHeader>,
}

impl Block {
    /// Create the genesis block.
    pub fn genesis(timestamp: u64, entries: Vec<LedgerEntry>) -> Self {
        Self::assemble(
            0,
            timestamp,
            entries,
            Hash256::zero(),
            GENESIS_VALIDATOR.to_string(),
            Vec::new(),
        )
    }

    /// Build the successor of `previous`, stamped with the current time.
    ///
    /// The result is not validated or appended.
    pub fn generate(
        previous: &Block,
        entries: Vec<LedgerEntry>,
        validator: impl Into<String>,
        anchored_headers: Vec<SidechainHeader>,
    ) -> Self {
        Self::generate_at(previous, entries, validator, anchored_headers, now_millis())
    }

    /// Build the successor of `previous` with an explicit timestamp (ms).
    pub fn generate_at(
        previous: &Block,
        entries: Vec<LedgerEntry>,
        validator: impl Into<String>,
        anchored_headers: Vec<SidechainHeader>,
        timestamp: u64,
    ) -> Self {
        Self::assemble(
            previous.index + 1,
            timestamp,
            entries,
            previous.hash.clone(),
            validator.into(),
            anchored_headers,
        )
    }

    fn assemble(
        index: u64,
        timestamp: u64,
        entries: Vec<LedgerEntry>,
        previous_hash: Hash256,
        validator: String,
        anchored_headers: Vec<SidechainHeader>,
    ) -> Self {
        let mut block = Self {
            index,
            timestamp,
            entries,
            hash: Hash256::zero(),
            previous_hash,
            validator,
            anchored_headers,
        };
        block.hash = block.compute_hash();
        block
    }

    /// Recompute the hash from the block's current contents.
    pub fn compute_hash(&self) -> Hash256 {
        let entry_ids: Vec<u8> = self
            .entries
            .iter()
            .flat_map(|e| e.id().to_bytes())
            .collect();
        let anchored_roots: Vec<u8> = self
            .anchored_headers
            .iter()
            .flat_map(|h| h.merkle_root.to_bytes())
            .collect();

        Hash256::hash_many(&[
            BLOCK_HASH_DOMAIN,
            &self.index.to_le_bytes(),
            &self.timestamp.to_le_bytes(),
            &entry_ids,
            self.previous_hash.as_bytes(),
            self.validator.as_bytes(),
            &anchored_roots,
        ])
    }

    /// Whether the stored hash matches the contents.
    pub fn verify_hash(&self) -> bool {
        self.compute_hash() == self.hash
    }

    /// Whether this is a genesis block.
    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.previous_hash.is_zero()
    }

    /// Sum of the fixed fees of this block's entries.
    pub fn total_fees(&self) -> BigUint {
        total_fees(&self.entries)
    }
}
