//! Sidechains for batching micro-transactions off the main chain.
//!
//! A [`Sidechain`] is an independent append-only sequence of lightweight
//! [`SidechainBlock`]s. Blocks are appended without any linkage check; trust
//! is established when a [`SidechainHeader`] summarizing a block range is
//! generated and later verified by recomputation.
//!
//! ## Anchoring
//!
//! ```text
//! Sidechain "micro"           Main chain
//! ┌───┐ ┌───┐ ┌───┐
//! │ 0 │→│ 1 │→│ 2 │──header(0-2)──▶ Block N.anchored_headers
//! └───┘ └───┘ └───┘                 (merkle root folded into block hash)
//! ```
//!
//! Verification is "recompute and compare": it needs the full sidechain
//! data, not just the header.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use vuser_crypto::Hash256;

use crate::config::MAIN_CHAIN_ID;
use crate::entry::LedgerEntry;
use crate::merkle::{merkle_root, MerkleTree};
use crate::{now_millis, ChainError, Result};

/// Domain separator for sidechain block hashes.
const SIDECHAIN_BLOCK_DOMAIN: &[u8] = b"VUSER-SIDECHAIN-BLOCK-v1";

/// Validator recorded on every sidechain genesis block.
pub const SIDECHAIN_GENESIS_VALIDATOR: &str = "genesis";

// ============================================================================
// Sidechain Block
// ============================================================================

/// A lightweight block in a sidechain.
///
/// Same shape as a main-chain block, minus anchored headers. The validator
/// is a free-form label; sidechains take no part in leader election.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SidechainBlock {
    /// Position in the sidechain (genesis is 0).
    pub index: u64,
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
    /// Entries batched into this block.
    pub entries: Vec<LedgerEntry>,
    /// Hash of this block.
    pub hash: Hash256,
    /// Hash of the preceding block (all zeros for genesis).
    pub previous_hash: Hash256,
    /// Label of whoever produced the block.
    pub validator: String,
}

impl SidechainBlock {
    fn new(
        index: u64,
        timestamp: u64,
        entries: Vec<LedgerEntry>,
        previous_hash: Hash256,
        validator: String,
    ) -> Self {
        let hash = Self::compute_hash(index, timestamp, &entries, &previous_hash, &validator);
        Self {
            index,
            timestamp,
            entries,
            hash,
            previous_hash,
            validator,
        }
    }

    /// Compute a sidechain block hash from its components.
    pub fn compute_hash(
        index: u64,
        timestamp: u64,
        entries: &[LedgerEntry],
        previous_hash: &Hash256,
        validator: &str,
    ) -> Hash256 {
        let entry_ids: Vec<u8> = entries
            .iter()
            .flat_map(|e| e.id().to_bytes())
            .collect();

        Hash256::hash_many(&[
            SIDECHAIN_BLOCK_DOMAIN,
            &index.to_le_bytes(),
            &timestamp.to_le_bytes(),
            &entry_ids,
            previous_hash.as_bytes(),
            validator.as_bytes(),
        ])
    }

    /// Whether the stored hash matches the block contents.
    pub fn verify_hash(&self) -> bool {
        Self::compute_hash(
            self.index,
            self.timestamp,
            &self.entries,
            &self.previous_hash,
            &self.validator,
        ) == self.hash
    }
}

// ============================================================================
// Sidechain Header
// ============================================================================

/// Summary of a contiguous block range, anchored onto the main chain.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SidechainHeader {
    /// Sidechain the range belongs to.
    pub sidechain_id: String,
    /// Inclusive block range, formatted as `"start-end"`.
    pub block_range: String,
    /// Merkle root over every entry identifier in the range.
    pub merkle_root: Hash256,
    /// Number of entries in the range.
    pub entry_count: u64,
    /// Unix timestamp in milliseconds when the header was generated.
    pub timestamp: u64,
}

impl SidechainHeader {
    /// Parse the header's block range.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::MalformedRange`] if the range string is invalid.
    pub fn range(&self) -> Result<(u64, u64)> {
        parse_block_range(&self.block_range)
    }
}

/// Format an inclusive block range as `"start-end"`.
pub fn format_block_range(start: u64, end: u64) -> String {
    format!("{}-{}", start, end)
}

/// Parse a `"start-end"` block range.
///
/// Both bounds must be plain decimal integers. Ordering is not checked
/// here; that is the job of [`Sidechain::generate_header`].
///
/// # Errors
///
/// Returns [`ChainError::MalformedRange`] if the string does not have that
/// shape.
pub fn parse_block_range(range: &str) -> Result<(u64, u64)> {
    let malformed = || ChainError::MalformedRange(range.to_string());

    let (start, end) = range.split_once('-').ok_or_else(malformed)?;
    let parse = |s: &str| -> Result<u64> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        s.parse().map_err(|_| malformed())
    };

    Ok((parse(start)?, parse(end)?))
}

// ============================================================================
// Sidechain
// ============================================================================

/// Summary statistics for a sidechain.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SidechainStats {
    /// Sidechain identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Number of blocks, genesis included.
    pub total_blocks: usize,
    /// Number of entries across all blocks.
    pub total_entries: usize,
    /// When the sidechain was created.
    pub created_at: DateTime<Utc>,
}

/// An auxiliary append-only chain of lightweight blocks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Sidechain {
    id: String,
    name: String,
    parent_chain: String,
    blocks: Vec<SidechainBlock>,
    created_at: DateTime<Utc>,
}

impl Sidechain {
    /// Create a sidechain with a genesis block stamped with the current time.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_genesis_timestamp(id, name, now_millis())
    }

    /// Create a sidechain with a genesis block at `timestamp` (ms).
    pub fn with_genesis_timestamp(
        id: impl Into<String>,
        name: impl Into<String>,
        timestamp: u64,
    ) -> Self {
        let genesis = SidechainBlock::new(
            0,
            timestamp,
            Vec::new(),
            Hash256::zero(),
            SIDECHAIN_GENESIS_VALIDATOR.to_string(),
        );

        Self {
            id: id.into(),
            name: name.into(),
            parent_chain: MAIN_CHAIN_ID.to_string(),
            blocks: vec![genesis],
            created_at: Utc::now(),
        }
    }

    /// Append a block of entries on top of the current tip.
    ///
    /// Always succeeds; no linkage check is performed at this layer.
    pub fn append_block(
        &mut self,
        entries: Vec<LedgerEntry>,
        validator: impl Into<String>,
    ) -> &SidechainBlock {
        self.append_block_at(entries, validator, now_millis())
    }

    /// Append a block with an explicit timestamp (ms).
    pub fn append_block_at(
        &mut self,
        entries: Vec<LedgerEntry>,
        validator: impl Into<String>,
        timestamp: u64,
    ) -> &SidechainBlock {
        let tip = self.tip();
        let block = SidechainBlock::new(
            tip.index + 1,
            timestamp,
            entries,
            tip.hash.clone(),
            validator.into(),
        );

        debug!(
            sidechain = %self.id,
            index = block.index,
            entries = block.entries.len(),
            "Appended sidechain block"
        );

        self.blocks.push(block);
        &self.blocks[self.blocks.len() - 1]
    }

    /// Summarize blocks `start..=end` into a header.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::InvalidRange`] if `end` is past the tip or
    /// `start > end`.
    pub fn generate_header(&self, start: u64, end: u64) -> Result<SidechainHeader> {
        self.generate_header_at(start, end, now_millis())
    }

    /// Summarize a block range with an explicit header timestamp (ms).
    pub fn generate_header_at(&self, start: u64, end: u64, timestamp: u64) -> Result<SidechainHeader> {
        let leaves = self.range_leaves(start, end)?;

        Ok(SidechainHeader {
            sidechain_id: self.id.clone(),
            block_range: format_block_range(start, end),
            merkle_root: merkle_root(&leaves),
            entry_count: leaves.len() as u64,
            timestamp,
        })
    }

    /// Full merkle tree over a block range, for entry inclusion proofs.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::InvalidRange`] for an invalid range.
    pub fn merkle_tree(&self, start: u64, end: u64) -> Result<MerkleTree> {
        Ok(MerkleTree::new(self.range_leaves(start, end)?))
    }

    /// Entry identifiers across a block range, in block order then
    /// within-block order.
    fn range_leaves(&self, start: u64, end: u64) -> Result<Vec<Hash256>> {
        let block_count = self.blocks.len() as u64;
        if end >= block_count || start > end {
            return Err(ChainError::InvalidRange {
                start,
                end,
                block_count,
            });
        }

        Ok(self.blocks[start as usize..=end as usize]
            .iter()
            .flat_map(|block| block.entries.iter().map(|e| e.id().clone()))
            .collect())
    }

    /// Sidechain identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier of the chain this sidechain anchors into.
    pub fn parent_chain(&self) -> &str {
        &self.parent_chain
    }

    /// All blocks, genesis first.
    pub fn blocks(&self) -> &[SidechainBlock] {
        &self.blocks
    }

    /// Number of blocks, genesis included.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Most recent block.
    pub fn tip(&self) -> &SidechainBlock {
        // A sidechain always holds its genesis block.
        &self.blocks[self.blocks.len() - 1]
    }

    /// Creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Summary statistics.
    pub fn stats(&self) -> SidechainStats {
        SidechainStats {
            id: self.id.clone(),
            name: self.name.clone(),
            total_blocks: self.blocks.len(),
            total_entries: self.blocks.iter().map(|b| b.entries.len()).sum(),
            created_at: self.created_at,
        }
    }

    /// Total amount transferred across all blocks.
    pub fn total_value(&self) -> BigUint {
        self.blocks
            .iter()
            .flat_map(|b| b.entries.iter())
            .fold(BigUint::default(), |acc, e| acc + e.amount())
    }
}

// ============================================================================
// Sidechain Registry
// ============================================================================

/// Owns every sidechain of a ledger instance, keyed by identifier.
#[derive(Debug, Default)]
pub struct SidechainRegistry {
    sidechains: HashMap<String, Sidechain>,
}

impl SidechainRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a new sidechain.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::SidechainExists`] if the identifier is taken.
    pub fn create(&mut self, id: impl Into<String>, name: impl Into<String>) -> Result<&mut Sidechain> {
        self.insert(Sidechain::new(id, name))
    }

    /// Register an existing sidechain.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::SidechainExists`] if the identifier is taken.
    pub fn insert(&mut self, sidechain: Sidechain) -> Result<&mut Sidechain> {
        use std::collections::hash_map::Entry;

        match self.sidechains.entry(sidechain.id.clone()) {
            Entry::Occupied(_) => Err(ChainError::SidechainExists(sidechain.id)),
            Entry::Vacant(slot) => {
                debug!(sidechain = %sidechain.id, name = %sidechain.name, "Created sidechain");
                Ok(slot.insert(sidechain))
            }
        }
    }

    /// Look up a sidechain.
    pub fn get(&self, id: &str) -> Option<&Sidechain> {
        self.sidechains.get(id)
    }

    /// Look up a sidechain mutably.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Sidechain> {
        self.sidechains.get_mut(id)
    }

    /// Number of registered sidechains.
    pub fn len(&self) -> usize {
        self.sidechains.len()
    }

    /// Whether no sidechains are registered.
    pub fn is_empty(&self) -> bool {
        self.sidechains.is_empty()
    }

    /// Registered identifiers, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.sidechains.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Check a header against the live sidechain data.
    ///
    /// Returns `false` if the sidechain is unknown, the range string is
    /// malformed or out of bounds, or the regenerated merkle root or entry
    /// count differs from the header. [`SidechainRegistry::check_header`]
    /// reports which.
    pub fn verify_header(&self, header: &SidechainHeader) -> bool {
        match self.check_header(header) {
            Ok(()) => true,
            Err(reason) => {
                warn!(sidechain = %header.sidechain_id, range = %header.block_range, %reason, "Sidechain header rejected");
                false
            }
        }
    }

    /// Regenerate the header's range and compare.
    ///
    /// # Errors
    ///
    /// - [`ChainError::SidechainNotFound`] for an unknown sidechain
    /// - [`ChainError::MalformedRange`] or [`ChainError::InvalidRange`] for a
    ///   bad range
    /// - [`ChainError::MerkleRootMismatch`] if the entries changed
    /// - [`ChainError::EntryCountMismatch`] if only the count is off
    pub fn check_header(&self, header: &SidechainHeader) -> Result<()> {
        let sidechain = self
            .get(&header.sidechain_id)
            .ok_or_else(|| ChainError::SidechainNotFound(header.sidechain_id.clone()))?;
        let (start, end) = header.range()?;
        let regenerated = sidechain.generate_header_at(start, end, header.timestamp)?;

        if regenerated.merkle_root != header.merkle_root {
            return Err(ChainError::MerkleRootMismatch {
                claimed: header.merkle_root.clone(),
                computed: regenerated.merkle_root,
            });
        }
        if regenerated.entry_count != header.entry_count {
            return Err(ChainError::EntryCountMismatch {
                claimed: header.entry_count,
                computed: regenerated.entry_count,
            });
        }
        Ok(())
    }
}
