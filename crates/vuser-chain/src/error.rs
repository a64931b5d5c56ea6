//! Error types for ledger operations.

use thiserror::Error;
use vuser_crypto::Hash256;

use crate::election::RoundPhase;

/// Errors that can occur during ledger operations.
///
/// Every rejection maps to exactly one variant so callers can tell which
/// rule was violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// Candidate block index is not the successor of the chain tip.
    #[error("Invalid block index: expected {expected}, got {actual}")]
    IndexMismatch {
        /// Index the chain expected.
        expected: u64,
        /// Index carried by the candidate.
        actual: u64,
    },

    /// Candidate does not link to the hash of the chain tip.
    #[error("Previous hash mismatch: expected {expected}, got {actual}")]
    PreviousHashMismatch {
        /// Hash of the current tip.
        expected: Hash256,
        /// Previous hash carried by the candidate.
        actual: Hash256,
    },

    /// Stored block hash does not match the recomputed hash.
    #[error("Block hash integrity failure: stored {stored}, computed {computed}")]
    HashIntegrity {
        /// Hash stored in the candidate.
        stored: Hash256,
        /// Hash recomputed from the candidate's contents.
        computed: Hash256,
    },

    /// Block not found.
    #[error("Block not found at index {index}")]
    BlockNotFound {
        /// Requested block index.
        index: u64,
    },

    /// No proposals were submitted this round.
    #[error("Proposal pool is empty")]
    EmptyPool,

    /// Operation attempted in the wrong round phase.
    #[error("Invalid round phase: expected {expected}, found {actual}")]
    RoundPhase {
        /// Phase the operation requires.
        expected: RoundPhase,
        /// Phase the pool was in.
        actual: RoundPhase,
    },

    /// Miner is outside the participation window.
    #[error("Miner not eligible: {0}")]
    NotEligible(String),

    /// Sidechain block range is out of bounds or inverted.
    #[error("Invalid block range {start}-{end} for sidechain with {block_count} blocks")]
    InvalidRange {
        /// First block of the range.
        start: u64,
        /// Last block of the range (inclusive).
        end: u64,
        /// Number of blocks in the sidechain.
        block_count: u64,
    },

    /// Block range string could not be parsed.
    #[error("Malformed block range: {0:?}")]
    MalformedRange(String),

    /// Sidechain not found.
    #[error("Sidechain not found: {0}")]
    SidechainNotFound(String),

    /// A sidechain with this identifier already exists.
    #[error("Sidechain already exists: {0}")]
    SidechainExists(String),

    /// The entry fee has already been fixed.
    #[error("Entry fee already set")]
    FeeAlreadySet,

    /// The entry already carries a signature.
    #[error("Entry signature already attached")]
    SignatureAlreadyAttached,

    /// The entry's publisher and sponsorship have already been decided.
    #[error("Entry sponsorship already decided")]
    SponsorshipAlreadyDecided,

    /// A sidechain header's merkle root differs from the regenerated one.
    #[error("Header merkle root mismatch: claimed {claimed}, computed {computed}")]
    MerkleRootMismatch {
        /// Root carried by the header.
        claimed: Hash256,
        /// Root regenerated from the sidechain blocks.
        computed: Hash256,
    },

    /// A sidechain header's entry count differs from the regenerated one.
    #[error("Header entry count mismatch: claimed {claimed}, computed {computed}")]
    EntryCountMismatch {
        /// Count carried by the header.
        claimed: u64,
        /// Count regenerated from the sidechain blocks.
        computed: u64,
    },

    /// Merkle proof requested for a leaf that does not exist.
    #[error("Invalid leaf index {index} for tree of size {size}")]
    InvalidLeafIndex {
        /// Requested index.
        index: usize,
        /// Number of leaves.
        size: usize,
    },
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, ChainError>;
