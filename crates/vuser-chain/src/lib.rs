//! # vuser-chain
//!
//! Ledger layer for the Vuser Proof-of-Proposal network.
//!
//! Provides:
//! - Ledger entries with content-derived identifiers and size-based fees
//! - Main-chain blocks and append-time validation
//! - Proposal pool with random primary election and deterministic fallback
//! - Sidechains with merkle-rooted headers anchored into main-chain blocks
//! - Merkle roots and inclusion proofs
//!
//! All state is single-owner and in-memory. Callers that share a chain
//! across threads wrap it themselves.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod block;
pub mod chain;
pub mod config;
pub mod election;
pub mod entry;
pub mod error;
pub mod merkle;
pub mod sidechain;

#[cfg(test)]
mod proptests;

pub use block::Block;
pub use chain::{BlockValidation, Blockchain};
pub use config::{FeeSchedule, LedgerConfig, MAIN_CHAIN_ID};
pub use election::{EligibilityPool, Proposal, ProposalPool, RoundPhase};
pub use entry::{total_fees, LedgerEntry, Sponsorship};
pub use error::{ChainError, Result};
pub use merkle::{merkle_root, MerkleProof, MerkleTree};
pub use sidechain::{
    format_block_range, parse_block_range, Sidechain, SidechainBlock, SidechainHeader,
    SidechainRegistry, SidechainStats,
};

/// Current wall-clock time as unix milliseconds.
///
/// Clamped to zero for clocks set before the epoch.
pub fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
