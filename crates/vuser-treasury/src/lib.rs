//! # vuser-treasury
//!
//! Coalition economics for the Vuser ledger.
//!
//! Provides:
//! - Coalition treasury with an append-only activity log
//! - Approved-publisher registry and fee sponsorship
//! - Per-entry fee routing (coalition or sender)
//! - Block reward distribution
//! - VEP2 wallet approval registry

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod approvals;
pub mod coalition;
pub mod error;
pub mod publishers;
pub mod rewards;
pub mod sponsorship;
pub mod treasury;

#[cfg(test)]
mod proptests;

pub use approvals::ApprovalRegistry;
pub use coalition::Coalition;
pub use error::{Result, TreasuryError};
pub use publishers::{ApprovedPublisher, PublisherRegistry, PublisherStats};
pub use rewards::{distribute_reward, RewardDistribution, REWARD_DEPOSIT_PURPOSE};
pub use sponsorship::{process_transaction_fee, set_publisher, FeeOutcome};
pub use treasury::{
    CoalitionTreasury, TreasuryLogEntry, TreasuryStats, TreasuryTransactionKind,
    GENESIS_ALLOCATION_PURPOSE,
};
