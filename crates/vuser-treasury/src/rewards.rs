//! Block reward distribution.
//!
//! ```text
//! fee_pool = sum of entry fees (unset fees count as 0)
//! total    = block_generation_reward + fee_pool
//! share    = total / reward_split_ways
//! ```
//!
//! One share is credited to the validator (reported only, no ledger
//! mutation), one is deposited into the treasury, and one is burned. The
//! division remainder is dropped.

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use tracing::info;
use vuser_chain::{total_fees, LedgerConfig, LedgerEntry};

use crate::coalition::Coalition;
use crate::Result;

/// Purpose recorded on the treasury's reward deposit.
pub const REWARD_DEPOSIT_PURPOSE: &str = "Block Reward Share";

/// Validator, treasury and burn.
const RECIPIENTS: u64 = 3;

/// How one block's reward was split.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardDistribution {
    /// Validator the miner share is credited to.
    pub validator: String,
    /// Sum of the block's entry fees.
    pub fee_pool: BigUint,
    /// Generation reward plus fee pool.
    pub total: BigUint,
    /// Share nominally credited to the validator.
    pub miner_share: BigUint,
    /// Share deposited into the treasury.
    pub treasury_share: BigUint,
    /// Share removed from circulation.
    pub burned: BigUint,
    /// Part of `total` not covered by the shares; not paid to anyone.
    pub remainder: BigUint,
}

/// Split the reward for a block validated by `validator` over `entries`.
///
/// There are three recipients, so a `reward_split_ways` below three is
/// treated as three. Larger values leave the extra shares unpaid, and they
/// show up in [`RewardDistribution::remainder`].
///
/// # Errors
///
/// Returns [`crate::TreasuryError::Uninitialized`] if the treasury has not
/// been opened. Nothing is deposited in that case.
pub fn distribute_reward(
    coalition: &mut Coalition,
    validator: &str,
    entries: &[LedgerEntry],
    config: &LedgerConfig,
) -> Result<RewardDistribution> {
    let fee_pool = total_fees(entries);
    let total = BigUint::from(config.block_generation_reward) + &fee_pool;
    let share = &total / BigUint::from(config.reward_split_ways.max(RECIPIENTS));
    let remainder = &total - &share * RECIPIENTS;

    coalition.deposit(share.clone(), REWARD_DEPOSIT_PURPOSE)?;

    info!(
        %validator,
        %total,
        %share,
        burned = %share,
        "Block reward distributed"
    );

    Ok(RewardDistribution {
        validator: validator.to_string(),
        fee_pool,
        total,
        miner_share: share.clone(),
        treasury_share: share.clone(),
        burned: share,
        remainder,
    })
}

impl RewardDistribution {
    /// Whether some of the reward was lost to integer division.
    pub fn has_remainder(&self) -> bool {
        !self.remainder.is_zero()
    }
}
