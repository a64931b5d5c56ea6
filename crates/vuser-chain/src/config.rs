//! Ledger configuration.
//!
//! This module provides the [`LedgerConfig`] struct and the [`FeeSchedule`]
//! used to price entries.
//!
//! ## Default Configuration
//!
//! - base fee of 1 base unit
//! - 1 extra base unit per full 100 payload bytes
//! - 9 base units minted per block, split three ways
//! - eligibility window of the 100 most recent unique senders
//!
//! ## Example
//!
//! ```
//! use vuser_chain::config::{FeeSchedule, LedgerConfig};
//!
//! let config = LedgerConfig {
//!     fees: FeeSchedule { base_fee: 2, bytes_per_fee_unit: 50 },
//!     ..LedgerConfig::default()
//! };
//! assert_eq!(config.block_generation_reward, 9);
//! ```

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

/// Default flat fee charged on every entry, in base units.
pub const DEFAULT_BASE_FEE: u64 = 1;

/// Default number of payload bytes that cost one extra base unit.
pub const DEFAULT_BYTES_PER_FEE_UNIT: u64 = 100;

/// Default amount minted for every generated block, in base units.
pub const DEFAULT_BLOCK_GENERATION_REWARD: u64 = 9;

/// Number of equal shares a block reward is split into
/// (validator, treasury, burn).
pub const DEFAULT_REWARD_SPLIT_WAYS: u64 = 3;

/// Default number of recent unique senders eligible to propose.
pub const DEFAULT_ELIGIBILITY_WINDOW: usize = 100;

/// Parent-chain reference recorded on every sidechain.
pub const MAIN_CHAIN_ID: &str = "vuser-mainchain";

/// How entry fees are priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Flat fee charged on every entry.
    pub base_fee: u64,

    /// Payload bytes per additional fee unit (integer division).
    ///
    /// A value of 0 disables the size surcharge.
    pub bytes_per_fee_unit: u64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            base_fee: DEFAULT_BASE_FEE,
            bytes_per_fee_unit: DEFAULT_BYTES_PER_FEE_UNIT,
        }
    }
}

impl FeeSchedule {
    /// Fee for a payload of `payload_len` bytes.
    pub fn fee_for(&self, payload_len: usize) -> BigUint {
        let surcharge = match self.bytes_per_fee_unit {
            0 => 0,
            unit => payload_len as u64 / unit,
        };
        BigUint::from(self.base_fee) + BigUint::from(surcharge)
    }
}

/// Economic and consensus parameters of a ledger instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Entry fee pricing.
    pub fees: FeeSchedule,

    /// Amount minted per block before fees are added.
    pub block_generation_reward: u64,

    /// Number of equal shares the block reward is divided into.
    ///
    /// Any remainder of the integer division is dropped.
    pub reward_split_ways: u64,

    /// Size of the proof-of-participation eligibility window.
    pub eligibility_window: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            fees: FeeSchedule::default(),
            block_generation_reward: DEFAULT_BLOCK_GENERATION_REWARD,
            reward_split_ways: DEFAULT_REWARD_SPLIT_WAYS,
            eligibility_window: DEFAULT_ELIGIBILITY_WINDOW,
        }
    }
}

impl LedgerConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fee_schedule() {
        let fees = FeeSchedule::default();
        assert_eq!(fees.fee_for(0), BigUint::from(1u32));
        assert_eq!(fees.fee_for(99), BigUint::from(1u32));
        assert_eq!(fees.fee_for(100), BigUint::from(2u32));
        assert_eq!(fees.fee_for(250), BigUint::from(3u32));
    }

    #[test]
    fn test_zero_unit_disables_surcharge() {
        let fees = FeeSchedule {
            base_fee: 5,
            bytes_per_fee_unit: 0,
        };
        assert_eq!(fees.fee_for(10_000), BigUint::from(5u32));
    }

    #[test]
    fn test_default_config() {
        let config = LedgerConfig::new();
        assert_eq!(config.block_generation_reward, DEFAULT_BLOCK_GENERATION_REWARD);
        assert_eq!(config.reward_split_ways, 3);
        assert_eq!(config.eligibility_window, 100);
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = LedgerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: LedgerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
