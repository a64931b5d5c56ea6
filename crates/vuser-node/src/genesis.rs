//! Coin parameters and the genesis allocation.

use num_bigint::BigUint;
use vuser_chain::LedgerEntry;

/// Coin name.
pub const COIN_NAME: &str = "Vuser Open Coin";

/// Coin ticker symbol.
pub const COIN_SYMBOL: &str = "VOC";

/// Decimal places of one coin.
pub const DECIMALS: u32 = 18;

/// Whole coins minted at genesis, as a power of ten.
pub const SUPPLY_EXPONENT: u32 = 80;

/// Address the genesis supply is minted from.
pub const GENESIS_SENDER: &str = "0";

/// Address holding the genesis supply.
pub const TREASURY_ADDRESS: &str = "Treasury";

/// Payload of the genesis entry.
pub const GENESIS_PAYLOAD: &str = "Genesis Coin Supply";

/// Total supply in base units: 10^(80 + 18).
pub fn total_supply() -> BigUint {
    num_traits::pow(BigUint::from(10u32), (SUPPLY_EXPONENT + DECIMALS) as usize)
}

/// The single entry carried by the genesis block.
pub fn genesis_entry() -> LedgerEntry {
    LedgerEntry::new(GENESIS_SENDER, TREASURY_ADDRESS, total_supply(), 0, GENESIS_PAYLOAD)
}
