//! The coalition treasury ledger.
//!
//! Tracks a balance plus cumulative received/spent totals and an
//! append-only activity log. The invariant
//! `balance == total_received - total_spent` holds after every operation,
//! and the balance never goes negative: a withdrawal that would overdraw is
//! refused before anything is touched.

use chrono::{DateTime, Utc};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::{Result, TreasuryError};

/// Purpose recorded for the initial allocation.
pub const GENESIS_ALLOCATION_PURPOSE: &str = "Genesis allocation";

/// Direction of a treasury movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreasuryTransactionKind {
    /// Funds flowing in.
    Deposit,
    /// Funds flowing out.
    Withdrawal,
}

impl std::fmt::Display for TreasuryTransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TreasuryTransactionKind::Deposit => write!(f, "deposit"),
            TreasuryTransactionKind::Withdrawal => write!(f, "withdrawal"),
        }
    }
}

/// One record in the treasury activity log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryLogEntry {
    /// Deposit or withdrawal.
    pub kind: TreasuryTransactionKind,
    /// Amount moved.
    pub amount: BigUint,
    /// Free-form reason.
    pub purpose: String,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
}

/// Snapshot of treasury totals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryStats {
    /// Current balance.
    pub balance: BigUint,
    /// Sum of all deposits, initial allocation included.
    pub total_received: BigUint,
    /// Sum of all withdrawals.
    pub total_spent: BigUint,
    /// Number of log entries.
    pub transaction_count: usize,
}

/// Balance and activity of the coalition treasury.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoalitionTreasury {
    balance: BigUint,
    total_received: BigUint,
    total_spent: BigUint,
    log: Vec<TreasuryLogEntry>,
}

impl CoalitionTreasury {
    /// Open a treasury holding `initial_balance`, logged as the genesis
    /// allocation.
    pub fn new(initial_balance: BigUint) -> Self {
        let mut treasury = Self {
            balance: BigUint::default(),
            total_received: BigUint::default(),
            total_spent: BigUint::default(),
            log: Vec::new(),
        };
        treasury.deposit(initial_balance, GENESIS_ALLOCATION_PURPOSE);
        treasury
    }

    /// Add funds.
    pub fn deposit(&mut self, amount: BigUint, purpose: impl Into<String>) {
        self.balance += &amount;
        self.total_received += &amount;
        self.record(TreasuryTransactionKind::Deposit, amount, purpose.into());
    }

    /// Remove funds.
    ///
    /// # Errors
    ///
    /// Returns [`TreasuryError::InsufficientFunds`] if `amount` exceeds the
    /// balance. Nothing is changed in that case.
    pub fn withdraw(&mut self, amount: BigUint, purpose: impl Into<String>) -> Result<()> {
        self.ensure_covers(&amount)?;
        self.balance -= &amount;
        self.total_spent += &amount;
        self.record(TreasuryTransactionKind::Withdrawal, amount, purpose.into());
        Ok(())
    }

    /// Check that the balance covers `amount` without withdrawing it.
    ///
    /// # Errors
    ///
    /// Returns [`TreasuryError::InsufficientFunds`] otherwise.
    pub fn ensure_covers(&self, amount: &BigUint) -> Result<()> {
        if &self.balance < amount {
            return Err(TreasuryError::InsufficientFunds {
                required: amount.clone(),
                available: self.balance.clone(),
            });
        }
        Ok(())
    }

    fn record(&mut self, kind: TreasuryTransactionKind, amount: BigUint, purpose: String) {
        self.log.push(TreasuryLogEntry {
            kind,
            amount,
            purpose,
            timestamp: Utc::now(),
        });
    }

    /// Current balance.
    pub fn balance(&self) -> &BigUint {
        &self.balance
    }

    /// Cumulative deposits.
    pub fn total_received(&self) -> &BigUint {
        &self.total_received
    }

    /// Cumulative withdrawals.
    pub fn total_spent(&self) -> &BigUint {
        &self.total_spent
    }

    /// Full activity log, oldest first.
    pub fn log(&self) -> &[TreasuryLogEntry] {
        &self.log
    }

    /// The last `limit` log entries, oldest first.
    pub fn recent(&self, limit: usize) -> &[TreasuryLogEntry] {
        &self.log[self.log.len().saturating_sub(limit)..]
    }

    /// Totals snapshot.
    pub fn stats(&self) -> TreasuryStats {
        TreasuryStats {
            balance: self.balance.clone(),
            total_received: self.total_received.clone(),
            total_spent: self.total_spent.clone(),
            transaction_count: self.log.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    #[test]
    fn test_new_logs_genesis_allocation() {
        let treasury = CoalitionTreasury::new(big(1000));
        assert_eq!(treasury.balance(), &big(1000));
        assert_eq!(treasury.total_received(), &big(1000));
        assert_eq!(treasury.total_spent(), &big(0));

        let log = treasury.log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].kind, TreasuryTransactionKind::Deposit);
        assert_eq!(log[0].purpose, GENESIS_ALLOCATION_PURPOSE);
    }

    #[test]
    fn test_deposit_and_withdraw() {
        let mut treasury = CoalitionTreasury::new(big(100));
        treasury.deposit(big(50), "Block Reward Share");
        treasury.withdraw(big(30), "fee").unwrap();

        assert_eq!(treasury.balance(), &big(120));
        assert_eq!(treasury.total_received(), &big(150));
        assert_eq!(treasury.total_spent(), &big(30));
        assert_eq!(treasury.log()[2].kind, TreasuryTransactionKind::Withdrawal);
    }

    #[test]
    fn test_overdraw_refused_without_mutation() {
        let mut treasury = CoalitionTreasury::new(big(10));
        let before = treasury.stats();

        assert_eq!(
            treasury.withdraw(big(11), "fee"),
            Err(TreasuryError::InsufficientFunds {
                required: big(11),
                available: big(10)
            })
        );
        assert_eq!(treasury.stats(), before);
    }

    #[test]
    fn test_withdraw_exact_balance() {
        let mut treasury = CoalitionTreasury::new(big(10));
        treasury.withdraw(big(10), "fee").unwrap();
        assert_eq!(treasury.balance(), &big(0));
    }

    #[test]
    fn test_recent() {
        let mut treasury = CoalitionTreasury::new(big(0));
        for i in 1..=5 {
            treasury.deposit(big(i), format!("d{}", i));
        }
        let recent = treasury.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].purpose, "d4");
        assert_eq!(recent[1].purpose, "d5");
        assert_eq!(treasury.recent(100).len(), 6);
        assert!(treasury.recent(0).is_empty());
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        let json = serde_json::to_string(&TreasuryTransactionKind::Withdrawal).unwrap();
        assert_eq!(json, "\"withdrawal\"");
    }
}
