//! The coalition: its treasury plus the approved-publisher registry.
//!
//! [`Coalition`] is the single owner of coalition state. The treasury starts
//! out absent; every money-moving operation before [`Coalition::initialize`]
//! is refused with [`TreasuryError::Uninitialized`] and changes nothing.

use num_bigint::BigUint;
use tracing::{debug, info, warn};

use crate::publishers::{ApprovedPublisher, PublisherRegistry, PublisherStats};
use crate::treasury::{CoalitionTreasury, TreasuryLogEntry, TreasuryStats};
use crate::{Result, TreasuryError};

/// Coalition treasury and sponsorship state.
#[derive(Clone, Debug, Default)]
pub struct Coalition {
    treasury: Option<CoalitionTreasury>,
    publishers: PublisherRegistry,
}

impl Coalition {
    /// Create a coalition with no treasury and no approved publishers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the treasury with `initial_balance`.
    ///
    /// # Errors
    ///
    /// Returns [`TreasuryError::AlreadyInitialized`] on a second call.
    pub fn initialize(&mut self, initial_balance: BigUint) -> Result<()> {
        if self.treasury.is_some() {
            return Err(TreasuryError::AlreadyInitialized);
        }
        info!(balance = %initial_balance, "Coalition treasury initialized");
        self.treasury = Some(CoalitionTreasury::new(initial_balance));
        Ok(())
    }

    /// Whether the treasury has been opened.
    pub fn is_initialized(&self) -> bool {
        self.treasury.is_some()
    }

    /// The treasury.
    ///
    /// # Errors
    ///
    /// Returns [`TreasuryError::Uninitialized`] before initialization.
    pub fn treasury(&self) -> Result<&CoalitionTreasury> {
        self.treasury.as_ref().ok_or(TreasuryError::Uninitialized)
    }

    /// Current treasury balance.
    ///
    /// # Errors
    ///
    /// Returns [`TreasuryError::Uninitialized`] before initialization.
    pub fn balance(&self) -> Result<&BigUint> {
        Ok(self.treasury()?.balance())
    }

    /// Add funds to the treasury.
    ///
    /// # Errors
    ///
    /// Returns [`TreasuryError::Uninitialized`] before initialization.
    pub fn deposit(&mut self, amount: BigUint, purpose: impl Into<String>) -> Result<()> {
        let treasury = self.treasury.as_mut().ok_or(TreasuryError::Uninitialized)?;
        let purpose = purpose.into();
        debug!(%amount, %purpose, "Treasury deposit");
        treasury.deposit(amount, purpose);
        Ok(())
    }

    // ========================================================================
    // Publishers
    // ========================================================================

    /// Approve a publisher for sponsorship.
    pub fn approve_publisher(&mut self, address: impl Into<String>, name: impl Into<String>) {
        self.publishers.approve(address, name);
    }

    /// Revoke a publisher's approval. Unknown addresses are ignored.
    pub fn revoke_publisher(&mut self, address: &str) -> Option<ApprovedPublisher> {
        self.publishers.revoke(address)
    }

    /// Whether `address` is an approved publisher.
    pub fn is_approved(&self, address: &str) -> bool {
        self.publishers.is_approved(address)
    }

    /// The approved-publisher registry.
    pub fn publishers(&self) -> &PublisherRegistry {
        &self.publishers
    }

    // ========================================================================
    // Sponsorship
    // ========================================================================

    /// Pay `fee` from the treasury on behalf of `publisher`.
    ///
    /// On success the balance drops by `fee`, and both the treasury's spent
    /// total and the publisher's sponsored total rise by `fee`. On failure
    /// none of the three change.
    ///
    /// # Errors
    ///
    /// - [`TreasuryError::Uninitialized`] before initialization
    /// - [`TreasuryError::PublisherNotApproved`] if `publisher` is not approved
    /// - [`TreasuryError::InsufficientFunds`] if the balance is below `fee`
    pub fn sponsor_fee(&mut self, publisher: &str, fee: &BigUint) -> Result<()> {
        let treasury = self.treasury.as_mut().ok_or(TreasuryError::Uninitialized)?;
        let Some(approved) = self.publishers.get_mut(publisher) else {
            warn!(%publisher, "Sponsorship refused: publisher not approved");
            return Err(TreasuryError::PublisherNotApproved(publisher.to_string()));
        };

        if let Err(e) = treasury.withdraw(fee.clone(), format!("Fee sponsorship for {}", approved.name)) {
            warn!(%publisher, %fee, error = %e, "Sponsorship refused");
            return Err(e);
        }
        approved.total_sponsored += fee;

        info!(
            %publisher,
            %fee,
            balance = %treasury.balance(),
            "Fee sponsored"
        );
        Ok(())
    }

    // ========================================================================
    // Reporting
    // ========================================================================

    /// Treasury totals.
    ///
    /// # Errors
    ///
    /// Returns [`TreasuryError::Uninitialized`] before initialization.
    pub fn treasury_stats(&self) -> Result<TreasuryStats> {
        Ok(self.treasury()?.stats())
    }

    /// Per-publisher reports, sorted by address.
    pub fn publisher_stats(&self) -> Vec<PublisherStats> {
        self.publishers.stats()
    }

    /// The last `limit` treasury log entries, oldest first.
    ///
    /// Empty before initialization.
    pub fn recent_activity(&self, limit: usize) -> &[TreasuryLogEntry] {
        match &self.treasury {
            Some(treasury) => treasury.recent(limit),
            None => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::treasury::{TreasuryTransactionKind, GENESIS_ALLOCATION_PURPOSE};

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    fn funded(balance: u64) -> Coalition {
        let mut coalition = Coalition::new();
        coalition.initialize(big(balance)).unwrap();
        coalition.approve_publisher("pub1", "Daily News");
        coalition
    }

    // ==================== Initialization ====================

    #[test]
    fn test_uninitialized_refuses_everything() {
        let mut coalition = Coalition::new();
        coalition.approve_publisher("pub1", "Daily News");

        assert_eq!(coalition.deposit(big(5), "x"), Err(TreasuryError::Uninitialized));
        assert_eq!(
            coalition.sponsor_fee("pub1", &big(1)),
            Err(TreasuryError::Uninitialized)
        );
        assert_eq!(coalition.balance(), Err(TreasuryError::Uninitialized));
        assert_eq!(coalition.treasury_stats(), Err(TreasuryError::Uninitialized));
        assert!(coalition.recent_activity(10).is_empty());
        assert_eq!(
            coalition.publishers().get("pub1").unwrap().total_sponsored,
            big(0)
        );
    }

    #[test]
    fn test_initialize_once() {
        let mut coalition = Coalition::new();
        coalition.initialize(big(100)).unwrap();
        assert!(coalition.is_initialized());
        assert_eq!(
            coalition.initialize(big(5)),
            Err(TreasuryError::AlreadyInitialized)
        );
        assert_eq!(coalition.balance().unwrap(), &big(100));

        let activity = coalition.recent_activity(10);
        assert_eq!(activity.len(), 1);
        assert_eq!(activity[0].purpose, GENESIS_ALLOCATION_PURPOSE);
    }

    // ==================== Sponsorship ====================

    #[test]
    fn test_sponsor_fee_updates_all_counters() {
        let mut coalition = funded(100);
        coalition.sponsor_fee("pub1", &big(3)).unwrap();

        let stats = coalition.treasury_stats().unwrap();
        assert_eq!(stats.balance, big(97));
        assert_eq!(stats.total_spent, big(3));
        assert_eq!(stats.transaction_count, 2);
        assert_eq!(
            coalition.publishers().get("pub1").unwrap().total_sponsored,
            big(3)
        );

        let last = &coalition.recent_activity(1)[0];
        assert_eq!(last.kind, TreasuryTransactionKind::Withdrawal);
        assert_eq!(last.purpose, "Fee sponsorship for Daily News");
    }

    #[test]
    fn test_sponsor_fee_unapproved_publisher() {
        let mut coalition = funded(100);
        let before = coalition.treasury_stats().unwrap();

        assert_eq!(
            coalition.sponsor_fee("stranger", &big(3)),
            Err(TreasuryError::PublisherNotApproved("stranger".to_string()))
        );
        assert_eq!(coalition.treasury_stats().unwrap(), before);
    }

    #[test]
    fn test_sponsor_fee_insufficient_funds_changes_nothing() {
        let mut coalition = funded(2);
        let before = coalition.treasury_stats().unwrap();

        assert_eq!(
            coalition.sponsor_fee("pub1", &big(3)),
            Err(TreasuryError::InsufficientFunds {
                required: big(3),
                available: big(2)
            })
        );
        assert_eq!(coalition.treasury_stats().unwrap(), before);
        assert_eq!(
            coalition.publishers().get("pub1").unwrap().total_sponsored,
            big(0)
        );
    }

    #[test]
    fn test_revoked_publisher_refused() {
        let mut coalition = funded(100);
        coalition.sponsor_fee("pub1", &big(1)).unwrap();
        coalition.revoke_publisher("pub1");

        assert!(matches!(
            coalition.sponsor_fee("pub1", &big(1)),
            Err(TreasuryError::PublisherNotApproved(_))
        ));
        assert_eq!(coalition.balance().unwrap(), &big(99));
    }

    // ==================== Reporting ====================

    #[test]
    fn test_balance_invariant_after_mixed_activity() {
        let mut coalition = funded(10);
        coalition.deposit(big(4), "Block Reward Share").unwrap();
        coalition.sponsor_fee("pub1", &big(6)).unwrap();
        let _ = coalition.sponsor_fee("pub1", &big(100));

        let stats = coalition.treasury_stats().unwrap();
        assert_eq!(stats.balance, &stats.total_received - &stats.total_spent);
        assert_eq!(stats.balance, big(8));
    }
}
