//! Per-entry fee routing.
//!
//! An entry's fee is computed once and cached on the entry. If the entry was
//! submitted for a publisher that was approved at the time, the coalition
//! pays the fee through [`Coalition::sponsor_fee`]. Otherwise the sender owes
//! it; that debt is only recorded here and is not subtracted from any
//! balance.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vuser_chain::{FeeSchedule, LedgerEntry};

use crate::coalition::Coalition;
use crate::Result;

/// Who ended up paying an entry's fee.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeOutcome {
    /// The coalition treasury paid.
    Sponsored {
        /// Fee paid.
        fee: BigUint,
    },
    /// The sender owes the fee.
    SenderPays {
        /// Fee owed.
        fee: BigUint,
    },
}

impl FeeOutcome {
    /// The fee, whoever pays it.
    pub fn fee(&self) -> &BigUint {
        match self {
            FeeOutcome::Sponsored { fee } | FeeOutcome::SenderPays { fee } => fee,
        }
    }

    /// Whether the coalition paid.
    pub fn is_sponsored(&self) -> bool {
        matches!(self, FeeOutcome::Sponsored { .. })
    }
}

/// Record that `entry` was submitted for `publisher` and decide whether the
/// coalition will sponsor it, based on the publisher's approval right now.
///
/// An empty publisher address is never sponsored. Returns the decision.
///
/// # Errors
///
/// Returns a chain error if the entry's sponsorship was already decided.
pub fn set_publisher(entry: &mut LedgerEntry, publisher: &str, coalition: &Coalition) -> Result<bool> {
    let sponsored = !publisher.is_empty() && coalition.is_approved(publisher);
    entry.decide_sponsorship(publisher, sponsored)?;
    debug!(entry = %entry.id(), %publisher, sponsored, "Sponsorship decided");
    Ok(sponsored)
}

/// Settle the fee for `entry`.
///
/// Computes and caches the fee if it is not set yet. Sponsored entries are
/// charged to the coalition treasury; everything else is left to the sender.
///
/// # Errors
///
/// For sponsored entries, any refusal from [`Coalition::sponsor_fee`]. The
/// publisher may have been revoked since [`set_publisher`] ran.
pub fn process_transaction_fee(
    entry: &mut LedgerEntry,
    coalition: &mut Coalition,
    schedule: &FeeSchedule,
) -> Result<FeeOutcome> {
    let fee = entry.ensure_fee(schedule).clone();

    match entry.sponsorship() {
        Some(sponsorship) if sponsorship.sponsored => {
            coalition.sponsor_fee(&sponsorship.publisher, &fee)?;
            Ok(FeeOutcome::Sponsored { fee })
        }
        _ => Ok(FeeOutcome::SenderPays { fee }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TreasuryError;
    use vuser_chain::ChainError;

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    fn coalition() -> Coalition {
        let mut coalition = Coalition::new();
        coalition.initialize(big(1_000)).unwrap();
        coalition.approve_publisher("pub1", "Daily News");
        coalition
    }

    fn entry(payload_len: usize) -> LedgerEntry {
        LedgerEntry::new("reader", "pub1", 0u32, 0, vec![b'x'; payload_len])
    }

    #[test]
    fn test_set_publisher_approved() {
        let coalition = coalition();
        let mut e = entry(0);
        assert!(set_publisher(&mut e, "pub1", &coalition).unwrap());
        assert!(e.is_sponsored());
        assert_eq!(e.publisher(), Some("pub1"));
    }

    #[test]
    fn test_set_publisher_unapproved_or_empty() {
        let coalition = coalition();

        let mut e = entry(0);
        assert!(!set_publisher(&mut e, "stranger", &coalition).unwrap());
        assert!(!e.is_sponsored());

        let mut e = entry(0);
        assert!(!set_publisher(&mut e, "", &coalition).unwrap());
        assert!(!e.is_sponsored());
    }

    #[test]
    fn test_set_publisher_once() {
        let coalition = coalition();
        let mut e = entry(0);
        set_publisher(&mut e, "pub1", &coalition).unwrap();
        assert_eq!(
            set_publisher(&mut e, "pub1", &coalition),
            Err(TreasuryError::Chain(ChainError::SponsorshipAlreadyDecided))
        );
    }

    #[test]
    fn test_sponsored_fee_charged_to_treasury() {
        let mut coalition = coalition();
        let mut e = entry(250);
        set_publisher(&mut e, "pub1", &coalition).unwrap();

        let outcome =
            process_transaction_fee(&mut e, &mut coalition, &FeeSchedule::default()).unwrap();
        assert_eq!(outcome, FeeOutcome::Sponsored { fee: big(3) });
        assert_eq!(e.fee(), Some(&big(3)));
        assert_eq!(coalition.balance().unwrap(), &big(997));
        assert_eq!(
            coalition.publishers().get("pub1").unwrap().total_sponsored,
            big(3)
        );
    }

    #[test]
    fn test_unsponsored_fee_left_to_sender() {
        let mut coalition = coalition();
        let mut e = entry(99);

        let outcome =
            process_transaction_fee(&mut e, &mut coalition, &FeeSchedule::default()).unwrap();
        assert_eq!(outcome, FeeOutcome::SenderPays { fee: big(1) });
        assert!(!outcome.is_sponsored());
        assert_eq!(coalition.balance().unwrap(), &big(1_000));
    }

    #[test]
    fn test_cached_fee_is_reused() {
        let mut coalition = coalition();
        let mut e = entry(500);
        e.set_fee(big(42)).unwrap();

        let outcome =
            process_transaction_fee(&mut e, &mut coalition, &FeeSchedule::default()).unwrap();
        assert_eq!(outcome.fee(), &big(42));
    }

    #[test]
    fn test_revoked_between_decision_and_processing() {
        let mut coalition = coalition();
        let mut e = entry(0);
        set_publisher(&mut e, "pub1", &coalition).unwrap();
        coalition.revoke_publisher("pub1");

        assert_eq!(
            process_transaction_fee(&mut e, &mut coalition, &FeeSchedule::default()),
            Err(TreasuryError::PublisherNotApproved("pub1".to_string()))
        );
        assert_eq!(coalition.balance().unwrap(), &big(1_000));
    }
}
