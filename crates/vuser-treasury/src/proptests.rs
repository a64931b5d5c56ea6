//! Property-based tests for treasury accounting.

use num_bigint::BigUint;
use proptest::prelude::*;

use crate::{Coalition, TreasuryError};

#[derive(Debug, Clone)]
enum Op {
    Deposit(u64),
    Sponsor(u64),
    SponsorUnapproved(u64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u64..1_000).prop_map(Op::Deposit),
        (0u64..2_000).prop_map(Op::Sponsor),
        (0u64..100).prop_map(Op::SponsorUnapproved),
    ]
}

proptest! {
    #[test]
    fn prop_balance_is_received_minus_spent(initial in 0u64..1_000, ops in prop::collection::vec(op(), 0..50)) {
        let mut coalition = Coalition::new();
        coalition.initialize(BigUint::from(initial)).unwrap();
        coalition.approve_publisher("pub1", "Daily News");

        for op in ops {
            let before = coalition.treasury_stats().unwrap();
            let sponsored_before = coalition.publishers().get("pub1").unwrap().total_sponsored.clone();

            match op {
                Op::Deposit(amount) => {
                    coalition.deposit(BigUint::from(amount), "deposit").unwrap();
                }
                Op::Sponsor(fee) => {
                    let fee = BigUint::from(fee);
                    match coalition.sponsor_fee("pub1", &fee) {
                        Ok(()) => {
                            prop_assert!(before.balance >= fee);
                            let sponsored = &coalition.publishers().get("pub1").unwrap().total_sponsored;
                            prop_assert_eq!(sponsored, &(sponsored_before + &fee));
                        }
                        Err(TreasuryError::InsufficientFunds { .. }) => {
                            prop_assert!(before.balance < fee);
                            prop_assert_eq!(coalition.treasury_stats().unwrap(), before.clone());
                            prop_assert_eq!(
                                &coalition.publishers().get("pub1").unwrap().total_sponsored,
                                &sponsored_before
                            );
                        }
                        Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                    }
                }
                Op::SponsorUnapproved(fee) => {
                    let result = coalition.sponsor_fee("stranger", &BigUint::from(fee));
                    prop_assert!(matches!(result, Err(TreasuryError::PublisherNotApproved(_))));
                    prop_assert_eq!(coalition.treasury_stats().unwrap(), before.clone());
                }
            }

            let stats = coalition.treasury_stats().unwrap();
            prop_assert_eq!(&stats.balance, &(&stats.total_received - &stats.total_spent));
        }
    }
}
