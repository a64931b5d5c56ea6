//! Publishers approved for coalition fee sponsorship.
//!
//! Membership in the registry is the only authorization signal for
//! sponsorship. Approve and revoke are idempotent.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use tracing::info;

/// A publisher whose entry fees the coalition may pay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovedPublisher {
    /// Publisher address.
    pub address: String,
    /// Display name.
    pub name: String,
    /// When the publisher was approved.
    pub approved_at: DateTime<Utc>,
    /// Total fees the coalition has paid for this publisher.
    pub total_sponsored: BigUint,
}

/// Per-publisher sponsorship report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublisherStats {
    /// Publisher address.
    pub address: String,
    /// Display name.
    pub name: String,
    /// When the publisher was approved.
    pub approved_at: DateTime<Utc>,
    /// Total fees sponsored.
    pub total_sponsored: BigUint,
}

impl From<&ApprovedPublisher> for PublisherStats {
    fn from(publisher: &ApprovedPublisher) -> Self {
        Self {
            address: publisher.address.clone(),
            name: publisher.name.clone(),
            approved_at: publisher.approved_at,
            total_sponsored: publisher.total_sponsored.clone(),
        }
    }
}

/// Approved publishers keyed by address.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PublisherRegistry {
    publishers: BTreeMap<String, ApprovedPublisher>,
}

impl PublisherRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Approve `address` under `name`.
    ///
    /// Approving an already-approved publisher keeps the existing record,
    /// including its sponsored total.
    pub fn approve(&mut self, address: impl Into<String>, name: impl Into<String>) {
        let address = address.into();
        if self.publishers.contains_key(&address) {
            return;
        }

        let name = name.into();
        info!(publisher = %address, %name, "Publisher approved");
        self.publishers.insert(
            address.clone(),
            ApprovedPublisher {
                address,
                name,
                approved_at: Utc::now(),
                total_sponsored: BigUint::default(),
            },
        );
    }

    /// Revoke approval. Unknown addresses are ignored.
    ///
    /// Returns the removed record, if any.
    pub fn revoke(&mut self, address: &str) -> Option<ApprovedPublisher> {
        let removed = self.publishers.remove(address);
        if let Some(publisher) = &removed {
            info!(publisher = %address, name = %publisher.name, "Publisher approval revoked");
        }
        removed
    }

    /// Whether `address` is approved.
    pub fn is_approved(&self, address: &str) -> bool {
        self.publishers.contains_key(address)
    }

    /// Look up an approved publisher.
    pub fn get(&self, address: &str) -> Option<&ApprovedPublisher> {
        self.publishers.get(address)
    }

    pub(crate) fn get_mut(&mut self, address: &str) -> Option<&mut ApprovedPublisher> {
        self.publishers.get_mut(address)
    }

    /// Number of approved publishers.
    pub fn len(&self) -> usize {
        self.publishers.len()
    }

    /// Whether no publisher is approved.
    pub fn is_empty(&self) -> bool {
        self.publishers.is_empty()
    }

    /// Reports for every approved publisher, sorted by address.
    pub fn stats(&self) -> Vec<PublisherStats> {
        self.publishers.values().map(PublisherStats::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approve_and_revoke() {
        let mut registry = PublisherRegistry::new();
        assert!(!registry.is_approved("pub1"));

        registry.approve("pub1", "Daily News");
        assert!(registry.is_approved("pub1"));
        assert_eq!(registry.get("pub1").unwrap().name, "Daily News");

        let removed = registry.revoke("pub1").unwrap();
        assert_eq!(removed.address, "pub1");
        assert!(!registry.is_approved("pub1"));
    }

    #[test]
    fn test_approve_is_idempotent() {
        let mut registry = PublisherRegistry::new();
        registry.approve("pub1", "Daily News");
        registry.get_mut("pub1").unwrap().total_sponsored = BigUint::from(7u32);

        registry.approve("pub1", "Renamed");
        assert_eq!(registry.len(), 1);
        let publisher = registry.get("pub1").unwrap();
        assert_eq!(publisher.name, "Daily News");
        assert_eq!(publisher.total_sponsored, BigUint::from(7u32));
    }

    #[test]
    fn test_revoke_unknown_is_noop() {
        let mut registry = PublisherRegistry::new();
        registry.approve("pub1", "Daily News");
        assert!(registry.revoke("stranger").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_stats_sorted_by_address() {
        let mut registry = PublisherRegistry::new();
        registry.approve("zeta", "Z");
        registry.approve("alpha", "A");
        registry.approve("mid", "M");

        let addresses: Vec<String> = registry.stats().into_iter().map(|s| s.address).collect();
        assert_eq!(addresses, vec!["alpha", "mid", "zeta"]);
    }
}
