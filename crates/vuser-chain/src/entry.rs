//! Ledger entries (transactions).
//!
//! A [`LedgerEntry`] is an immutable value transfer with an opaque payload.
//! Its identifier is content-derived:
//!
//! ```text
//! id = BLAKE3(VUSER-ENTRY-v1 || sender || recipient || amount || nonce || payload)
//! ```
//!
//! The fee and the publisher/sponsorship decision may each be set at most
//! once after construction. Neither they nor the attached signature feed
//! into the identifier.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use vuser_crypto::{Hash256, SignatureVerifier};

use crate::config::FeeSchedule;
use crate::{ChainError, Result};

/// Domain separator for entry identifiers.
const ENTRY_ID_DOMAIN: &[u8] = b"VUSER-ENTRY-v1";

/// Which publisher an entry was submitted for and whether the coalition
/// agreed to pay its fee.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sponsorship {
    /// Publisher address the entry was submitted for.
    pub publisher: String,
    /// Whether the coalition treasury pays the fee.
    pub sponsored: bool,
}

/// A single value-transfer / payload record.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerEntry {
    id: Hash256,
    sender: String,
    recipient: String,
    amount: BigUint,
    nonce: u64,
    payload: Vec<u8>,
    #[serde(default)]
    signature: Option<Vec<u8>>,
    #[serde(default)]
    sponsorship: Option<Sponsorship>,
    #[serde(default)]
    fee: Option<BigUint>,
}

impl LedgerEntry {
    /// Create a new entry and derive its identifier.
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: impl Into<BigUint>,
        nonce: u64,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        let sender = sender.into();
        let recipient = recipient.into();
        let amount = amount.into();
        let payload = payload.into();
        let id = Self::derive_id(&sender, &recipient, &amount, nonce, &payload);

        Self {
            id,
            sender,
            recipient,
            amount,
            nonce,
            payload,
            signature: None,
            sponsorship: None,
            fee: None,
        }
    }

    /// Derive an entry identifier from its content fields.
    pub fn derive_id(
        sender: &str,
        recipient: &str,
        amount: &BigUint,
        nonce: u64,
        payload: &[u8],
    ) -> Hash256 {
        Hash256::hash_many(&[
            ENTRY_ID_DOMAIN,
            sender.as_bytes(),
            recipient.as_bytes(),
            &amount.to_bytes_be(),
            &nonce.to_le_bytes(),
            payload,
        ])
    }

    /// Recompute the identifier from the current content.
    pub fn compute_id(&self) -> Hash256 {
        Self::derive_id(
            &self.sender,
            &self.recipient,
            &self.amount,
            self.nonce,
            &self.payload,
        )
    }

    /// Whether the stored identifier still matches the content.
    pub fn verify_id(&self) -> bool {
        self.compute_id() == self.id
    }

    /// Content-derived identifier.
    pub fn id(&self) -> &Hash256 {
        &self.id
    }

    /// Sender address.
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Recipient address.
    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    /// Transferred amount in base units.
    pub fn amount(&self) -> &BigUint {
        &self.amount
    }

    /// Sender-scoped nonce.
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Opaque payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    // ------------------------------------------------------------------
    // Fees
    // ------------------------------------------------------------------

    /// Fee this entry would be charged under `schedule`.
    ///
    /// Does not cache; see [`LedgerEntry::ensure_fee`].
    pub fn calculate_fee(&self, schedule: &FeeSchedule) -> BigUint {
        schedule.fee_for(self.payload.len())
    }

    /// The fixed fee, if one has been set.
    pub fn fee(&self) -> Option<&BigUint> {
        self.fee.as_ref()
    }

    /// Fix the fee explicitly.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::FeeAlreadySet`] if the fee was already fixed.
    pub fn set_fee(&mut self, fee: BigUint) -> Result<()> {
        if self.fee.is_some() {
            return Err(ChainError::FeeAlreadySet);
        }
        self.fee = Some(fee);
        Ok(())
    }

    /// Return the fee, computing and caching it on first use.
    pub fn ensure_fee(&mut self, schedule: &FeeSchedule) -> &BigUint {
        let payload_len = self.payload.len();
        self.fee.get_or_insert_with(|| schedule.fee_for(payload_len))
    }

    // ------------------------------------------------------------------
    // Sponsorship
    // ------------------------------------------------------------------

    /// Record the publisher this entry belongs to and whether its fee is
    /// sponsored.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::SponsorshipAlreadyDecided`] on a second call.
    pub fn decide_sponsorship(&mut self, publisher: impl Into<String>, sponsored: bool) -> Result<()> {
        if self.sponsorship.is_some() {
            return Err(ChainError::SponsorshipAlreadyDecided);
        }
        self.sponsorship = Some(Sponsorship {
            publisher: publisher.into(),
            sponsored,
        });
        Ok(())
    }

    /// Publisher address, if the entry was submitted for one.
    pub fn publisher(&self) -> Option<&str> {
        self.sponsorship.as_ref().map(|s| s.publisher.as_str())
    }

    /// Whether the coalition pays this entry's fee.
    pub fn is_sponsored(&self) -> bool {
        self.sponsorship.as_ref().is_some_and(|s| s.sponsored)
    }

    /// Full sponsorship decision, if made.
    pub fn sponsorship(&self) -> Option<&Sponsorship> {
        self.sponsorship.as_ref()
    }

    // ------------------------------------------------------------------
    // Signatures
    // ------------------------------------------------------------------

    /// Attach an opaque signature over the entry identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::SignatureAlreadyAttached`] if the entry is
    /// already signed.
    pub fn attach_signature(&mut self, signature: Vec<u8>) -> Result<()> {
        if self.signature.is_some() {
            return Err(ChainError::SignatureAlreadyAttached);
        }
        self.signature = Some(signature);
        Ok(())
    }

    /// Attached signature, if any.
    pub fn signature(&self) -> Option<&[u8]> {
        self.signature.as_deref()
    }

    /// Verify the attached signature over the identifier, using the sender
    /// address as the public key.
    ///
    /// Entries without a signature never verify.
    pub fn verify_signature(&self, verifier: &dyn SignatureVerifier) -> bool {
        match &self.signature {
            Some(signature) => verifier.verify(
                self.id.as_bytes(),
                signature,
                self.sender.as_bytes(),
            ),
            None => false,
        }
    }
}

/// Sum of the fixed fees of `entries`; entries without a fee count as zero.
pub fn total_fees<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>) -> BigUint {
    entries
        .into_iter()
        .filter_map(LedgerEntry::fee)
        .fold(BigUint::default(), |acc, fee| acc + fee)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vuser_crypto::PresenceVerifier;

    fn sample_entry(nonce: u64) -> LedgerEntry {
        LedgerEntry::new("alice", "bob", 10u32, nonce, "hello")
    }

    #[test]
    fn test_id_is_content_derived() {
        let a = sample_entry(0);
        let b = sample_entry(0);
        assert_eq!(a.id(), b.id());
        assert!(a.verify_id());
    }

    #[test]
    fn test_each_field_changes_id() {
        let base = sample_entry(0);
        let variants = [
            LedgerEntry::new("alicE", "bob", 10u32, 0, "hello"),
            LedgerEntry::new("alice", "bob2", 10u32, 0, "hello"),
            LedgerEntry::new("alice", "bob", 11u32, 0, "hello"),
            LedgerEntry::new("alice", "bob", 10u32, 1, "hello"),
            LedgerEntry::new("alice", "bob", 10u32, 0, "hello!"),
        ];
        for variant in &variants {
            assert_ne!(base.id(), variant.id());
        }
    }

    #[test]
    fn test_adjacent_field_shift_changes_id() {
        let a = LedgerEntry::new("ab", "c", 1u32, 0, "");
        let b = LedgerEntry::new("a", "bc", 1u32, 0, "");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_mutable_fields_do_not_affect_id() {
        let mut entry = sample_entry(3);
        let id = entry.id().clone();
        entry.set_fee(BigUint::from(4u32)).unwrap();
        entry.decide_sponsorship("publisher", true).unwrap();
        entry.attach_signature(vec![1, 2, 3]).unwrap();
        assert_eq!(entry.id(), &id);
        assert!(entry.verify_id());
    }

    #[test]
    fn test_fee_set_once() {
        let mut entry = sample_entry(0);
        entry.set_fee(BigUint::from(2u32)).unwrap();
        assert_eq!(
            entry.set_fee(BigUint::from(3u32)),
            Err(ChainError::FeeAlreadySet)
        );
        assert_eq!(entry.fee(), Some(&BigUint::from(2u32)));
    }

    #[test]
    fn test_ensure_fee_caches() {
        let mut entry = LedgerEntry::new("a", "b", 0u32, 0, vec![0u8; 250]);
        let schedule = FeeSchedule::default();
        assert_eq!(entry.fee(), None);
        assert_eq!(entry.ensure_fee(&schedule), &BigUint::from(3u32));

        // A different schedule must not re-price a cached fee.
        let pricier = FeeSchedule {
            base_fee: 100,
            bytes_per_fee_unit: 1,
        };
        assert_eq!(entry.ensure_fee(&pricier), &BigUint::from(3u32));
        assert_eq!(entry.set_fee(BigUint::from(1u32)), Err(ChainError::FeeAlreadySet));
    }

    #[test]
    fn test_sponsorship_decided_once() {
        let mut entry = sample_entry(0);
        assert!(!entry.is_sponsored());
        assert_eq!(entry.publisher(), None);

        entry.decide_sponsorship("news-co", true).unwrap();
        assert!(entry.is_sponsored());
        assert_eq!(entry.publisher(), Some("news-co"));

        assert_eq!(
            entry.decide_sponsorship("other", false),
            Err(ChainError::SponsorshipAlreadyDecided)
        );
        assert_eq!(entry.publisher(), Some("news-co"));
    }

    #[test]
    fn test_unsponsored_publisher() {
        let mut entry = sample_entry(0);
        entry.decide_sponsorship("unknown", false).unwrap();
        assert_eq!(entry.publisher(), Some("unknown"));
        assert!(!entry.is_sponsored());
    }

    #[test]
    fn test_signature_verification() {
        let mut entry = sample_entry(0);
        assert!(!entry.verify_signature(&PresenceVerifier));

        entry.attach_signature(Vec::new()).unwrap();
        assert!(!entry.verify_signature(&PresenceVerifier));

        let mut signed = sample_entry(1);
        signed.attach_signature(vec![0xde, 0xad]).unwrap();
        assert!(signed.verify_signature(&PresenceVerifier));
    }

    #[test]
    fn test_signature_attached_once() {
        let mut entry = sample_entry(0);
        entry.attach_signature(vec![0x01]).unwrap();
        assert_eq!(
            entry.attach_signature(vec![0x02]),
            Err(ChainError::SignatureAlreadyAttached)
        );
        assert_eq!(entry.signature(), Some(&[0x01][..]));
    }

    #[test]
    fn test_total_fees_skips_unpriced() {
        let mut a = sample_entry(0);
        let b = sample_entry(1);
        let mut c = sample_entry(2);
        a.set_fee(BigUint::from(2u32)).unwrap();
        c.set_fee(BigUint::from(5u32)).unwrap();
        assert_eq!(total_fees([&a, &b, &c]), BigUint::from(7u32));
        assert_eq!(total_fees(std::iter::empty::<&LedgerEntry>()), BigUint::default());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut entry = sample_entry(9);
        entry.set_fee(BigUint::from(1u32)).unwrap();
        let json = serde_json::to_string(&entry).unwrap();
        let back: LedgerEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
        assert!(back.verify_id());
    }
}
