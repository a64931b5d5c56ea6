//! VEP2 wallet approval registry.
//!
//! Each wallet holds at most one current approval token. A wallet is
//! authorized only while it is present in the registry and the presented
//! token matches the stored one exactly. Re-approving replaces the token;
//! revoking removes the entry with no history kept.

use std::collections::HashMap;

use tracing::{debug, info};
use vuser_crypto::Hash256;

/// Domain separator for approval tokens.
const APPROVAL_DOMAIN: &[u8] = b"VUSER-APPROVAL-v1";

/// Current approval token per wallet.
#[derive(Clone, Debug, Default)]
pub struct ApprovalRegistry {
    approvals: HashMap<String, Hash256>,
}

impl ApprovalRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Approve `wallet` and return its new token.
    pub fn approve(&mut self, wallet: &str) -> Hash256 {
        let now = chrono::Utc::now();
        let nanos = now.timestamp_nanos_opt().unwrap_or_else(|| now.timestamp_micros());
        self.approve_at(wallet, nanos)
    }

    /// Approve `wallet` with a token derived from `timestamp_nanos`.
    pub fn approve_at(&mut self, wallet: &str, timestamp_nanos: i64) -> Hash256 {
        let token = Hash256::hash_many(&[
            APPROVAL_DOMAIN,
            wallet.as_bytes(),
            &timestamp_nanos.to_le_bytes(),
        ]);
        info!(%wallet, %token, "Wallet approved");
        self.approvals.insert(wallet.to_string(), token.clone());
        token
    }

    /// Whether `wallet` is approved and `token` is its current token.
    pub fn is_approved(&self, wallet: &str, token: &Hash256) -> bool {
        match self.approvals.get(wallet) {
            Some(stored) => {
                let matches = stored == token;
                if !matches {
                    debug!(%wallet, "Approval token mismatch");
                }
                matches
            }
            None => {
                debug!(%wallet, "Wallet not approved");
                false
            }
        }
    }

    /// Check a token as a wallet presents it, in hex.
    ///
    /// Text that does not parse as a token is never approved.
    pub fn is_approved_hex(&self, wallet: &str, token: &str) -> bool {
        match Hash256::from_hex(token) {
            Ok(token) => self.is_approved(wallet, &token),
            Err(error) => {
                debug!(%wallet, %error, "Malformed approval token");
                false
            }
        }
    }

    /// Remove `wallet`'s approval. Returns whether it was approved.
    pub fn revoke(&mut self, wallet: &str) -> bool {
        let removed = self.approvals.remove(wallet).is_some();
        if removed {
            info!(%wallet, "Wallet approval revoked");
        }
        removed
    }

    /// Number of approved wallets.
    pub fn len(&self) -> usize {
        self.approvals.len()
    }

    /// Whether no wallet is approved.
    pub fn is_empty(&self) -> bool {
        self.approvals.is_empty()
    }
}
