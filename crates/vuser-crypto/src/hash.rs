//! Ledger digests.
//!
//! Every identifier in the ledger (entry ids, block and sidechain block
//! hashes, merkle nodes, VEP2 approval tokens) is a [`Hash256`]. Digests are
//! built with [`Hash256::hash_many`], which writes each field's length
//! before its bytes so moving a byte from one field into its neighbour
//! always yields a different digest.
//!
//! The all-zero digest stands in for "no hash": a genesis block's previous
//! hash and the merkle root of an empty block range.

use std::fmt;

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::{CryptoError, Result};

/// Hex digits in a rendered digest.
const HEX_LEN: usize = 64;

/// A 32-byte BLAKE3 digest.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Hash256([u8; 32]);

impl Hash256 {
    /// The "no hash" sentinel.
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Digest of a single byte string.
    pub fn hash(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Digest of a sequence of fields, each prefixed with its length.
    pub fn hash_many(fields: &[&[u8]]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for field in fields {
            hasher.update(&(field.len() as u64).to_le_bytes());
            hasher.update(field);
        }
        Self(*hasher.finalize().as_bytes())
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Owned copy of the digest bytes, for concatenating into a parent
    /// digest.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }

    /// Whether this is the "no hash" sentinel.
    pub fn is_zero(&self) -> bool {
        self.0.ct_eq(&[0u8; 32]).into()
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|byte| format!("{:02x}", byte)).collect()
    }

    /// Parse a digest a client presented as 64 hex digits (either case).
    ///
    /// # Errors
    ///
    /// [`CryptoError::InvalidHashLength`] when the text is not 64 bytes long
    /// and [`CryptoError::InvalidHexFormat`] when it contains a non-hex
    /// character.
    pub fn from_hex(text: &str) -> Result<Self> {
        if text.len() != HEX_LEN {
            return Err(CryptoError::InvalidHashLength {
                expected: HEX_LEN,
                actual: text.len(),
            });
        }

        let mut digest = [0u8; 32];
        for (slot, pair) in digest.iter_mut().zip(text.as_bytes().chunks_exact(2)) {
            *slot = (nibble(pair[0])? << 4) | nibble(pair[1])?;
        }
        Ok(Self(digest))
    }
}

fn nibble(c: u8) -> Result<u8> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(CryptoError::InvalidHexFormat(format!(
            "unexpected byte 0x{:02x}",
            c
        ))),
    }
}

impl ConstantTimeEq for Hash256 {
    fn ct_eq(&self, other: &Self) -> subtle::Choice {
        self.0.ct_eq(&other.0)
    }
}

impl PartialEq for Hash256 {
    fn eq(&self, other: &Self) -> bool {
        // Approval tokens are compared through this impl.
        self.ct_eq(other).into()
    }
}

impl Eq for Hash256 {}

impl std::hash::Hash for Hash256 {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({}..)", &self.to_hex()[..12])
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_sentinel() {
        assert!(Hash256::zero().is_zero());
        assert_eq!(Hash256::default(), Hash256::zero());
        assert_eq!(Hash256::zero().to_string(), "0".repeat(64));
        assert!(!Hash256::hash(b"").is_zero());
        assert!(!Hash256::hash_many(&[]).is_zero());
    }

    #[test]
    fn test_field_boundary_shift_changes_digest() {
        let entry = Hash256::hash_many(&[b"alice", b"bob"]);
        assert_ne!(entry, Hash256::hash_many(&[b"alic", b"ebob"]));
        assert_ne!(entry, Hash256::hash_many(&[b"alicebob"]));
        assert_ne!(entry, Hash256::hash_many(&[b"alice", b"bob", b""]));
        assert_eq!(entry, Hash256::hash_many(&[b"alice", b"bob"]));
    }

    #[test]
    fn test_domain_prefix_separates_digests() {
        let as_entry = Hash256::hash_many(&[b"VUSER-ENTRY-v1", b"payload"]);
        let as_block = Hash256::hash_many(&[b"VUSER-BLOCK-v1", b"payload"]);
        assert_ne!(as_entry, as_block);
    }

    #[test]
    fn test_token_equality() {
        let token = Hash256::hash_many(&[b"VUSER-APPROVAL-v1", b"wallet-1"]);
        let same = Hash256::hash_many(&[b"VUSER-APPROVAL-v1", b"wallet-1"]);
        let other = Hash256::hash_many(&[b"VUSER-APPROVAL-v1", b"wallet-2"]);
        assert_eq!(token, same);
        assert_ne!(token, other);
        assert!(bool::from(token.ct_eq(&same)));
    }

    #[test]
    fn test_presented_token_parses_in_either_case() {
        let token = Hash256::hash(b"token");
        assert_eq!(Hash256::from_hex(&token.to_hex()).unwrap(), token);
        assert_eq!(
            Hash256::from_hex(&token.to_hex().to_uppercase()).unwrap(),
            token
        );
    }

    #[test]
    fn test_malformed_token_text() {
        assert_eq!(
            Hash256::from_hex("deadbeef"),
            Err(CryptoError::InvalidHashLength {
                expected: 64,
                actual: 8
            })
        );
        let mut text = Hash256::hash(b"token").to_hex();
        text.replace_range(10..11, "g");
        assert!(matches!(
            Hash256::from_hex(&text),
            Err(CryptoError::InvalidHexFormat(_))
        ));
        // 64 bytes but not 64 characters.
        let wide = "é".repeat(32);
        assert!(matches!(
            Hash256::from_hex(&wide),
            Err(CryptoError::InvalidHexFormat(_))
        ));
    }

    #[test]
    fn test_digest_survives_json() {
        let root = Hash256::hash(b"merkle root");
        let json = serde_json::to_string(&root).unwrap();
        assert_eq!(serde_json::from_str::<Hash256>(&json).unwrap(), root);
    }
}
