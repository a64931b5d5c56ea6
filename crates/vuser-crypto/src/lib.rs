//! # vuser-crypto
//!
//! Hashing primitives for the Vuser ledger.
//!
//! This crate provides:
//! - **Hash256**: BLAKE3 digests used for entry identifiers, block hashes,
//!   merkle nodes and approval tokens
//! - **SignatureVerifier**: the pluggable seam transaction signatures are
//!   checked through
//!
//! Real public-key signature schemes are not implemented here; the ledger
//! only depends on the [`SignatureVerifier`] contract.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod hash;
pub mod signature;

#[cfg(test)]
mod proptests;

pub use error::{CryptoError, Result};
pub use hash::Hash256;
pub use signature::{PresenceVerifier, SignatureVerifier};
