//! Signature verification seam.
//!
//! The ledger never interprets signature bytes itself. Entries are checked
//! through a [`SignatureVerifier`], so a real scheme can be plugged in
//! without touching the chain code.

/// Verifies a signature over a message for a given public key.
///
/// Implementations must be pure: the same inputs always produce the same
/// answer.
pub trait SignatureVerifier: Send + Sync {
    /// Returns `true` if `signature` is a valid signature of `message`
    /// under `public_key`.
    fn verify(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> bool;
}

/// Placeholder verifier that accepts any non-empty signature.
///
/// This matches the prototype ledger, where a transaction counted as signed
/// as soon as a signature was present. It performs no cryptography and must
/// not be used where forgery matters.
#[derive(Debug, Default, Clone, Copy)]
pub struct PresenceVerifier;

impl SignatureVerifier for PresenceVerifier {
    fn verify(&self, _message: &[u8], signature: &[u8], _public_key: &[u8]) -> bool {
        !signature.is_empty()
    }
}

impl<T: SignatureVerifier + ?Sized> SignatureVerifier for &T {
    fn verify(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
        (**self).verify(message, signature, public_key)
    }
}
