//! The signing-oracle boundary.
//!
//! When `biometric_gated_signing` is on, the core never touches raw Ed25519
//! secret material for outgoing signatures: it asks an injected
//! [`SigningOracle`] — in production a platform secure enclave behind a
//! biometric prompt.  The prompt can block and the user can cancel; both
//! outcomes arrive here as plain results, never as unwinding that could leak
//! into crypto error handling.  The protocol layer maps a denial to
//! `PolicyViolation(BiometricRequired)`.

use thiserror::Error;

use wsp_crypto::keys::Ed25519KeyPair;
use wsp_crypto::CryptoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SigningDenied {
    /// The user dismissed the authorization prompt.
    #[error("signing authorization cancelled")]
    Cancelled,
    /// No oracle is configured, or the platform capability is missing.
    #[error("signing oracle unavailable")]
    Unavailable,
}

/// External signing capability.  Implementations hold (or gate access to)
/// the Ed25519 key; the core only sees 64-byte signatures.
pub trait SigningOracle: Send + Sync {
    fn sign(&self, data: &[u8]) -> Result<[u8; 64], SigningDenied>;
}

/// Production oracle for platforms without enclave-backed keys: an in-process
/// Ed25519 key, no prompt.  Hosts with a secure enclave implement
/// [`SigningOracle`] over their platform API instead.
pub struct LocalSigner {
    key: Ed25519KeyPair,
}

impl LocalSigner {
    pub fn new(key: Ed25519KeyPair) -> Self {
        Self { key }
    }

    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        Ok(Self { key: Ed25519KeyPair::from_secret_bytes(bytes)? })
    }

    pub fn public_bytes(&self) -> [u8; 32] {
        self.key.public_bytes()
    }
}

impl SigningOracle for LocalSigner {
    fn sign(&self, data: &[u8]) -> Result<[u8; 64], SigningDenied> {
        Ok(self.key.sign(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_signer_produces_verifiable_signatures() {
        let key = Ed25519KeyPair::generate();
        let public = key.public_bytes();
        let signer = LocalSigner::new(key);

        let sig = signer.sign(b"envelope bytes").unwrap();
        wsp_crypto::keys::verify(&public, b"envelope bytes", &sig).unwrap();
    }

    #[test]
    fn from_secret_bytes_matches_original_key() {
        let key = Ed25519KeyPair::generate();
        let secret = *key.secret_bytes();
        let signer = LocalSigner::from_secret_bytes(&secret).unwrap();
        assert_eq!(signer.public_bytes(), key.public_bytes());
    }
}
