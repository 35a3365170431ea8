//! Key pairs and X25519 key agreement.
//!
//! Each identity holds one long-term X25519 key pair (key agreement) and,
//! optionally, one Ed25519 key pair (signatures / attribution).  Every
//! encrypted message additionally uses one `EphemeralKeyPair`, generated for
//! that message and consumed by the agreement — the secret half cannot
//! outlive the call that uses it.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier as _, VerifyingKey};
use rand::rngs::OsRng;
use x25519_dalek::{EphemeralSecret, PublicKey as X25519Public, StaticSecret};
use zeroize::{ZeroizeOnDrop, Zeroizing};

use crate::error::CryptoError;

/// Coerce a byte slice into a 32-byte key array.
pub(crate) fn to_32(bytes: &[u8]) -> Result<[u8; 32], CryptoError> {
    bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidKey(format!("expected 32 bytes, got {}", bytes.len())))
}

// ── X25519 ───────────────────────────────────────────────────────────────────

/// Long-term X25519 key pair.  Drop clears the secret via ZeroizeOnDrop.
#[derive(ZeroizeOnDrop)]
pub struct X25519KeyPair {
    #[zeroize(skip)]
    public: [u8; 32],
    secret_bytes: [u8; 32],
}

impl X25519KeyPair {
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = X25519Public::from(&secret).to_bytes();
        Self { public, secret_bytes: secret.to_bytes() }
    }

    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let secret_bytes = to_32(bytes)?;
        let secret = StaticSecret::from(secret_bytes);
        let public = X25519Public::from(&secret).to_bytes();
        Ok(Self { public, secret_bytes })
    }

    pub fn public_bytes(&self) -> [u8; 32] {
        self.public
    }

    pub fn secret_bytes(&self) -> &[u8; 32] {
        &self.secret_bytes
    }

    /// X25519 agreement between this long-term secret and a peer public key.
    /// Used on the receive path (identity secret × sender ephemeral public).
    pub fn agree(&self, peer_public: &[u8; 32]) -> Result<SharedSecret, CryptoError> {
        let secret = StaticSecret::from(self.secret_bytes);
        let shared = secret.diffie_hellman(&X25519Public::from(*peer_public));
        if !shared.was_contributory() {
            return Err(CryptoError::KeyAgreement);
        }
        Ok(SharedSecret(Zeroizing::new(shared.to_bytes())))
    }
}

/// Per-message X25519 key pair.  `agree` consumes it; x25519-dalek zeroizes
/// the secret on drop, so no scrub path is left to the caller.
pub struct EphemeralKeyPair {
    secret: EphemeralSecret,
    public: [u8; 32],
}

impl EphemeralKeyPair {
    pub fn generate() -> Self {
        let secret = EphemeralSecret::random_from_rng(OsRng);
        let public = X25519Public::from(&secret).to_bytes();
        Self { secret, public }
    }

    pub fn public_bytes(&self) -> [u8; 32] {
        self.public
    }

    /// One-shot agreement with the recipient's long-term public key.
    pub fn agree(self, recipient_public: &[u8; 32]) -> Result<SharedSecret, CryptoError> {
        let shared = self.secret.diffie_hellman(&X25519Public::from(*recipient_public));
        if !shared.was_contributory() {
            return Err(CryptoError::KeyAgreement);
        }
        Ok(SharedSecret(Zeroizing::new(shared.to_bytes())))
    }
}

/// 32-byte X25519 shared secret, zeroized on drop.
pub struct SharedSecret(Zeroizing<[u8; 32]>);

impl SharedSecret {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

// ── Ed25519 ──────────────────────────────────────────────────────────────────

/// Ed25519 signing key pair.  Drop clears the secret via ZeroizeOnDrop.
#[derive(ZeroizeOnDrop)]
pub struct Ed25519KeyPair {
    #[zeroize(skip)]
    public: [u8; 32],
    secret_bytes: [u8; 32],
}

impl Ed25519KeyPair {
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let public = signing_key.verifying_key().to_bytes();
        Self { public, secret_bytes: signing_key.to_bytes() }
    }

    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let secret_bytes = to_32(bytes)?;
        let signing_key = SigningKey::from_bytes(&secret_bytes);
        let public = signing_key.verifying_key().to_bytes();
        Ok(Self { public, secret_bytes })
    }

    pub fn public_bytes(&self) -> [u8; 32] {
        self.public
    }

    pub fn secret_bytes(&self) -> &[u8; 32] {
        &self.secret_bytes
    }

    /// Sign arbitrary bytes; returns the raw 64-byte Ed25519 signature.
    pub fn sign(&self, msg: &[u8]) -> [u8; 64] {
        SigningKey::from_bytes(&self.secret_bytes).sign(msg).to_bytes()
    }
}

/// Verify a 64-byte Ed25519 signature against a 32-byte public key.
pub fn verify(public: &[u8; 32], msg: &[u8], sig: &[u8; 64]) -> Result<(), CryptoError> {
    let vk = VerifyingKey::from_bytes(public)
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    let sig = Signature::from_bytes(sig);
    vk.verify(msg, &sig)
        .map_err(|_| CryptoError::SignatureVerification)
}

/// Generate a fresh (X25519, Ed25519) pair for a new identity.
/// Never deterministic; both secrets come from the OS CSPRNG.
pub fn generate_identity_keys() -> (X25519KeyPair, Ed25519KeyPair) {
    (X25519KeyPair::generate(), Ed25519KeyPair::generate())
}
