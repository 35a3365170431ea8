//! Caller-facing error taxonomy.
//!
//! Cryptographic failures are never decomposed further than this: which HKDF
//! step failed or which byte mismatched stays inside the crate.  Only policy
//! violations and replay/freshness errors are sensible for a caller to act
//! on (re-authenticate, fix the clock, add the contact); everything else is
//! terminal for that message.

use thiserror::Error;

use wsp_crypto::CryptoError;
use wsp_proto::{EnvelopeError, PaddingError};

/// Which policy rule denied the operation.  Display strings are fixed
/// templates; they never carry key material or contact internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyViolationKind {
    /// Encryption to a raw public key while `contact_required_to_send` is set.
    ContactRequired,
    /// The peer contact is blocked.
    ContactBlocked,
    /// A signature is required but absent (or no signing key is available).
    SignatureRequired,
    /// Biometric signing authorization was cancelled or unavailable.
    BiometricRequired,
}

impl std::fmt::Display for PolicyViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Self::ContactRequired => "recipient must be a saved contact",
            Self::ContactBlocked => "contact is blocked",
            Self::SignatureRequired => "message must be signed",
            Self::BiometricRequired => "biometric authorization required",
        };
        f.write_str(msg)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WhisperError {
    #[error("Invalid envelope")]
    InvalidEnvelope,

    #[error("Unsupported protocol version")]
    UnsupportedVersion,

    #[error("Message is not addressed to any local identity")]
    MessageNotForMe,

    #[error("Decryption failed")]
    DecryptionFailed,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Signed by an unknown sender")]
    UnknownSender,

    #[error("Message replay detected")]
    ReplayDetected,

    #[error("Message timestamp outside the freshness window")]
    MessageExpired,

    #[error("Invalid padding")]
    InvalidPadding,

    #[error("Message too large")]
    MessageTooLarge,

    #[error("Policy violation: {0}")]
    PolicyViolation(PolicyViolationKind),

    #[error("Key agreement failed")]
    KeyAgreement,

    #[error("Secure random generation failed")]
    RandomGeneration,
}

impl From<EnvelopeError> for WhisperError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::InvalidEnvelope => Self::InvalidEnvelope,
            EnvelopeError::UnsupportedVersion => Self::UnsupportedVersion,
        }
    }
}

impl From<PaddingError> for WhisperError {
    fn from(err: PaddingError) -> Self {
        match err {
            PaddingError::MessageTooLarge => Self::MessageTooLarge,
            PaddingError::InvalidPadding => Self::InvalidPadding,
        }
    }
}

impl From<CryptoError> for WhisperError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::AeadDecrypt => Self::DecryptionFailed,
            CryptoError::SignatureVerification => Self::InvalidSignature,
            CryptoError::RandomGeneration => Self::RandomGeneration,
            // Everything else in key establishment collapses here; the
            // distinction is not for callers.
            CryptoError::KeyAgreement
            | CryptoError::KeyDerivation
            | CryptoError::InvalidKey(_)
            | CryptoError::AeadEncrypt => Self::KeyAgreement,
        }
    }
}
