use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Key agreement failed")]
    KeyAgreement,

    #[error("Signature verification failed")]
    SignatureVerification,

    #[error("AEAD encryption failed")]
    AeadEncrypt,

    #[error("AEAD decryption failed (authentication tag mismatch — possible tampering)")]
    AeadDecrypt,

    #[error("Key derivation failed")]
    KeyDerivation,

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Secure random generation failed")]
    RandomGeneration,
}
