//! wsp_crypto — Whisper Secure Channel cryptographic primitives
//!
//! # Design principles
//! - NO custom crypto; all primitives come from audited Rust crates.
//! - Zeroize all secret material on drop.
//! - Ephemeral keys are single-use by type: the X25519 agreement consumes them.
//! - One algorithm suite, no negotiation: X25519 + HKDF-SHA256 + ChaCha20-Poly1305
//!   (+ optional Ed25519 signatures). SHA-256 is the canonical fingerprint hash.
//!
//! # Module layout
//! - `keys`   — X25519/Ed25519 key pairs, ephemeral keys, key agreement, sign/verify
//! - `kdf`    — HKDF-SHA256 derivation of the per-message key + nonce
//! - `aead`   — ChaCha20-Poly1305 encrypt/decrypt with explicit nonce + AAD
//! - `hash`   — SHA-256 fingerprints, rkid, short fingerprints, SAS words
//! - `random` — CSPRNG access that fails loudly
//! - `error`  — unified error type

pub mod aead;
pub mod error;
pub mod hash;
pub mod kdf;
pub mod keys;
pub mod random;

pub use error::CryptoError;
