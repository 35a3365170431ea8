//! The `whisper1:` message envelope — everything a transport sees.
//!
//! Wire form: the ASCII prefix `whisper1:` followed by dot-joined segments:
//!
//! ```text
//! whisper1:v1.c20p.<rkid>.<flags>.<epk>.<salt>.<msgid>.<timestamp>.<ciphertext>[.<signature>]
//! ```
//!
//! The first two segments are the literal version pair `v1.c20p`; every
//! other segment is base64url without padding.  Exactly 9 segments for an
//! unsigned envelope, exactly 10 for a signed one — any other count is
//! malformed.  The version is an algorithm lock, not a negotiation: only the
//! exact, case-sensitive `v1.c20p` is ever accepted.
//!
//! A transport observes: which local key the message is for (rkid, 8 bytes
//! of a hash — not the key), whether it is signed, when it was sent, and a
//! uniform-sized ciphertext.  Nothing else.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use thiserror::Error;

/// ASCII prefix of every envelope.
pub const ENVELOPE_PREFIX: &str = "whisper1:";

/// The only accepted version pair, as it appears on the wire.
pub const VERSION: &str = "v1.c20p";

const VERSION_MAJOR: &str = "v1";
const VERSION_SUITE: &str = "c20p";

/// flags bit 0: a signature segment is present.
pub const FLAG_SIGNED: u8 = 0b0000_0001;

const SEGMENTS_UNSIGNED: usize = 9;
const SEGMENTS_SIGNED: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("Invalid envelope")]
    InvalidEnvelope,

    #[error("Unsupported protocol version")]
    UnsupportedVersion,
}

/// Decoded envelope.  `epk`, `salt`, and `msgid` are fresh random values for
/// every message and are never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Lower 8 bytes of SHA-256 over the recipient's X25519 public key.
    pub rkid: [u8; 8],
    /// Bit 0 = signature present.  Must agree with `signature`.
    pub flags: u8,
    /// Sender's ephemeral X25519 public key.
    pub epk: [u8; 32],
    /// HKDF salt.
    pub salt: [u8; 16],
    /// Random message id — replay-cache key, also bound into the KDF.
    pub msgid: [u8; 16],
    /// Sender's clock, unix seconds.
    pub timestamp: i64,
    /// ChaCha20-Poly1305 ciphertext + tag over the padded plaintext.
    pub ciphertext: Vec<u8>,
    /// Ed25519 signature over `ciphertext ‖ AAD`, when flags bit 0 is set.
    pub signature: Option<[u8; 64]>,
}

fn b64d(s: &str) -> Result<Vec<u8>, EnvelopeError> {
    URL_SAFE_NO_PAD
        .decode(s)
        .map_err(|_| EnvelopeError::InvalidEnvelope)
}

fn b64d_fixed<const N: usize>(s: &str) -> Result<[u8; N], EnvelopeError> {
    b64d(s)?
        .try_into()
        .map_err(|_| EnvelopeError::InvalidEnvelope)
}

/// Canonical authenticated context: the header fields that must not be
/// tamperable, bound into the AEAD tag and (when signing) the signature.
///
/// `version ‖ rkid ‖ flags ‖ recipient_fp [‖ sender_fp]` — the sender
/// fingerprint is part of the context exactly when the envelope is signed,
/// so attribution cannot be stripped or transplanted.
pub fn canonical_aad(
    rkid: &[u8; 8],
    flags: u8,
    recipient_fingerprint: &[u8; 32],
    sender_fingerprint: Option<&[u8; 32]>,
) -> Vec<u8> {
    let mut aad = Vec::with_capacity(VERSION.len() + 8 + 1 + 32 + 32);
    aad.extend_from_slice(VERSION.as_bytes());
    aad.extend_from_slice(rkid);
    aad.push(flags);
    aad.extend_from_slice(recipient_fingerprint);
    if let Some(sender_fp) = sender_fingerprint {
        aad.extend_from_slice(sender_fp);
    }
    aad
}

impl Envelope {
    pub fn is_signed(&self) -> bool {
        self.flags & FLAG_SIGNED != 0
    }

    /// [`canonical_aad`] over this envelope's header.
    pub fn aad(
        &self,
        recipient_fingerprint: &[u8; 32],
        sender_fingerprint: Option<&[u8; 32]>,
    ) -> Vec<u8> {
        canonical_aad(&self.rkid, self.flags, recipient_fingerprint, sender_fingerprint)
    }

    /// Serialise to the wire string.
    pub fn encode(&self) -> String {
        debug_assert_eq!(self.is_signed(), self.signature.is_some());

        let mut segments: Vec<String> = Vec::with_capacity(SEGMENTS_SIGNED);
        segments.push(VERSION_MAJOR.to_string());
        segments.push(VERSION_SUITE.to_string());
        segments.push(URL_SAFE_NO_PAD.encode(self.rkid));
        segments.push(URL_SAFE_NO_PAD.encode([self.flags]));
        segments.push(URL_SAFE_NO_PAD.encode(self.epk));
        segments.push(URL_SAFE_NO_PAD.encode(self.salt));
        segments.push(URL_SAFE_NO_PAD.encode(self.msgid));
        segments.push(URL_SAFE_NO_PAD.encode(self.timestamp.to_be_bytes()));
        segments.push(URL_SAFE_NO_PAD.encode(&self.ciphertext));
        if let Some(sig) = &self.signature {
            segments.push(URL_SAFE_NO_PAD.encode(sig));
        }

        format!("{ENVELOPE_PREFIX}{}", segments.join("."))
    }

    /// Parse and validate a wire string.
    ///
    /// Validation order: prefix → segment count → exact version → field
    /// decode with length checks → flags/signature agreement.  The flags bit
    /// and the structural presence of a 10th segment MUST agree; a mismatch
    /// is a hard parse failure.
    pub fn parse(wire: &str) -> Result<Self, EnvelopeError> {
        let body = wire
            .strip_prefix(ENVELOPE_PREFIX)
            .ok_or(EnvelopeError::InvalidEnvelope)?;

        let segments: Vec<&str> = body.split('.').collect();
        if segments.len() != SEGMENTS_UNSIGNED && segments.len() != SEGMENTS_SIGNED {
            return Err(EnvelopeError::InvalidEnvelope);
        }

        // Algorithm lock: exact match on both version segments, case-sensitive.
        if segments[0] != VERSION_MAJOR || segments[1] != VERSION_SUITE {
            return Err(EnvelopeError::UnsupportedVersion);
        }

        let rkid: [u8; 8] = b64d_fixed(segments[2])?;
        let flags_bytes: [u8; 1] = b64d_fixed(segments[3])?;
        let flags = flags_bytes[0];
        let epk: [u8; 32] = b64d_fixed(segments[4])?;
        let salt: [u8; 16] = b64d_fixed(segments[5])?;
        let msgid: [u8; 16] = b64d_fixed(segments[6])?;
        let timestamp = i64::from_be_bytes(b64d_fixed::<8>(segments[7])?);
        let ciphertext = b64d(segments[8])?;

        let signature = if segments.len() == SEGMENTS_SIGNED {
            Some(b64d_fixed::<64>(segments[9])?)
        } else {
            None
        };

        // Structure and flags must tell the same story.
        if (flags & FLAG_SIGNED != 0) != signature.is_some() {
            return Err(EnvelopeError::InvalidEnvelope);
        }

        Ok(Self { rkid, flags, epk, salt, msgid, timestamp, ciphertext, signature })
    }
}
