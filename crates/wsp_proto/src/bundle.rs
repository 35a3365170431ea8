//! The `whisper-bundle:` key-exchange bundle.
//!
//! Published out-of-band (QR code, link) so two parties can exchange public
//! key material without a server.  Wire form: the ASCII prefix
//! `whisper-bundle:` followed by base64url (no padding) of a camelCase JSON
//! object.
//!
//! A bundle arrives from an untrusted channel, so `parse` re-derives the
//! fingerprint from the key material and rejects a mismatch instead of
//! trusting the embedded field.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use wsp_crypto::hash;

/// ASCII prefix of every bundle.
pub const BUNDLE_PREFIX: &str = "whisper-bundle:";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BundleError {
    #[error("Invalid key bundle")]
    InvalidBundle,

    #[error("Key bundle fingerprint does not match its keys")]
    FingerprintMismatch,
}

/// Public key material for one identity, as shared with a peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyBundle {
    pub id: String,
    pub name: String,
    /// X25519 public key, base64url.
    pub x25519_public_key: String,
    /// Ed25519 public key, base64url; absent for agreement-only identities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ed25519_public_key: Option<String>,
    /// SHA-256 fingerprint over the keys, base64url.  Verified on parse.
    pub fingerprint: String,
    pub key_version: u32,
    pub created_at: DateTime<Utc>,
}

fn b64d_32(s: &str) -> Result<[u8; 32], BundleError> {
    URL_SAFE_NO_PAD
        .decode(s)
        .map_err(|_| BundleError::InvalidBundle)?
        .try_into()
        .map_err(|_| BundleError::InvalidBundle)
}

impl KeyBundle {
    /// Assemble a bundle from raw key material, deriving the fingerprint.
    pub fn new(
        id: String,
        name: String,
        x25519_public: &[u8; 32],
        ed25519_public: Option<&[u8; 32]>,
        key_version: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        let fp = hash::fingerprint(x25519_public, ed25519_public);
        Self {
            id,
            name,
            x25519_public_key: URL_SAFE_NO_PAD.encode(x25519_public),
            ed25519_public_key: ed25519_public.map(|k| URL_SAFE_NO_PAD.encode(k)),
            fingerprint: URL_SAFE_NO_PAD.encode(fp),
            key_version,
            created_at,
        }
    }

    pub fn x25519_bytes(&self) -> Result<[u8; 32], BundleError> {
        b64d_32(&self.x25519_public_key)
    }

    pub fn ed25519_bytes(&self) -> Result<Option<[u8; 32]>, BundleError> {
        self.ed25519_public_key
            .as_deref()
            .map(b64d_32)
            .transpose()
    }

    pub fn fingerprint_bytes(&self) -> Result<[u8; 32], BundleError> {
        b64d_32(&self.fingerprint)
    }

    /// Serialise to the wire string.
    pub fn encode(&self) -> String {
        let json = serde_json::to_vec(self).expect("KeyBundle serialises to JSON");
        format!("{BUNDLE_PREFIX}{}", URL_SAFE_NO_PAD.encode(json))
    }

    /// Parse a wire string, verifying the embedded fingerprint against the
    /// actual key material.
    pub fn parse(wire: &str) -> Result<Self, BundleError> {
        let body = wire
            .strip_prefix(BUNDLE_PREFIX)
            .ok_or(BundleError::InvalidBundle)?;
        let json = URL_SAFE_NO_PAD
            .decode(body)
            .map_err(|_| BundleError::InvalidBundle)?;
        let bundle: KeyBundle =
            serde_json::from_slice(&json).map_err(|_| BundleError::InvalidBundle)?;

        let x = bundle.x25519_bytes()?;
        let ed = bundle.ed25519_bytes()?;
        let derived = hash::fingerprint(&x, ed.as_ref());
        let claimed = bundle.fingerprint_bytes()?;
        if !hash::fingerprints_match(&derived, &claimed) {
            return Err(BundleError::FingerprintMismatch);
        }

        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> KeyBundle {
        KeyBundle::new(
            "a2b6be21-9145-4a9c-803f-8f31e7e0c053".into(),
            "Alice".into(),
            &[1u8; 32],
            Some(&[2u8; 32]),
            1,
            "2025-06-01T12:00:00Z".parse().unwrap(),
        )
    }

    #[test]
    fn encode_parse_roundtrip() {
        let bundle = sample();
        let wire = bundle.encode();
        assert!(wire.starts_with("whisper-bundle:"));
        assert_eq!(KeyBundle::parse(&wire).unwrap(), bundle);
    }

    #[test]
    fn json_uses_camel_case_contract() {
        let json = serde_json::to_value(sample()).unwrap();
        for field in
            ["id", "name", "x25519PublicKey", "ed25519PublicKey", "fingerprint", "keyVersion", "createdAt"]
        {
            assert!(json.get(field).is_some(), "missing field {field}");
        }
    }

    #[test]
    fn signing_key_is_omitted_when_absent() {
        let bundle = KeyBundle::new(
            "id".into(),
            "Bob".into(),
            &[3u8; 32],
            None,
            1,
            Utc::now(),
        );
        let json = serde_json::to_value(&bundle).unwrap();
        assert!(json.get("ed25519PublicKey").is_none());
        assert_eq!(KeyBundle::parse(&bundle.encode()).unwrap(), bundle);
    }

    #[test]
    fn tampered_fingerprint_is_rejected() {
        let mut bundle = sample();
        bundle.fingerprint = URL_SAFE_NO_PAD.encode([0u8; 32]);
        assert_eq!(
            KeyBundle::parse(&bundle.encode()),
            Err(BundleError::FingerprintMismatch)
        );
    }

    #[test]
    fn swapped_key_is_rejected() {
        // Attacker swaps the X25519 key but keeps the original fingerprint.
        let mut bundle = sample();
        bundle.x25519_public_key = URL_SAFE_NO_PAD.encode([9u8; 32]);
        assert_eq!(
            KeyBundle::parse(&bundle.encode()),
            Err(BundleError::FingerprintMismatch)
        );
    }

    #[test]
    fn garbage_is_invalid() {
        assert_eq!(KeyBundle::parse("whisper-bundle:!!!"), Err(BundleError::InvalidBundle));
        assert_eq!(KeyBundle::parse("not-a-bundle"), Err(BundleError::InvalidBundle));
        let not_json = format!("whisper-bundle:{}", URL_SAFE_NO_PAD.encode(b"hello"));
        assert_eq!(KeyBundle::parse(&not_json), Err(BundleError::InvalidBundle));
    }
}
