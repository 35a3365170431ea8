//! Peer contacts — public key material plus trust state.
//!
//! `Contact` is an immutable record: every state change returns a new value.
//! The one transition that matters for security is key rotation, and it is a
//! pure constructor with two hard guarantees:
//!
//! 1. the superseded keys are appended to `key_history` (append-only,
//!    entries are never edited or dropped), and
//! 2. `trust_level` is forced back to `Unverified` — a contact is NEVER
//!    silently re-trusted across a key change, whatever it was before.
//!
//! Impersonation-by-key-swap has to get past an explicit human
//! re-verification, not a forgotten flag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wsp_crypto::hash;
use wsp_proto::{BundleError, KeyBundle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    Unverified,
    /// Fingerprint / SAS confirmed out-of-band by the user.
    Verified,
    /// Explicitly distrusted; attribution to this contact is reported but
    /// the trust state travels with it.
    Revoked,
}

/// Superseded key material, kept forever.  Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyHistoryEntry {
    pub x25519_public: [u8; 32],
    pub ed25519_public: Option<[u8; 32]>,
    pub fingerprint: [u8; 32],
    pub key_version: u32,
    pub rotated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub display_name: String,
    pub x25519_public: [u8; 32],
    pub ed25519_public: Option<[u8; 32]>,
    pub fingerprint: [u8; 32],
    pub key_version: u32,
    pub trust_level: TrustLevel,
    pub is_blocked: bool,
    pub key_history: Vec<KeyHistoryEntry>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

impl Contact {
    /// New, unverified contact from raw public keys.
    pub fn from_keys(
        display_name: impl Into<String>,
        x25519_public: [u8; 32],
        ed25519_public: Option<[u8; 32]>,
    ) -> Self {
        let fingerprint = hash::fingerprint(&x25519_public, ed25519_public.as_ref());
        Self {
            id: Uuid::new_v4().to_string(),
            display_name: display_name.into(),
            x25519_public,
            ed25519_public,
            fingerprint,
            key_version: 1,
            trust_level: TrustLevel::Unverified,
            is_blocked: false,
            key_history: Vec::new(),
            created_at: Utc::now(),
            last_seen_at: None,
            note: None,
        }
    }

    /// New contact from a scanned/pasted key bundle.  The bundle's
    /// fingerprint has already been verified by [`KeyBundle::parse`]; this
    /// re-derives it anyway because the bundle may have been built by hand.
    pub fn from_bundle(bundle: &KeyBundle) -> Result<Self, BundleError> {
        let x = bundle.x25519_bytes()?;
        let ed = bundle.ed25519_bytes()?;
        let mut contact = Self::from_keys(bundle.name.clone(), x, ed);
        contact.key_version = bundle.key_version;
        Ok(contact)
    }

    /// 8-byte key id under which this contact's envelopes arrive at *their*
    /// device — and under which our envelopes to them are addressed.
    pub fn rkid(&self) -> [u8; 8] {
        hash::recipient_key_id(&self.x25519_public)
    }

    pub fn short_fingerprint(&self) -> String {
        hash::short_fingerprint(&self.fingerprint)
    }

    pub fn sas_words(&self) -> [&'static str; 6] {
        hash::sas_words(&self.fingerprint)
    }

    /// Pure key rotation: returns a new contact carrying the new keys, with
    /// the old material appended to history and trust forced to Unverified.
    pub fn with_key_rotation(
        &self,
        new_x25519: [u8; 32],
        new_ed25519: Option<[u8; 32]>,
    ) -> Contact {
        let mut history = self.key_history.clone();
        history.push(KeyHistoryEntry {
            x25519_public: self.x25519_public,
            ed25519_public: self.ed25519_public,
            fingerprint: self.fingerprint,
            key_version: self.key_version,
            rotated_at: Utc::now(),
        });

        Contact {
            x25519_public: new_x25519,
            ed25519_public: new_ed25519,
            fingerprint: hash::fingerprint(&new_x25519, new_ed25519.as_ref()),
            key_version: self.key_version + 1,
            trust_level: TrustLevel::Unverified,
            key_history: history,
            ..self.clone()
        }
    }

    /// Mark verified after an out-of-band fingerprint/SAS comparison.
    pub fn verified(&self) -> Contact {
        Contact { trust_level: TrustLevel::Verified, ..self.clone() }
    }

    pub fn revoked(&self) -> Contact {
        Contact { trust_level: TrustLevel::Revoked, ..self.clone() }
    }

    pub fn with_blocked(&self, blocked: bool) -> Contact {
        Contact { is_blocked: blocked, ..self.clone() }
    }

    pub fn with_last_seen(&self, at: DateTime<Utc>) -> Contact {
        Contact { last_seen_at: Some(at), ..self.clone() }
    }

    pub fn with_note(&self, note: impl Into<String>) -> Contact {
        Contact { note: Some(note.into()), ..self.clone() }
    }
}
