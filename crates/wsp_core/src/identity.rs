//! Local identities — the key pairs this device owns.
//!
//! An identity is created on first run (or on explicit rotation) and never
//! deleted: superseded identities stay in the caller's set so old traffic
//! keyed to them can still be decrypted.  At most one identity should be
//! `Active` at a time; it is the default sender.
//!
//! Secret halves live inside the `wsp_crypto` key-pair types and are
//! zeroized on drop.  The record itself is deliberately not serializable —
//! exporting secret material is the secure-storage collaborator's job, via
//! `secret_bytes()` on the key pairs.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use wsp_crypto::hash;
use wsp_crypto::keys::{Ed25519KeyPair, X25519KeyPair};
use wsp_proto::KeyBundle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityStatus {
    /// The default sender.
    Active,
    /// Superseded and filed away; still decrypts old traffic.
    Archived,
    /// Superseded by rotation but not yet archived by the user.
    Rotated,
}

pub struct Identity {
    /// Stable record id; rotation keeps it, the key material changes.
    pub id: String,
    pub display_name: String,
    pub x25519: X25519KeyPair,
    pub ed25519: Option<Ed25519KeyPair>,
    /// SHA-256(x25519Pub ‖ ed25519Pub).
    pub fingerprint: [u8; 32],
    pub created_at: DateTime<Utc>,
    pub status: IdentityStatus,
    pub key_version: u32,
}

impl Identity {
    /// Create a brand-new active identity with fresh X25519 + Ed25519 keys.
    pub fn generate(display_name: impl Into<String>) -> Self {
        let (x25519, ed25519) = wsp_crypto::keys::generate_identity_keys();
        Self::from_parts(
            Uuid::new_v4().to_string(),
            display_name.into(),
            x25519,
            Some(ed25519),
            1,
        )
    }

    fn from_parts(
        id: String,
        display_name: String,
        x25519: X25519KeyPair,
        ed25519: Option<Ed25519KeyPair>,
        key_version: u32,
    ) -> Self {
        let ed_pub = ed25519.as_ref().map(|k| k.public_bytes());
        let fingerprint = hash::fingerprint(&x25519.public_bytes(), ed_pub.as_ref());
        Self {
            id,
            display_name,
            x25519,
            ed25519,
            fingerprint,
            created_at: Utc::now(),
            status: IdentityStatus::Active,
            key_version,
        }
    }

    /// 8-byte recipient key id envelopes use to route to this identity.
    pub fn rkid(&self) -> [u8; 8] {
        hash::recipient_key_id(&self.x25519.public_bytes())
    }

    pub fn short_fingerprint(&self) -> String {
        hash::short_fingerprint(&self.fingerprint)
    }

    pub fn sas_words(&self) -> [&'static str; 6] {
        hash::sas_words(&self.fingerprint)
    }

    /// Public-key bundle for out-of-band exchange (QR, link).
    pub fn bundle(&self) -> KeyBundle {
        KeyBundle::new(
            self.id.clone(),
            self.display_name.clone(),
            &self.x25519.public_bytes(),
            self.ed25519.as_ref().map(|k| k.public_bytes()).as_ref(),
            self.key_version,
            self.created_at,
        )
    }

    /// Rotate to fresh keys.  Consumes the current identity and returns
    /// `(superseded, replacement)`: the superseded value keeps its old key
    /// material for decrypting old traffic and becomes `Archived` when
    /// `auto_archive` is set (`Rotated` otherwise, awaiting manual filing);
    /// the replacement keeps the record id and display name, with
    /// `key_version` incremented.
    pub fn rotate(self, auto_archive: bool) -> (Identity, Identity) {
        let (x25519, ed25519) = wsp_crypto::keys::generate_identity_keys();
        let replacement = Self::from_parts(
            self.id.clone(),
            self.display_name.clone(),
            x25519,
            Some(ed25519),
            self.key_version + 1,
        );

        let mut superseded = self;
        superseded.status = if auto_archive {
            IdentityStatus::Archived
        } else {
            IdentityStatus::Rotated
        };

        (superseded, replacement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_identity_is_active_v1() {
        let id = Identity::generate("Alice");
        assert_eq!(id.status, IdentityStatus::Active);
        assert_eq!(id.key_version, 1);
        assert!(id.ed25519.is_some());
        assert_eq!(
            id.fingerprint,
            hash::fingerprint(
                &id.x25519.public_bytes(),
                Some(&id.ed25519.as_ref().unwrap().public_bytes())
            )
        );
    }

    #[test]
    fn rotation_changes_keys_and_bumps_version() {
        let original = Identity::generate("Alice");
        let original_fp = original.fingerprint;
        let original_rkid = original.rkid();

        let (superseded, replacement) = original.rotate(true);
        assert_eq!(superseded.status, IdentityStatus::Archived);
        assert_eq!(superseded.fingerprint, original_fp);
        assert_eq!(replacement.status, IdentityStatus::Active);
        assert_eq!(replacement.key_version, 2);
        assert_eq!(replacement.id, superseded.id);
        assert_ne!(replacement.fingerprint, original_fp);
        assert_ne!(replacement.rkid(), original_rkid);
    }

    #[test]
    fn rotation_without_auto_archive_marks_rotated() {
        let (superseded, _) = Identity::generate("Alice").rotate(false);
        assert_eq!(superseded.status, IdentityStatus::Rotated);
    }

    #[test]
    fn bundle_roundtrips_the_public_material() {
        let id = Identity::generate("Alice");
        let bundle = KeyBundle::parse(&id.bundle().encode()).unwrap();
        assert_eq!(bundle.x25519_bytes().unwrap(), id.x25519.public_bytes());
        assert_eq!(bundle.fingerprint_bytes().unwrap(), id.fingerprint);
        assert_eq!(bundle.key_version, 1);
    }
}
