//! The protocol root: `encrypt`, `decrypt`, `detect`.
//!
//! `WhisperProtocol` composes everything below it — policy evaluation,
//! envelope building/parsing, the crypto primitives, padding, replay
//! protection, and the signing oracle.  Collaborators arrive through the
//! constructor; there is no ambient state.  Identities and contacts are
//! passed into each call as values the caller owns.
//!
//! # Encrypt flow
//! 1. resolve the recipient's keys and rkid
//! 2. policy pre-check
//! 3. fresh ephemeral key pair, salt, msgid, timestamp
//! 4. X25519 + HKDF, bound to `epk ‖ msgid`
//! 5. pad, then AEAD-encrypt under the canonical AAD
//! 6. optionally sign `ciphertext ‖ AAD` (oracle when biometric-gated)
//! 7. encode; the ephemeral secret was consumed by the agreement in step 4
//!
//! # Decrypt flow
//! Parse → route by rkid → policy pre-check → recompute keys → AEAD →
//! signature/attribution → unpad → replay/freshness commit.  Success is
//! provisional until the replay protector clears the message.

use chrono::Utc;
use tracing::{debug, warn};

use wsp_crypto::keys::EphemeralKeyPair;
use wsp_crypto::{aead, hash, kdf, random};
use wsp_proto::envelope::{canonical_aad, Envelope, ENVELOPE_PREFIX, FLAG_SIGNED};
use wsp_proto::bundle::BUNDLE_PREFIX;
use wsp_proto::{padding, KeyBundle};

use crate::contact::{Contact, TrustLevel};
use crate::error::{PolicyViolationKind, WhisperError};
use crate::identity::Identity;
use crate::oracle::SigningOracle;
use crate::policy::{self, Policy, PolicyContext};
use crate::replay::{ReplayConfig, ReplayProtector};

/// Who a message is being encrypted to.
pub enum Recipient<'a> {
    Contact(&'a Contact),
    /// Bare public keys, e.g. pasted by hand.  Subject to the
    /// `contact_required_to_send` policy.
    ///
    /// The AAD binds the recipient fingerprint over every public key the
    /// recipient's identity carries, so `ed25519` must be supplied whenever
    /// the peer has a signing key — passing `None` for a signing-capable
    /// peer yields an envelope they cannot decrypt.
    RawKey {
        x25519: [u8; 32],
        ed25519: Option<[u8; 32]>,
    },
}

/// Who a decrypted message came from, as far as cryptography can say.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribution {
    /// The signature verified against this contact's Ed25519 key.
    Signed {
        contact_id: String,
        display_name: String,
        trust: TrustLevel,
    },
    /// No signature: the payload is authentic to the recipient key, but the
    /// sender is cryptographically anonymous.  The core does not guess.
    Unsigned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedMessage {
    pub plaintext: Vec<u8>,
    pub sender: Attribution,
    /// Which local identity the envelope was addressed to.
    pub identity_id: String,
    pub msgid: [u8; 16],
    /// Sender's clock, unix seconds (already freshness-checked).
    pub timestamp: i64,
}

/// What a string turned out to be, without decrypting anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectedPayload {
    Envelope {
        rkid: [u8; 8],
        signed: bool,
        timestamp: i64,
    },
    Bundle(KeyBundle),
    Unknown,
}

pub struct WhisperProtocol {
    replay: ReplayProtector,
    oracle: Option<Box<dyn SigningOracle>>,
}

impl WhisperProtocol {
    /// `oracle` is required only when callers enable
    /// `biometric_gated_signing`; without one, gated signing is denied as
    /// `BiometricRequired`.
    pub fn new(replay_config: ReplayConfig, oracle: Option<Box<dyn SigningOracle>>) -> Self {
        Self { replay: ReplayProtector::new(replay_config), oracle }
    }

    pub fn replay_protector(&self) -> &ReplayProtector {
        &self.replay
    }

    // ── Encrypt ──────────────────────────────────────────────────────────

    /// Encrypt `plaintext` from `sender` to `recipient` and return the
    /// `whisper1:` wire string.  `request_signature` asks for attribution;
    /// policy or a Verified recipient can force it regardless.
    pub fn encrypt(
        &self,
        sender: &Identity,
        recipient: Recipient<'_>,
        plaintext: &[u8],
        policy: &Policy,
        request_signature: bool,
    ) -> Result<String, WhisperError> {
        let (recipient_x, recipient_ed, contact) = match recipient {
            Recipient::Contact(c) => (c.x25519_public, c.ed25519_public, Some(c)),
            Recipient::RawKey { x25519, ed25519 } => (x25519, ed25519, None),
        };

        let sign = request_signature
            || policy.always_include_signatures
            || contact.is_some_and(|c| c.trust_level == TrustLevel::Verified);

        policy::evaluate(policy, &PolicyContext::send(contact, sign)).map_err(|kind| {
            warn!(%kind, "send denied by policy");
            WhisperError::PolicyViolation(kind)
        })?;

        if sign && sender.ed25519.is_none() {
            return Err(WhisperError::PolicyViolation(PolicyViolationKind::SignatureRequired));
        }

        let recipient_fp = match contact {
            Some(c) => c.fingerprint,
            None => hash::fingerprint(&recipient_x, recipient_ed.as_ref()),
        };
        let rkid = hash::recipient_key_id(&recipient_x);

        let ephemeral = EphemeralKeyPair::generate();
        let epk = ephemeral.public_bytes();
        let salt = random::random_array::<16>()?;
        let msgid = random::random_array::<16>()?;
        let timestamp = Utc::now().timestamp();

        // The agreement consumes the ephemeral secret; nothing to scrub later.
        let shared = ephemeral.agree(&recipient_x)?;
        let info = kdf::binding_info(&epk, &msgid);
        let (enc_key, nonce) = kdf::derive_keys(shared.as_bytes(), &salt, &info)?;

        let padded = padding::pad(plaintext)?;

        let flags = if sign { FLAG_SIGNED } else { 0 };
        let aad = canonical_aad(&rkid, flags, &recipient_fp, sign.then_some(&sender.fingerprint));
        let ciphertext = aead::encrypt(&enc_key, &nonce, &padded, &aad)?;

        let signature = if sign {
            let mut signed_data = Vec::with_capacity(ciphertext.len() + aad.len());
            signed_data.extend_from_slice(&ciphertext);
            signed_data.extend_from_slice(&aad);
            Some(self.sign(sender, &signed_data, policy)?)
        } else {
            None
        };

        let envelope = Envelope {
            rkid,
            flags,
            epk,
            salt,
            msgid,
            timestamp,
            ciphertext,
            signature,
        };

        debug!(
            rkid = %hex::encode(rkid),
            signed = sign,
            "message encrypted"
        );
        Ok(envelope.encode())
    }

    fn sign(
        &self,
        sender: &Identity,
        data: &[u8],
        policy: &Policy,
    ) -> Result<[u8; 64], WhisperError> {
        if policy.biometric_gated_signing {
            let oracle = self.oracle.as_deref().ok_or(WhisperError::PolicyViolation(
                PolicyViolationKind::BiometricRequired,
            ))?;
            return oracle.sign(data).map_err(|_| {
                WhisperError::PolicyViolation(PolicyViolationKind::BiometricRequired)
            });
        }

        let key = sender.ed25519.as_ref().ok_or(WhisperError::PolicyViolation(
            PolicyViolationKind::SignatureRequired,
        ))?;
        Ok(key.sign(data))
    }

    // ── Decrypt ──────────────────────────────────────────────────────────

    /// Decrypt a `whisper1:` wire string against the caller's identities
    /// and contacts.
    pub fn decrypt(
        &self,
        wire: &str,
        identities: &[Identity],
        contacts: &[Contact],
        policy: &Policy,
    ) -> Result<DecryptedMessage, WhisperError> {
        let envelope = Envelope::parse(wire)?;

        let identity = identities
            .iter()
            .find(|identity| identity.rkid() == envelope.rkid)
            .ok_or(WhisperError::MessageNotForMe)?;

        policy::evaluate(policy, &PolicyContext::receive(envelope.is_signed())).map_err(|kind| {
            warn!(%kind, "receive denied by policy");
            WhisperError::PolicyViolation(kind)
        })?;

        let shared = identity.x25519.agree(&envelope.epk)?;
        let info = kdf::binding_info(&envelope.epk, &envelope.msgid);
        let (enc_key, nonce) = kdf::derive_keys(shared.as_bytes(), &envelope.salt, &info)?;

        let (padded, sender) = if envelope.is_signed() {
            self.open_signed(&envelope, identity, contacts, &enc_key, &nonce)?
        } else {
            let aad = envelope.aad(&identity.fingerprint, None);
            let padded = aead::decrypt(&enc_key, &nonce, &envelope.ciphertext, &aad)
                .map_err(|_| WhisperError::DecryptionFailed)?;
            (padded, Attribution::Unsigned)
        };

        let plaintext = padding::unpad(&padded)?;

        // Decryption stays provisional until the replay cache clears it.
        self.replay.check_and_commit(envelope.msgid, envelope.timestamp)?;

        debug!(
            rkid = %hex::encode(envelope.rkid),
            signed = envelope.is_signed(),
            "message decrypted"
        );
        Ok(DecryptedMessage {
            plaintext,
            sender,
            identity_id: identity.id.clone(),
            msgid: envelope.msgid,
            timestamp: envelope.timestamp,
        })
    }

    /// Resolve the sender of a signed envelope.
    ///
    /// The AAD of a signed envelope includes the sender's fingerprint, but
    /// the wire deliberately carries no sender field — so each Ed25519-
    /// capable contact is tried as a candidate: build that contact's AAD,
    /// attempt the AEAD, and on success demand that the signature verifies
    /// with that contact's key.  No candidates at all is `UnknownSender`;
    /// candidates that all fail the AEAD are indistinguishable from
    /// tampering and yield `DecryptionFailed`.
    fn open_signed(
        &self,
        envelope: &Envelope,
        identity: &Identity,
        contacts: &[Contact],
        enc_key: &[u8; 32],
        nonce: &[u8; 12],
    ) -> Result<(zeroize::Zeroizing<Vec<u8>>, Attribution), WhisperError> {
        let signature = envelope.signature.ok_or(WhisperError::InvalidEnvelope)?;

        let mut had_candidate = false;
        for contact in contacts {
            let Some(sender_ed) = contact.ed25519_public else { continue };
            had_candidate = true;

            let aad = envelope.aad(&identity.fingerprint, Some(&contact.fingerprint));
            let padded = match aead::decrypt(enc_key, nonce, &envelope.ciphertext, &aad) {
                Ok(padded) => padded,
                Err(_) => continue,
            };

            // The right keys opened it; now the signature must hold.
            let mut signed_data =
                Vec::with_capacity(envelope.ciphertext.len() + aad.len());
            signed_data.extend_from_slice(&envelope.ciphertext);
            signed_data.extend_from_slice(&aad);
            wsp_crypto::keys::verify(&sender_ed, &signed_data, &signature)
                .map_err(|_| WhisperError::InvalidSignature)?;

            if contact.is_blocked {
                return Err(WhisperError::PolicyViolation(PolicyViolationKind::ContactBlocked));
            }

            return Ok((
                padded,
                Attribution::Signed {
                    contact_id: contact.id.clone(),
                    display_name: contact.display_name.clone(),
                    trust: contact.trust_level,
                },
            ));
        }

        if had_candidate {
            Err(WhisperError::DecryptionFailed)
        } else {
            Err(WhisperError::UnknownSender)
        }
    }

    // ── Detect ───────────────────────────────────────────────────────────

    /// Classify a pasted/scanned string without decrypting it.
    pub fn detect(&self, input: &str) -> DetectedPayload {
        let trimmed = input.trim();
        if trimmed.starts_with(ENVELOPE_PREFIX) {
            return match Envelope::parse(trimmed) {
                Ok(envelope) => DetectedPayload::Envelope {
                    rkid: envelope.rkid,
                    signed: envelope.is_signed(),
                    timestamp: envelope.timestamp,
                },
                Err(_) => DetectedPayload::Unknown,
            };
        }
        if trimmed.starts_with(BUNDLE_PREFIX) {
            return match KeyBundle::parse(trimmed) {
                Ok(bundle) => DetectedPayload::Bundle(bundle),
                Err(_) => DetectedPayload::Unknown,
            };
        }
        DetectedPayload::Unknown
    }

    // ── Identity rotation ────────────────────────────────────────────────

    /// Rotate an identity under the current policy: the superseded value is
    /// archived immediately when `auto_archive_on_rotation` is set.
    pub fn rotate_identity(&self, identity: Identity, policy: &Policy) -> (Identity, Identity) {
        identity.rotate(policy.auto_archive_on_rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protocol() -> WhisperProtocol {
        WhisperProtocol::new(ReplayConfig::default(), None)
    }

    fn contact_for(identity: &Identity, name: &str) -> Contact {
        Contact::from_keys(
            name,
            identity.x25519.public_bytes(),
            identity.ed25519.as_ref().map(|k| k.public_bytes()),
        )
    }

    #[test]
    fn unsigned_roundtrip() {
        let proto = protocol();
        let alice = Identity::generate("Alice");
        let bob = Identity::generate("Bob");
        let bob_contact = contact_for(&bob, "Bob");
        let policy = Policy::default();

        let wire = proto
            .encrypt(&alice, Recipient::Contact(&bob_contact), b"hello", &policy, false)
            .unwrap();

        let bob_identities = [bob];
        let message = proto.decrypt(&wire, &bob_identities, &[], &policy).unwrap();
        assert_eq!(message.plaintext, b"hello");
        assert_eq!(message.sender, Attribution::Unsigned);
    }

    #[test]
    fn signed_roundtrip_attributes_sender() {
        let proto = protocol();
        let alice = Identity::generate("Alice");
        let bob = Identity::generate("Bob");
        let bob_contact = contact_for(&bob, "Bob");
        let alice_contact = contact_for(&alice, "Alice").verified();
        let policy = Policy::default();

        let wire = proto
            .encrypt(&alice, Recipient::Contact(&bob_contact), b"hello", &policy, true)
            .unwrap();

        let bob_identities = [bob];
        let message = proto
            .decrypt(&wire, &bob_identities, &[alice_contact.clone()], &policy)
            .unwrap();
        assert_eq!(message.plaintext, b"hello");
        assert_eq!(
            message.sender,
            Attribution::Signed {
                contact_id: alice_contact.id.clone(),
                display_name: "Alice".into(),
                trust: TrustLevel::Verified,
            }
        );
    }

    #[test]
    fn decrypt_for_someone_else_is_not_for_me() {
        let proto = protocol();
        let alice = Identity::generate("Alice");
        let bob = Identity::generate("Bob");
        let carol = Identity::generate("Carol");
        let policy = Policy::default();

        let wire = proto
            .encrypt(
                &alice,
                Recipient::Contact(&contact_for(&bob, "Bob")),
                b"hi",
                &policy,
                false,
            )
            .unwrap();

        let carol_identities = [carol];
        assert_eq!(
            proto.decrypt(&wire, &carol_identities, &[], &policy),
            Err(WhisperError::MessageNotForMe)
        );
    }

    #[test]
    fn signed_envelope_with_no_known_senders_is_unknown() {
        let proto = protocol();
        let alice = Identity::generate("Alice");
        let bob = Identity::generate("Bob");
        let policy = Policy::default();

        let wire = proto
            .encrypt(
                &alice,
                Recipient::Contact(&contact_for(&bob, "Bob")),
                b"hi",
                &policy,
                true,
            )
            .unwrap();

        let bob_identities = [bob];
        assert_eq!(
            proto.decrypt(&wire, &bob_identities, &[], &policy),
            Err(WhisperError::UnknownSender)
        );
    }

    #[test]
    fn detect_classifies_envelopes_and_bundles() {
        let proto = protocol();
        let alice = Identity::generate("Alice");
        let bob = Identity::generate("Bob");
        let bob_contact = contact_for(&bob, "Bob");
        let policy = Policy::default();

        let wire = proto
            .encrypt(&alice, Recipient::Contact(&bob_contact), b"x", &policy, false)
            .unwrap();
        assert!(matches!(
            proto.detect(&wire),
            DetectedPayload::Envelope { signed: false, .. }
        ));

        let bundle_wire = alice.bundle().encode();
        assert!(matches!(proto.detect(&bundle_wire), DetectedPayload::Bundle(_)));

        assert_eq!(proto.detect("whisper1:garbage"), DetectedPayload::Unknown);
        assert_eq!(proto.detect("just text"), DetectedPayload::Unknown);
    }

    #[test]
    fn oversized_plaintext_is_rejected_before_any_output() {
        let proto = protocol();
        let alice = Identity::generate("Alice");
        let bob = Identity::generate("Bob");
        let policy = Policy::default();

        let result = proto.encrypt(
            &alice,
            Recipient::Contact(&contact_for(&bob, "Bob")),
            &vec![0u8; 2000],
            &policy,
            false,
        );
        assert_eq!(result, Err(WhisperError::MessageTooLarge));
    }
}
