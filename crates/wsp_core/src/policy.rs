//! The security-policy matrix.
//!
//! Four independent booleans, persisted by the host and handed in read-only
//! per operation — the core never flips a policy flag itself.  Evaluation is
//! a pure function over a small context snapshot, called once before
//! encryption and once before decrypt-side attribution.
//!
//! The historical `require_signature_for_verified` flag was superseded by
//! the blanket `always_include_signatures`; this matrix implements the
//! successor.  The rule both versions agreed on — traffic with a Verified
//! contact is always signed — holds unconditionally.

use serde::{Deserialize, Serialize};

use crate::contact::TrustLevel;
use crate::error::PolicyViolationKind;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Policy {
    /// Refuse to encrypt to a raw public key that is not a saved contact.
    pub contact_required_to_send: bool,
    /// Sign every outgoing message; reject unsigned incoming ones.
    pub always_include_signatures: bool,
    /// On identity rotation, file the superseded identity as Archived
    /// immediately instead of leaving it in the Rotated state.
    pub auto_archive_on_rotation: bool,
    /// Route signing through the external signing oracle (secure enclave +
    /// biometric prompt) instead of touching raw key material.
    pub biometric_gated_signing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Send,
    Receive,
}

/// Snapshot of the facts `evaluate` rules on.
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext {
    pub direction: Direction,
    /// The peer is a saved contact.
    pub contact_known: bool,
    /// Trust state of that contact, when known.
    pub contact_trust: Option<TrustLevel>,
    pub contact_blocked: bool,
    /// Send: the message will carry a signature.
    /// Receive: the envelope carries one.
    pub signature_present: bool,
}

impl PolicyContext {
    pub fn send(contact: Option<&crate::contact::Contact>, will_sign: bool) -> Self {
        Self {
            direction: Direction::Send,
            contact_known: contact.is_some(),
            contact_trust: contact.map(|c| c.trust_level),
            contact_blocked: contact.is_some_and(|c| c.is_blocked),
            signature_present: will_sign,
        }
    }

    pub fn receive(signature_present: bool) -> Self {
        Self {
            direction: Direction::Receive,
            contact_known: false,
            contact_trust: None,
            contact_blocked: false,
            signature_present,
        }
    }
}

/// Evaluate the policy matrix against one operation.  Pure; no side effects,
/// no state.  The first violated rule wins.
pub fn evaluate(policy: &Policy, ctx: &PolicyContext) -> Result<(), PolicyViolationKind> {
    if ctx.contact_blocked {
        return Err(PolicyViolationKind::ContactBlocked);
    }

    if ctx.direction == Direction::Send
        && policy.contact_required_to_send
        && !ctx.contact_known
    {
        return Err(PolicyViolationKind::ContactRequired);
    }

    if policy.always_include_signatures && !ctx.signature_present {
        return Err(PolicyViolationKind::SignatureRequired);
    }

    // Verified contacts always exchange signed traffic, flag or no flag.
    if ctx.contact_trust == Some(TrustLevel::Verified) && !ctx.signature_present {
        return Err(PolicyViolationKind::SignatureRequired);
    }

    Ok(())
}
