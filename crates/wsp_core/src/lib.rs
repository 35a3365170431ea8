//! wsp_core — Whisper Secure Channel domain model and protocol
//!
//! The layer a host application talks to.  It owns no storage and no
//! transport: identities and contacts are handed in as values, envelopes are
//! handed back as strings, and loading/saving both is entirely the caller's
//! concern.  The only shared mutable state in the crate is the replay cache
//! inside [`protocol::WhisperProtocol`].
//!
//! # Modules
//! - `identity` — local key-owning identities, rotation, bundle export
//! - `contact`  — peer records, trust state, immutable key history
//! - `replay`   — atomic duplicate-detection + freshness window
//! - `policy`   — the 4-flag security policy matrix
//! - `oracle`   — the external signing-oracle boundary (biometric gating)
//! - `protocol` — the root `encrypt` / `decrypt` / `detect` surface
//! - `error`    — the caller-facing error taxonomy
//!
//! # Key-change policy (NON-NEGOTIABLE)
//! Any change to a contact's keys resets that contact to Unverified and
//! appends the superseded keys to its history.  There is no code path that
//! re-trusts a contact across a key change without an explicit, new
//! verification.  See [`contact::Contact::with_key_rotation`].

pub mod contact;
pub mod error;
pub mod identity;
pub mod oracle;
pub mod policy;
pub mod protocol;
pub mod replay;

pub use contact::{Contact, KeyHistoryEntry, TrustLevel};
pub use error::{PolicyViolationKind, WhisperError};
pub use identity::{Identity, IdentityStatus};
pub use oracle::{LocalSigner, SigningDenied, SigningOracle};
pub use policy::Policy;
pub use protocol::{Attribution, DecryptedMessage, DetectedPayload, Recipient, WhisperProtocol};
pub use replay::{ReplayConfig, ReplayProtector};
