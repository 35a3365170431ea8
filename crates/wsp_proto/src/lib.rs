//! wsp_proto — Wire formats for Whisper Secure Channel
//!
//! Everything a transport or a QR code ever carries is defined here, and it
//! is all printable ASCII: a self-contained `whisper1:` envelope string and
//! a `whisper-bundle:` key-exchange string.  The transport itself is out of
//! scope — both strings are opaque payloads to whatever carries them.
//!
//! # Modules
//! - `envelope` — the `whisper1:` encrypted message envelope + canonical AAD
//! - `padding`  — bucket padding that hides plaintext lengths
//! - `bundle`   — the `whisper-bundle:` public-key bundle for contact exchange

pub mod bundle;
pub mod envelope;
pub mod padding;

pub use bundle::{BundleError, KeyBundle};
pub use envelope::{canonical_aad, Envelope, EnvelopeError, FLAG_SIGNED};
pub use padding::PaddingError;
