//! SHA-256 fingerprints and their human-facing renderings.
//!
//! One hash, several renderings:
//! - `fingerprint`       — 32-byte SHA-256 over the concatenated public keys
//! - `recipient_key_id`  — lower 8 bytes of SHA-256(x25519 public); routes an
//!                         envelope to a local identity without naming the key
//! - `short_fingerprint` — 12 Base32-Crockford chars (first 60 bits), for
//!                         contact cards and quick visual comparison
//! - `sas_words`         — 6 words for spoken out-of-band verification
//!
//! SHA-256 is the canonical hash for all of these.

use sha2::{Digest, Sha256};

/// Identity fingerprint: SHA-256(x25519Pub ‖ ed25519Pub).
/// The Ed25519 half is simply absent from the input when the identity has no
/// signing key, so signing-capable and agreement-only identities never collide.
pub fn fingerprint(x25519_public: &[u8; 32], ed25519_public: Option<&[u8; 32]>) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(x25519_public);
    if let Some(ed) = ed25519_public {
        hasher.update(ed);
    }
    hasher.finalize().into()
}

/// 8-byte recipient key id: lower 8 bytes of SHA-256(x25519 public).
pub fn recipient_key_id(x25519_public: &[u8; 32]) -> [u8; 8] {
    let digest: [u8; 32] = Sha256::digest(x25519_public).into();
    let mut rkid = [0u8; 8];
    rkid.copy_from_slice(&digest[24..]);
    rkid
}

/// Constant-time fingerprint comparison (OR-accumulate, never short-circuit).
pub fn fingerprints_match(a: &[u8; 32], b: &[u8; 32]) -> bool {
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

// ── Short fingerprint (Base32-Crockford) ─────────────────────────────────────

const CROCKFORD: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// 12-character Crockford-Base32 rendering of the fingerprint's first 60 bits.
pub fn short_fingerprint(fingerprint: &[u8; 32]) -> String {
    // 12 chars × 5 bits = 60 bits = the top bits of the first 8 bytes.
    let mut first = [0u8; 8];
    first.copy_from_slice(&fingerprint[..8]);
    let mut acc = u64::from_be_bytes(first);

    let mut out = String::with_capacity(12);
    for _ in 0..12 {
        out.push(CROCKFORD[(acc >> 59) as usize] as char);
        acc <<= 5;
    }
    out
}

// ── SAS words ────────────────────────────────────────────────────────────────

/// Six short-authentication-string words: one per fingerprint byte, indexed
/// into a fixed 256-word list.  Both parties read them aloud; six words
/// (48 bits) is enough for a human check against an active MITM.
pub fn sas_words(fingerprint: &[u8; 32]) -> [&'static str; 6] {
    let mut words = [""; 6];
    for (i, word) in words.iter_mut().enumerate() {
        *word = SAS_WORDLIST[fingerprint[i] as usize];
    }
    words
}

/// 256 short, phonetically distinct English words.
#[rustfmt::skip]
const SAS_WORDLIST: [&str; 256] = [
    "acid", "acorn", "adobe", "after", "alarm", "album", "alley", "amber",
    "angle", "ankle", "apple", "april", "arrow", "ashes", "atlas", "attic",
    "badge", "bagel", "baker", "bamboo", "banjo", "barn", "basil", "beach",
    "beacon", "bell", "berry", "bison", "blade", "blanket", "blossom", "bolt",
    "bonus", "book", "boots", "bottle", "branch", "brass", "bread", "brick",
    "bridge", "broom", "brush", "bucket", "bugle", "butter", "cabin", "cactus",
    "camel", "candle", "canoe", "canvas", "carbon", "cargo", "carpet", "castle",
    "cedar", "cello", "chalk", "cherry", "chess", "chime", "cider", "circle",
    "citrus", "clay", "cliff", "clock", "cloud", "clover", "cobalt", "coffee",
    "comet", "compass", "copper", "coral", "cotton", "cradle", "crane", "crater",
    "crayon", "cricket", "crown", "crystal", "cube", "daisy", "dawn", "delta",
    "denim", "desert", "diesel", "dome", "donkey", "dragon", "drum", "dune",
    "eagle", "easel", "echo", "eclipse", "ember", "emerald", "engine", "envelope",
    "fabric", "falcon", "feather", "fence", "fern", "fiddle", "flame", "flask",
    "flint", "flute", "forest", "fossil", "fountain", "fox", "frost", "galaxy",
    "garden", "garlic", "gazebo", "geyser", "ginger", "glacier", "globe", "goose",
    "granite", "grape", "gravel", "guitar", "hammer", "harbor", "harp", "hazel",
    "helmet", "heron", "hill", "honey", "horizon", "hornet", "hotel", "igloo",
    "indigo", "iron", "island", "ivory", "jacket", "jade", "jasmine", "jigsaw",
    "jungle", "juniper", "kayak", "kettle", "kiwi", "knight", "koala", "lagoon",
    "lantern", "lava", "lemon", "lilac", "lily", "lime", "linen", "lizard",
    "lobster", "locket", "lotus", "lumber", "magnet", "mango", "maple", "marble",
    "meadow", "melon", "mesa", "meteor", "mint", "mirror", "monsoon", "moon",
    "mosaic", "moss", "moth", "mountain", "mulberry", "mustard", "nebula", "nectar",
    "nickel", "night", "nutmeg", "oasis", "ocean", "olive", "onion", "opal",
    "orange", "orbit", "orchid", "otter", "owl", "oyster", "paddle", "pagoda",
    "panda", "paper", "parrot", "peach", "pearl", "pebble", "pelican", "pepper",
    "piano", "pigeon", "pillow", "pine", "planet", "plum", "pocket", "pond",
    "poppy", "prairie", "prism", "pumpkin", "quarry", "quartz", "quill", "rabbit",
    "raft", "rain", "raisin", "raven", "reef", "ribbon", "river", "robin",
    "rocket", "rose", "ruby", "saddle", "saffron", "sage", "salmon", "sand",
    "sapphire", "silver", "sparrow", "sunset", "thistle", "tulip", "velvet", "willow",
];
