//! HKDF-SHA256 derivation of the per-message key and nonce.
//!
//! Both outputs come from one extract over (salt, shared secret) and are
//! separated by the labels `"key"` / `"nonce"` prepended to a shared `info`.
//! The `info` binds the derivation to this exact message: it carries the
//! ephemeral public key and the message id, so a derived (key, nonce) pair
//! can never be replayed under a different envelope.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// Domain prefix for the shared `info` input.
const INFO_DOMAIN: &[u8] = b"whisper1";

const KEY_LABEL: &[u8] = b"key";
const NONCE_LABEL: &[u8] = b"nonce";

/// Build the shared `info` for [`derive_keys`]: `"whisper1" ‖ epk ‖ msgid`.
pub fn binding_info(epk: &[u8; 32], msgid: &[u8; 16]) -> Vec<u8> {
    let mut info = Vec::with_capacity(INFO_DOMAIN.len() + 32 + 16);
    info.extend_from_slice(INFO_DOMAIN);
    info.extend_from_slice(epk);
    info.extend_from_slice(msgid);
    info
}

/// Derive the 32-byte AEAD key and 12-byte nonce for one message.
///
/// `info` must come from [`binding_info`] so the outputs are tied to the
/// message's ephemeral key and id.
pub fn derive_keys(
    shared_secret: &[u8; 32],
    salt: &[u8; 16],
    info: &[u8],
) -> Result<(Zeroizing<[u8; 32]>, [u8; 12]), CryptoError> {
    let hk = Hkdf::<Sha256>::new(Some(salt), shared_secret);

    let mut key = Zeroizing::new([0u8; 32]);
    hk.expand_multi_info(&[KEY_LABEL, info], key.as_mut())
        .map_err(|_| CryptoError::KeyDerivation)?;

    let mut nonce = [0u8; 12];
    hk.expand_multi_info(&[NONCE_LABEL, info], &mut nonce)
        .map_err(|_| CryptoError::KeyDerivation)?;

    Ok((key, nonce))
}
