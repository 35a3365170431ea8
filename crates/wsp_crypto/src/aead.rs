//! Authenticated Encryption with Associated Data
//!
//! ChaCha20-Poly1305 (RFC 8439).  Key: 32 bytes.  Nonce: 12 bytes.  Tag: 16 bytes.
//!
//! Unlike a random-nonce construction, the nonce here is supplied by the
//! caller: it is HKDF-derived alongside the key (see `kdf`) and reconstructed
//! by the recipient from the envelope's salt/epk/msgid, so it never travels
//! on the wire.  Any decryption failure — wrong key, wrong nonce, wrong AAD,
//! flipped ciphertext bit — is one opaque error.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Nonce,
};
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// Encrypt `plaintext` under a derived key/nonce with authenticated `aad`.
pub fn encrypt(
    key: &[u8; 32],
    nonce: &[u8; 12],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = ChaCha20Poly1305::new_from_slice(key).map_err(|_| CryptoError::AeadEncrypt)?;
    cipher
        .encrypt(Nonce::from_slice(nonce), Payload { msg: plaintext, aad })
        .map_err(|_| CryptoError::AeadEncrypt)
}

/// Decrypt ciphertext+tag.  Plaintext is zeroized on drop.
pub fn decrypt(
    key: &[u8; 32],
    nonce: &[u8; 12],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let cipher = ChaCha20Poly1305::new_from_slice(key).map_err(|_| CryptoError::AeadDecrypt)?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), Payload { msg: ciphertext, aad })
        .map_err(|_| CryptoError::AeadDecrypt)?;
    Ok(Zeroizing::new(plaintext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let key = [0x42u8; 32];
        let nonce = [0x24u8; 12];
        let ct = encrypt(&key, &nonce, b"secret", b"header").unwrap();
        let pt = decrypt(&key, &nonce, &ct, b"header").unwrap();
        assert_eq!(&pt[..], b"secret");
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let key = [0x42u8; 32];
        let nonce = [0x24u8; 12];
        let mut ct = encrypt(&key, &nonce, b"secret", b"header").unwrap();
        ct[0] ^= 1;
        assert!(matches!(
            decrypt(&key, &nonce, &ct, b"header"),
            Err(CryptoError::AeadDecrypt)
        ));
    }

    #[test]
    fn wrong_aad_fails_same_as_wrong_key() {
        let key = [0x42u8; 32];
        let nonce = [0x24u8; 12];
        let ct = encrypt(&key, &nonce, b"secret", b"header").unwrap();

        let wrong_aad = decrypt(&key, &nonce, &ct, b"other").unwrap_err();
        let wrong_key = decrypt(&[0x43u8; 32], &nonce, &ct, b"header").unwrap_err();

        assert!(matches!(wrong_aad, CryptoError::AeadDecrypt));
        assert!(matches!(wrong_key, CryptoError::AeadDecrypt));
    }
}
