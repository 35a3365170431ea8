//! CSPRNG access.
//!
//! Thin wrappers over the OS RNG that fail loudly.  There is deliberately no
//! fallback source: if the platform RNG is unavailable the caller gets
//! `RandomGeneration`, never weaker bytes.

use rand::rngs::OsRng;
use rand_core::RngCore;

use crate::error::CryptoError;

/// Fill `buf` with random bytes from the OS CSPRNG.
pub fn fill_random(buf: &mut [u8]) -> Result<(), CryptoError> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|_| CryptoError::RandomGeneration)
}

/// Return `n` random bytes.
pub fn secure_random(n: usize) -> Result<Vec<u8>, CryptoError> {
    let mut buf = vec![0u8; n];
    fill_random(&mut buf)?;
    Ok(buf)
}

/// Return a random fixed-size array (salts, message ids).
pub fn random_array<const N: usize>() -> Result<[u8; N], CryptoError> {
    let mut buf = [0u8; N];
    fill_random(&mut buf)?;
    Ok(buf)
}
