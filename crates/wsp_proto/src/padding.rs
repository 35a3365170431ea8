//! Length-hiding bucket padding.
//!
//! Plaintext is padded INSIDE the envelope, before encryption, so a
//! transport only ever sees ciphertexts of three sizes.
//!
//! Format: `[len: u16 BE] [message] [zero fill to the bucket boundary]`
//! Buckets (bytes): 256, 512, 1024.  A message that does not fit the largest
//! bucket (1022 bytes of payload) is rejected outright — oversized messages
//! are a caller bug, not something to leak the length of.
//!
//! `unpad` checks every fill byte with an OR-accumulate scan rather than a
//! short-circuit compare, so the time taken does not depend on where a
//! corrupt byte sits.  All failures collapse into one `InvalidPadding`.

use thiserror::Error;

/// Fixed bucket sizes, smallest first.
pub const BUCKETS: [usize; 3] = [256, 512, 1024];

const LEN_PREFIX: usize = 2;

/// Largest payload that fits any bucket.
pub const MAX_MESSAGE_LEN: usize = BUCKETS[2] - LEN_PREFIX;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaddingError {
    #[error("Message too large")]
    MessageTooLarge,

    #[error("Invalid padding")]
    InvalidPadding,
}

/// Smallest bucket that holds `len` payload bytes plus the length prefix.
pub fn select_bucket(len: usize) -> Result<usize, PaddingError> {
    BUCKETS
        .into_iter()
        .find(|&bucket| len + LEN_PREFIX <= bucket)
        .ok_or(PaddingError::MessageTooLarge)
}

/// Pad `msg` to its bucket: 2-byte big-endian length, message, zero fill.
pub fn pad(msg: &[u8]) -> Result<Vec<u8>, PaddingError> {
    let bucket = select_bucket(msg.len())?;
    let mut out = vec![0u8; bucket];
    out[..LEN_PREFIX].copy_from_slice(&(msg.len() as u16).to_be_bytes());
    out[LEN_PREFIX..LEN_PREFIX + msg.len()].copy_from_slice(msg);
    Ok(out)
}

/// Recover the message from a padded buffer, validating every fill byte.
pub fn unpad(padded: &[u8]) -> Result<Vec<u8>, PaddingError> {
    if !BUCKETS.contains(&padded.len()) {
        return Err(PaddingError::InvalidPadding);
    }

    let len = u16::from_be_bytes([padded[0], padded[1]]) as usize;
    if LEN_PREFIX + len > padded.len() {
        return Err(PaddingError::InvalidPadding);
    }

    // Constant-time over the fill region: accumulate, never short-circuit.
    let mut acc = 0u8;
    for &byte in &padded[LEN_PREFIX + len..] {
        acc |= byte;
    }
    if acc != 0 {
        return Err(PaddingError::InvalidPadding);
    }

    Ok(padded[LEN_PREFIX..LEN_PREFIX + len].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_unpad_roundtrip_all_buckets() {
        for len in [0, 1, 13, 254, 255, 510, 511, 1022] {
            let msg = vec![0x41u8; len];
            let padded = pad(&msg).unwrap();
            assert!(BUCKETS.contains(&padded.len()), "len {len}");
            assert_eq!(unpad(&padded).unwrap(), msg, "len {len}");
        }
    }

    #[test]
    fn bucket_selection_boundaries() {
        assert_eq!(select_bucket(0).unwrap(), 256);
        assert_eq!(select_bucket(254).unwrap(), 256);
        assert_eq!(select_bucket(255).unwrap(), 512);
        assert_eq!(select_bucket(510).unwrap(), 512);
        assert_eq!(select_bucket(511).unwrap(), 1024);
        assert_eq!(select_bucket(1022).unwrap(), 1024);
        assert_eq!(select_bucket(1023), Err(PaddingError::MessageTooLarge));
    }

    #[test]
    fn oversized_message_is_rejected() {
        assert_eq!(pad(&vec![0u8; 1023]), Err(PaddingError::MessageTooLarge));
        assert_eq!(pad(&vec![0u8; 4096]), Err(PaddingError::MessageTooLarge));
    }

    #[test]
    fn any_flipped_fill_byte_is_rejected() {
        let msg = b"short message";
        let clean = pad(msg).unwrap();
        for i in LEN_PREFIX + msg.len()..clean.len() {
            let mut corrupt = clean.clone();
            corrupt[i] ^= 0x01;
            assert_eq!(unpad(&corrupt), Err(PaddingError::InvalidPadding), "byte {i}");
        }
    }

    #[test]
    fn length_prefix_out_of_bounds_is_rejected() {
        let mut padded = pad(b"hi").unwrap();
        padded[0] = 0xFF;
        padded[1] = 0xFF;
        assert_eq!(unpad(&padded), Err(PaddingError::InvalidPadding));

        // Length that points exactly one past the end.
        let mut padded = pad(b"hi").unwrap();
        let bad = (padded.len() - LEN_PREFIX + 1) as u16;
        padded[..2].copy_from_slice(&bad.to_be_bytes());
        assert_eq!(unpad(&padded), Err(PaddingError::InvalidPadding));
    }

    #[test]
    fn non_bucket_buffer_is_rejected() {
        assert_eq!(unpad(&[0u8; 1]), Err(PaddingError::InvalidPadding));
        assert_eq!(unpad(&[0u8; 257]), Err(PaddingError::InvalidPadding));
        assert_eq!(unpad(&[]), Err(PaddingError::InvalidPadding));
    }

    #[test]
    fn max_length_message_has_no_fill() {
        let msg = vec![0x42u8; MAX_MESSAGE_LEN];
        let padded = pad(&msg).unwrap();
        assert_eq!(padded.len(), 1024);
        assert_eq!(unpad(&padded).unwrap(), msg);
    }
}
