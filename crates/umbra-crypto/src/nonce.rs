//! Little-endian counting nonce.
//!
//! Each direction of a session owns one counter, zeroed when the subkey
//! is derived and incremented exactly once per AEAD call. A counter that
//! wraps is exhausted: the session must be torn down rather than reuse a
//! nonce value.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

/// Largest nonce length among the supported methods (XChaCha20).
pub const MAX_NONCE_LEN: usize = 24;

/// A counting nonce of method-specific length.
///
/// Cloning yields an independent counter; the stream decoder relies on
/// this to trial-advance over a partially buffered chunk and commit only
/// once the whole chunk verifies.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Nonce {
    bytes: [u8; MAX_NONCE_LEN],
    len: usize,
    exhausted: bool,
}

impl Nonce {
    /// A zero counter of the given length.
    #[must_use]
    pub fn zero(len: usize) -> Self {
        debug_assert!(len <= MAX_NONCE_LEN);
        Self {
            bytes: [0u8; MAX_NONCE_LEN],
            len,
            exhausted: false,
        }
    }

    /// Current counter value as wire bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::NonceExhausted`] once the counter has
    /// wrapped; the value must never be handed to an AEAD again.
    pub fn bytes(&self) -> Result<&[u8], CryptoError> {
        if self.exhausted {
            return Err(CryptoError::NonceExhausted);
        }
        Ok(&self.bytes[..self.len])
    }

    /// Advance the counter by one (little-endian increment).
    ///
    /// Wrapping back to zero marks the counter exhausted; the next
    /// [`Nonce::bytes`] call fails.
    pub fn advance(&mut self) {
        let mut carry = true;
        for b in &mut self.bytes[..self.len] {
            if carry {
                let (v, c) = b.overflowing_add(1);
                *b = v;
                carry = c;
            } else {
                break;
            }
        }
        if carry {
            self.exhausted = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_is_little_endian() {
        let mut n = Nonce::zero(12);
        n.advance();
        assert_eq!(n.bytes().unwrap(), &[1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);

        for _ in 0..255 {
            n.advance();
        }
        assert_eq!(n.bytes().unwrap(), &[0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_carry_propagates() {
        let mut n = Nonce::zero(8);
        n.bytes[..3].copy_from_slice(&[0xFF, 0xFF, 0xFF]);
        n.advance();
        assert_eq!(n.bytes().unwrap(), &[0, 0, 0, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn test_wrap_marks_exhausted() {
        let mut n = Nonce::zero(8);
        n.bytes[..8].copy_from_slice(&[0xFF; 8]);
        n.advance();
        assert!(matches!(n.bytes(), Err(CryptoError::NonceExhausted)));
    }

    #[test]
    fn test_clone_is_independent() {
        let mut a = Nonce::zero(12);
        let b = a.clone();
        a.advance();
        assert_eq!(b.bytes().unwrap(), &[0u8; 12]);
        assert_ne!(a.bytes().unwrap(), b.bytes().unwrap());
    }
}
