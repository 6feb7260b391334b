//! Original (pre-IETF) ChaCha20-Poly1305 construction.
//!
//! The 64-bit-nonce AEAD from draft-agl-tls-chacha20poly1305: the
//! Poly1305 key is taken from the first 32 bytes of keystream block 0,
//! encryption starts at block 1, and the tag covers
//! `aad || le64(aad_len) || ciphertext || le64(ct_len)` without padding.
//! Maintained AEAD crates only ship the IETF variants, so this one is
//! assembled from the stream cipher and one-time MAC directly.

use chacha20::ChaCha20Legacy;
use chacha20::cipher::{NewCipher, StreamCipher};
use poly1305::Poly1305;
use poly1305::universal_hash::KeyInit;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

pub(crate) const KEY_LEN: usize = 32;
pub(crate) const NONCE_LEN: usize = 8;
pub(crate) const TAG_LEN: usize = 16;

/// Key for the legacy construction. Wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub(crate) struct LegacyChaCha20Poly1305 {
    key: [u8; KEY_LEN],
}

impl LegacyChaCha20Poly1305 {
    pub(crate) fn new(key: &[u8]) -> Result<Self, CryptoError> {
        if key.len() != KEY_LEN {
            return Err(CryptoError::InvalidKeyLength {
                expected: KEY_LEN,
                actual: key.len(),
            });
        }
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(key);
        Ok(Self { key: bytes })
    }

    /// Start the keystream for `nonce` and split off the one-time MAC key.
    fn start(&self, nonce: &[u8]) -> (ChaCha20Legacy, Poly1305) {
        debug_assert_eq!(nonce.len(), NONCE_LEN);
        let mut cipher = ChaCha20Legacy::new(
            chacha20::Key::from_slice(&self.key),
            chacha20::LegacyNonce::from_slice(nonce),
        );
        // Block 0 keys the MAC; the remaining 32 bytes are discarded and
        // the cipher is left positioned at block 1.
        let mut block0 = [0u8; 64];
        cipher.apply_keystream(&mut block0);
        let mac = Poly1305::new(poly1305::Key::from_slice(&block0[..32]));
        block0.zeroize();
        (cipher, mac)
    }

    fn tag_input(aad: &[u8], ciphertext: &[u8]) -> Vec<u8> {
        let mut data = Vec::with_capacity(aad.len() + ciphertext.len() + 16);
        data.extend_from_slice(aad);
        data.extend_from_slice(&(aad.len() as u64).to_le_bytes());
        data.extend_from_slice(ciphertext);
        data.extend_from_slice(&(ciphertext.len() as u64).to_le_bytes());
        data
    }

    pub(crate) fn seal(&self, nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Vec<u8> {
        let (mut cipher, mac) = self.start(nonce);

        let mut out = Vec::with_capacity(plaintext.len() + TAG_LEN);
        out.extend_from_slice(plaintext);
        cipher.apply_keystream(&mut out);

        let tag = mac.compute_unpadded(&Self::tag_input(aad, &out));
        out.extend_from_slice(tag.as_slice());
        out
    }

    pub(crate) fn open(
        &self,
        nonce: &[u8],
        aad: &[u8],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        if ciphertext.len() < TAG_LEN {
            return Err(CryptoError::Authentication);
        }
        let (body, received) = ciphertext.split_at(ciphertext.len() - TAG_LEN);
        let (mut cipher, mac) = self.start(nonce);

        let expected = mac.compute_unpadded(&Self::tag_input(aad, body));
        if !bool::from(received.ct_eq(expected.as_slice())) {
            return Err(CryptoError::Authentication);
        }

        let mut out = body.to_vec();
        cipher.apply_keystream(&mut out);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_roundtrip() {
        let key = LegacyChaCha20Poly1305::new(&[0x42u8; 32]).unwrap();
        let nonce = [0u8; 8];

        let sealed = key.seal(&nonce, b"", b"legacy payload");
        assert_eq!(sealed.len(), 14 + TAG_LEN);
        assert_eq!(key.open(&nonce, b"", &sealed).unwrap(), b"legacy payload");
    }

    #[test]
    fn test_legacy_aad_is_authenticated() {
        let key = LegacyChaCha20Poly1305::new(&[0x42u8; 32]).unwrap();
        let nonce = [0u8; 8];

        let sealed = key.seal(&nonce, b"header", b"payload");
        assert!(key.open(&nonce, b"header", &sealed).is_ok());
        assert!(key.open(&nonce, b"other", &sealed).is_err());
    }

    #[test]
    fn test_legacy_tamper_detected() {
        let key = LegacyChaCha20Poly1305::new(&[0x42u8; 32]).unwrap();
        let nonce = [1, 0, 0, 0, 0, 0, 0, 0];

        let mut sealed = key.seal(&nonce, b"", b"payload");
        let last = sealed.len() - 1;
        sealed[last] ^= 0x80;
        assert!(matches!(
            key.open(&nonce, b"", &sealed),
            Err(CryptoError::Authentication)
        ));
    }

    #[test]
    fn test_legacy_nonce_separates_streams() {
        let key = LegacyChaCha20Poly1305::new(&[0x42u8; 32]).unwrap();
        let a = key.seal(&[0u8; 8], b"", b"same plaintext");
        let b = key.seal(&[1, 0, 0, 0, 0, 0, 0, 0], b"", b"same plaintext");
        assert_ne!(a, b);
    }

    #[test]
    fn test_legacy_key_length_checked() {
        assert!(LegacyChaCha20Poly1305::new(&[0u8; 16]).is_err());
    }
}
