//! Cipher-agnostic AEAD adapter.
//!
//! One [`SealingKey`] wraps whichever primitive the negotiated method
//! calls for and exposes a uniform seal/open surface. The cipher
//! instance is constructed once per key; per-call work is limited to the
//! AEAD itself.

use aes_gcm::aead::consts::U12;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::aes::Aes192;
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm};
use chacha20poly1305::{ChaCha20Poly1305, XChaCha20Poly1305};

use crate::aead::legacy::LegacyChaCha20Poly1305;
use crate::error::CryptoError;
use crate::method::Method;

/// AES-192-GCM; the upstream crate only aliases the 128- and 256-bit
/// variants.
type Aes192Gcm = AesGcm<Aes192, U12>;

enum Inner {
    Aes128Gcm(Aes128Gcm),
    Aes192Gcm(Aes192Gcm),
    Aes256Gcm(Aes256Gcm),
    ChaCha20Poly1305(LegacyChaCha20Poly1305),
    ChaCha20IetfPoly1305(ChaCha20Poly1305),
    XChaCha20IetfPoly1305(XChaCha20Poly1305),
}

/// An AEAD key bound to one of the supported methods.
///
/// Sealing appends the 16-byte tag to the ciphertext; opening expects it
/// there and verifies it before any plaintext is produced.
pub struct SealingKey {
    method: Method,
    inner: Inner,
}

impl std::fmt::Debug for SealingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealingKey")
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

impl SealingKey {
    /// Bind `key` to `method`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] if `key` does not match
    /// the method's key length.
    pub fn new(method: Method, key: &[u8]) -> Result<Self, CryptoError> {
        if key.len() != method.key_len() {
            return Err(CryptoError::InvalidKeyLength {
                expected: method.key_len(),
                actual: key.len(),
            });
        }
        let inner = match method {
            Method::Aes128Gcm => Inner::Aes128Gcm(
                Aes128Gcm::new_from_slice(key)
                    .map_err(|_| CryptoError::Internal("aes-128-gcm key setup"))?,
            ),
            Method::Aes192Gcm => Inner::Aes192Gcm(
                Aes192Gcm::new_from_slice(key)
                    .map_err(|_| CryptoError::Internal("aes-192-gcm key setup"))?,
            ),
            Method::Aes256Gcm => Inner::Aes256Gcm(
                Aes256Gcm::new_from_slice(key)
                    .map_err(|_| CryptoError::Internal("aes-256-gcm key setup"))?,
            ),
            Method::ChaCha20Poly1305 => {
                Inner::ChaCha20Poly1305(LegacyChaCha20Poly1305::new(key)?)
            }
            Method::ChaCha20IetfPoly1305 => Inner::ChaCha20IetfPoly1305(
                ChaCha20Poly1305::new_from_slice(key)
                    .map_err(|_| CryptoError::Internal("chacha20-poly1305 key setup"))?,
            ),
            Method::XChaCha20IetfPoly1305 => Inner::XChaCha20IetfPoly1305(
                XChaCha20Poly1305::new_from_slice(key)
                    .map_err(|_| CryptoError::Internal("xchacha20-poly1305 key setup"))?,
            ),
        };
        Ok(Self { method, inner })
    }

    /// The method this key is bound to.
    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Encrypt `plaintext`, returning `ciphertext || tag`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Internal`] if the nonce length does not
    /// match the method or the primitive fails.
    pub fn seal(&self, nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if nonce.len() != self.method.nonce_len() {
            return Err(CryptoError::Internal("nonce length mismatch"));
        }
        let payload = Payload {
            msg: plaintext,
            aad,
        };
        match &self.inner {
            Inner::Aes128Gcm(cipher) => cipher
                .encrypt(GenericArray::from_slice(nonce), payload)
                .map_err(|_| CryptoError::Internal("aead seal")),
            Inner::Aes192Gcm(cipher) => cipher
                .encrypt(GenericArray::from_slice(nonce), payload)
                .map_err(|_| CryptoError::Internal("aead seal")),
            Inner::Aes256Gcm(cipher) => cipher
                .encrypt(GenericArray::from_slice(nonce), payload)
                .map_err(|_| CryptoError::Internal("aead seal")),
            Inner::ChaCha20Poly1305(cipher) => Ok(cipher.seal(nonce, aad, plaintext)),
            Inner::ChaCha20IetfPoly1305(cipher) => cipher
                .encrypt(GenericArray::from_slice(nonce), payload)
                .map_err(|_| CryptoError::Internal("aead seal")),
            Inner::XChaCha20IetfPoly1305(cipher) => cipher
                .encrypt(GenericArray::from_slice(nonce), payload)
                .map_err(|_| CryptoError::Internal("aead seal")),
        }
    }

    /// Decrypt `ciphertext || tag`, verifying the tag first.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Authentication`] if the input is shorter
    /// than a tag or verification fails. No plaintext is produced on
    /// failure.
    pub fn open(&self, nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if nonce.len() != self.method.nonce_len() {
            return Err(CryptoError::Internal("nonce length mismatch"));
        }
        if ciphertext.len() < self.method.tag_len() {
            return Err(CryptoError::Authentication);
        }
        let payload = Payload {
            msg: ciphertext,
            aad,
        };
        match &self.inner {
            Inner::Aes128Gcm(cipher) => cipher
                .decrypt(GenericArray::from_slice(nonce), payload)
                .map_err(|_| CryptoError::Authentication),
            Inner::Aes192Gcm(cipher) => cipher
                .decrypt(GenericArray::from_slice(nonce), payload)
                .map_err(|_| CryptoError::Authentication),
            Inner::Aes256Gcm(cipher) => cipher
                .decrypt(GenericArray::from_slice(nonce), payload)
                .map_err(|_| CryptoError::Authentication),
            Inner::ChaCha20Poly1305(cipher) => cipher.open(nonce, aad, ciphertext),
            Inner::ChaCha20IetfPoly1305(cipher) => cipher
                .decrypt(GenericArray::from_slice(nonce), payload)
                .map_err(|_| CryptoError::Authentication),
            Inner::XChaCha20IetfPoly1305(cipher) => cipher
                .decrypt(GenericArray::from_slice(nonce), payload)
                .map_err(|_| CryptoError::Authentication),
        }
    }
}
