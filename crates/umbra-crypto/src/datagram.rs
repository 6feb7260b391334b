//! One-shot datagram codec.
//!
//! Every datagram is an independent crypto unit:
//!
//! ```text
//! [salt : key_len][ seal(payload) : len + tag_len ]
//! ```
//!
//! The salt exists for replay suppression only; sealing uses the master
//! key with an all-zero nonce. For the 8-byte-nonce method this means
//! the (key, nonce) pair repeats across every datagram under one
//! password -- a known limitation of the deployed protocol, preserved
//! here for wire compatibility.

use tracing::warn;

use crate::aead::{SaltFilter, SealingKey};
use crate::descriptor::Descriptor;
use crate::error::CryptoError;
use crate::nonce::Nonce;
use crate::random;

/// Seal one datagram.
///
/// # Errors
///
/// Returns [`CryptoError::RandomFailed`] if salt generation fails, or
/// [`CryptoError::Internal`] on primitive failure.
pub fn seal(descriptor: &Descriptor, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let method = descriptor.method();
    let salt = random::fresh_salt(method.salt_len())?;
    let key = SealingKey::new(method, descriptor.master_key())?;
    let nonce = Nonce::zero(method.nonce_len());

    let mut out = Vec::with_capacity(method.salt_len() + plaintext.len() + method.tag_len());
    out.extend_from_slice(&salt);
    out.extend_from_slice(&key.seal(nonce.bytes()?, b"", plaintext)?);
    Ok(out)
}

/// Open one datagram. Pass the shared [`SaltFilter`] on the server role;
/// clients pass `None`.
///
/// The replay check runs before any AEAD work so a flood of replayed
/// datagrams cannot buy CPU time, and the salt is recorded only after
/// the tag verifies so unauthenticated garbage cannot pollute the
/// filter.
///
/// # Errors
///
/// - [`CryptoError::TooShort`] if the datagram cannot hold a salt and
///   tag. Drop the datagram.
/// - [`CryptoError::ReplayDetected`] if the salt was already observed.
/// - [`CryptoError::Authentication`] on tag failure.
pub fn open(
    descriptor: &Descriptor,
    datagram: &[u8],
    filter: Option<&SaltFilter>,
) -> Result<Vec<u8>, CryptoError> {
    let method = descriptor.method();
    if datagram.len() <= method.salt_len() + method.tag_len() {
        return Err(CryptoError::TooShort(datagram.len()));
    }
    let (salt, body) = datagram.split_at(method.salt_len());

    if let Some(filter) = filter {
        if filter.contains(salt)? {
            warn!(method = %method, "replayed datagram salt, dropping");
            return Err(CryptoError::ReplayDetected);
        }
    }

    let key = SealingKey::new(method, descriptor.master_key())?;
    let nonce = Nonce::zero(method.nonce_len());
    let plaintext = key.open(nonce.bytes()?, b"", body)?;

    if let Some(filter) = filter {
        filter.insert(salt)?;
    }
    Ok(plaintext)
}
