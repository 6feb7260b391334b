//! Secure random number generation.
//!
//! All randomness comes from the operating system CSPRNG.

use zeroize::Zeroizing;

use crate::error::CryptoError;

/// Fill a buffer with random bytes from the OS CSPRNG.
///
/// # Errors
///
/// Returns [`CryptoError::RandomFailed`] if the underlying OS CSPRNG fails.
pub fn fill_random(buf: &mut [u8]) -> Result<(), CryptoError> {
    getrandom::getrandom(buf).map_err(|_| CryptoError::RandomFailed)
}

/// Generate a fresh session salt of the given length.
///
/// # Errors
///
/// Returns [`CryptoError::RandomFailed`] if the underlying OS CSPRNG fails.
pub fn fresh_salt(len: usize) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let mut salt = Zeroizing::new(vec![0u8; len]);
    fill_random(salt.as_mut_slice())?;
    Ok(salt)
}
