//! BLAKE2b key derivation ladder.
//!
//! Two rungs: a master key derived once from the pre-shared password, and
//! a per-session subkey derived from the master key and the session salt.
//! The personalization string is part of the wire format; both ends must
//! use the same bytes or no session will ever authenticate.

use blake2::digest::consts::{U16, U24, U32};
use blake2::digest::{Mac, Update, VariableOutput};
use blake2::{Blake2bMac, Blake2bVar};
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// Personalization tag for session subkey derivation. Frozen deployment
/// constant; zero-padded to the 16-byte BLAKE2b personal field.
pub const SUBKEY_PERSONA: &[u8] = b"ss-subkey";

/// BLAKE2b salt parameter length. Session salts longer than this are
/// truncated, shorter ones zero-padded.
const SALT_PARAM_LEN: usize = 16;

/// Derive the master key from the pre-shared password.
///
/// Unkeyed BLAKE2b with `out_len` output bytes. Deterministic. This is a
/// key derivation, not a password hash -- it is never stored and offers
/// no protection for low-entropy passwords at rest.
///
/// # Errors
///
/// Returns [`CryptoError::Internal`] if `out_len` is not a valid BLAKE2b
/// output length (the supported methods only request 16, 24, or 32).
pub fn derive_master_key(password: &[u8], out_len: usize) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let mut hasher =
        Blake2bVar::new(out_len).map_err(|_| CryptoError::Internal("bad master key length"))?;
    hasher.update(password);

    let mut out = Zeroizing::new(vec![0u8; out_len]);
    hasher
        .finalize_variable(out.as_mut_slice())
        .map_err(|_| CryptoError::Internal("blake2b finalization"))?;
    Ok(out)
}

/// Derive the per-session subkey from the master key and session salt.
///
/// Keyed BLAKE2b over the empty message, with the master key as the MAC
/// key, the salt folded into the 16-byte salt parameter, and
/// [`SUBKEY_PERSONA`] as the personalization. Output length equals the
/// master key length.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidKeyLength`] if the master key is not
/// 16, 24, or 32 bytes, and [`CryptoError::Internal`] if the primitive
/// rejects its parameters.
pub fn derive_session_subkey(
    master: &[u8],
    salt: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let mut salt_param = [0u8; SALT_PARAM_LEN];
    let take = salt.len().min(SALT_PARAM_LEN);
    salt_param[..take].copy_from_slice(&salt[..take]);

    let mut out = Zeroizing::new(vec![0u8; master.len()]);
    match master.len() {
        16 => {
            let mac = Blake2bMac::<U16>::new_with_salt_and_personal(
                master,
                &salt_param,
                SUBKEY_PERSONA,
            )
            .map_err(|_| CryptoError::Internal("blake2b parameters"))?;
            out.copy_from_slice(mac.finalize().into_bytes().as_slice());
        }
        24 => {
            let mac = Blake2bMac::<U24>::new_with_salt_and_personal(
                master,
                &salt_param,
                SUBKEY_PERSONA,
            )
            .map_err(|_| CryptoError::Internal("blake2b parameters"))?;
            out.copy_from_slice(mac.finalize().into_bytes().as_slice());
        }
        32 => {
            let mac = Blake2bMac::<U32>::new_with_salt_and_personal(
                master,
                &salt_param,
                SUBKEY_PERSONA,
            )
            .map_err(|_| CryptoError::Internal("blake2b parameters"))?;
            out.copy_from_slice(mac.finalize().into_bytes().as_slice());
        }
        other => {
            return Err(CryptoError::InvalidKeyLength {
                expected: 32,
                actual: other,
            });
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_master_key_deterministic() {
        let a = derive_master_key(b"correct horse", 32).unwrap();
        let b = derive_master_key(b"correct horse", 32).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn test_master_key_length_selects_output() {
        let k16 = derive_master_key(b"pw", 16).unwrap();
        let k24 = derive_master_key(b"pw", 24).unwrap();
        let k32 = derive_master_key(b"pw", 32).unwrap();
        assert_eq!(k16.len(), 16);
        assert_eq!(k24.len(), 24);
        assert_eq!(k32.len(), 32);
        // BLAKE2b folds the output length into the parameter block, so
        // the shorter keys are not prefixes of the longer ones.
        assert_ne!(&k32[..16], &k16[..]);
        assert_ne!(&k32[..24], &k24[..]);
    }

    #[test]
    fn test_master_key_password_sensitivity() {
        let a = derive_master_key(b"password-a", 32).unwrap();
        let b = derive_master_key(b"password-b", 32).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_subkey_deterministic_per_salt() {
        let master = derive_master_key(b"pw", 32).unwrap();
        let salt = [0x11u8; 32];

        let s1 = derive_session_subkey(&master, &salt).unwrap();
        let s2 = derive_session_subkey(&master, &salt).unwrap();
        assert_eq!(s1, s2);
        assert_eq!(s1.len(), 32);
    }

    #[test]
    fn test_subkey_differs_across_salts() {
        let master = derive_master_key(b"pw", 32).unwrap();
        let s1 = derive_session_subkey(&master, &[0x01u8; 32]).unwrap();
        let s2 = derive_session_subkey(&master, &[0x02u8; 32]).unwrap();
        assert_ne!(s1, s2);
    }

    #[test]
    fn test_subkey_differs_from_master() {
        let master = derive_master_key(b"pw", 32).unwrap();
        let sub = derive_session_subkey(&master, &[0x03u8; 32]).unwrap();
        assert_ne!(&sub[..], &master[..]);
    }

    #[test]
    fn test_subkey_every_key_length() {
        for len in [16usize, 24, 32] {
            let master = derive_master_key(b"pw", len).unwrap();
            let salt = vec![0x42u8; len];
            let sub = derive_session_subkey(&master, &salt).unwrap();
            assert_eq!(sub.len(), len);
        }
    }

    #[test]
    fn test_subkey_salt_truncated_to_parameter_block() {
        let master = derive_master_key(b"pw", 32).unwrap();
        // Only the first 16 salt bytes enter the BLAKE2b parameter block.
        let mut salt_a = [0x55u8; 32];
        let mut salt_b = [0x55u8; 32];
        salt_a[20] = 0xAA;
        salt_b[20] = 0xBB;
        let a = derive_session_subkey(&master, &salt_a).unwrap();
        let b = derive_session_subkey(&master, &salt_b).unwrap();
        assert_eq!(a, b);

        salt_a[3] = 0xAA;
        let c = derive_session_subkey(&master, &salt_a).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_subkey_rejects_odd_key_length() {
        let err = derive_session_subkey(&[0u8; 20], &[0u8; 20]).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidKeyLength { .. }));
    }
}
