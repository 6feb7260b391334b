//! Supported AEAD methods and their wire parameters.
//!
//! Method names, numeric identifiers, and the key/nonce/tag lengths are
//! part of the wire format and must remain stable across deployments.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::CryptoError;

/// AEAD method negotiated out of band (both endpoints are configured with
/// the same name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    /// AES-128-GCM (128-bit key, 96-bit nonce).
    Aes128Gcm,
    /// AES-192-GCM (192-bit key, 96-bit nonce).
    Aes192Gcm,
    /// AES-256-GCM (256-bit key, 96-bit nonce).
    Aes256Gcm,
    /// Original ChaCha20-Poly1305 (256-bit key, 64-bit nonce). Pre-IETF
    /// construction kept for compatibility with older peers.
    ChaCha20Poly1305,
    /// ChaCha20-Poly1305 for IETF protocols (256-bit key, 96-bit nonce).
    ChaCha20IetfPoly1305,
    /// XChaCha20-Poly1305 (256-bit key, 192-bit nonce).
    XChaCha20IetfPoly1305,
}

impl Method {
    /// All supported methods, in wire-id order.
    pub const ALL: [Method; 6] = [
        Method::Aes128Gcm,
        Method::Aes192Gcm,
        Method::Aes256Gcm,
        Method::ChaCha20Poly1305,
        Method::ChaCha20IetfPoly1305,
        Method::XChaCha20IetfPoly1305,
    ];

    /// Key length in bytes.
    #[must_use]
    pub fn key_len(self) -> usize {
        match self {
            Method::Aes128Gcm => 16,
            Method::Aes192Gcm => 24,
            Method::Aes256Gcm
            | Method::ChaCha20Poly1305
            | Method::ChaCha20IetfPoly1305
            | Method::XChaCha20IetfPoly1305 => 32,
        }
    }

    /// Nonce length in bytes.
    #[must_use]
    pub fn nonce_len(self) -> usize {
        match self {
            Method::Aes128Gcm
            | Method::Aes192Gcm
            | Method::Aes256Gcm
            | Method::ChaCha20IetfPoly1305 => 12,
            Method::ChaCha20Poly1305 => 8,
            Method::XChaCha20IetfPoly1305 => 24,
        }
    }

    /// Authentication tag length in bytes (16 for every supported method).
    #[must_use]
    pub fn tag_len(self) -> usize {
        16
    }

    /// Session salt length in bytes; always equal to the key length.
    #[must_use]
    pub fn salt_len(self) -> usize {
        self.key_len()
    }

    /// Canonical configuration name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Method::Aes128Gcm => "aes-128-gcm",
            Method::Aes192Gcm => "aes-192-gcm",
            Method::Aes256Gcm => "aes-256-gcm",
            Method::ChaCha20Poly1305 => "chacha20-poly1305",
            Method::ChaCha20IetfPoly1305 => "chacha20-ietf-poly1305",
            Method::XChaCha20IetfPoly1305 => "xchacha20-ietf-poly1305",
        }
    }

    /// Return the numeric identifier for wire encoding.
    #[must_use]
    pub fn to_id(self) -> u8 {
        match self {
            Method::Aes128Gcm => 0,
            Method::Aes192Gcm => 1,
            Method::Aes256Gcm => 2,
            Method::ChaCha20Poly1305 => 3,
            Method::ChaCha20IetfPoly1305 => 4,
            Method::XChaCha20IetfPoly1305 => 5,
        }
    }

    /// Parse a method from its wire identifier.
    ///
    /// Returns `None` for unknown identifiers.
    #[must_use]
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Method::Aes128Gcm),
            1 => Some(Method::Aes192Gcm),
            2 => Some(Method::Aes256Gcm),
            3 => Some(Method::ChaCha20Poly1305),
            4 => Some(Method::ChaCha20IetfPoly1305),
            5 => Some(Method::XChaCha20IetfPoly1305),
            _ => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aes-128-gcm" => Ok(Method::Aes128Gcm),
            "aes-192-gcm" => Ok(Method::Aes192Gcm),
            "aes-256-gcm" => Ok(Method::Aes256Gcm),
            "chacha20-poly1305" => Ok(Method::ChaCha20Poly1305),
            "chacha20-ietf-poly1305" => Ok(Method::ChaCha20IetfPoly1305),
            "xchacha20-ietf-poly1305" => Ok(Method::XChaCha20IetfPoly1305),
            other => Err(CryptoError::UnknownMethod(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_table() {
        assert_eq!(Method::Aes128Gcm.key_len(), 16);
        assert_eq!(Method::Aes192Gcm.key_len(), 24);
        assert_eq!(Method::Aes256Gcm.key_len(), 32);
        assert_eq!(Method::ChaCha20Poly1305.key_len(), 32);

        assert_eq!(Method::Aes128Gcm.nonce_len(), 12);
        assert_eq!(Method::ChaCha20Poly1305.nonce_len(), 8);
        assert_eq!(Method::ChaCha20IetfPoly1305.nonce_len(), 12);
        assert_eq!(Method::XChaCha20IetfPoly1305.nonce_len(), 24);

        for method in Method::ALL {
            assert_eq!(method.tag_len(), 16);
            assert_eq!(method.salt_len(), method.key_len());
        }
    }

    #[test]
    fn test_wire_ids_stable() {
        for (expected, method) in Method::ALL.iter().enumerate() {
            assert_eq!(method.to_id() as usize, expected);
            assert_eq!(Method::from_id(method.to_id()), Some(*method));
        }
        assert_eq!(Method::from_id(6), None);
    }

    #[test]
    fn test_name_roundtrip() {
        for method in Method::ALL {
            assert_eq!(method.name().parse::<Method>().unwrap(), method);
            assert_eq!(method.to_string(), method.name());
        }
    }

    #[test]
    fn test_unknown_name_rejected() {
        let err = "rc4-md5".parse::<Method>().unwrap_err();
        assert!(matches!(err, CryptoError::UnknownMethod(_)));
    }
}
