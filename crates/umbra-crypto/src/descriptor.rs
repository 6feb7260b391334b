//! Per-connection cipher descriptor.

use core::fmt;
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::kdf;
use crate::method::Method;

/// Immutable pairing of a method and the master key derived from the
/// pre-shared password.
///
/// Created once at connection (or listener) setup and shared freely; all
/// mutable per-direction state lives in the session contexts. The master
/// key is wiped when the last clone is dropped.
#[derive(Clone)]
pub struct Descriptor {
    method: Method,
    master_key: Zeroizing<Vec<u8>>,
}

impl Descriptor {
    /// Derive a descriptor for `method` from the pre-shared password.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Internal`] if master key derivation fails.
    pub fn new(method: Method, password: &[u8]) -> Result<Self, CryptoError> {
        let master_key = kdf::derive_master_key(password, method.key_len())?;
        Ok(Self { method, master_key })
    }

    /// Parse `name` as a method and derive the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnknownMethod`] for unrecognized names.
    pub fn from_name(name: &str, password: &[u8]) -> Result<Self, CryptoError> {
        Self::new(name.parse()?, password)
    }

    /// The negotiated method.
    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Raw master key bytes.
    ///
    /// # Security
    ///
    /// Handle with care; this is the long-term secret every session key
    /// descends from.
    #[must_use]
    pub fn master_key(&self) -> &[u8] {
        &self.master_key
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}
