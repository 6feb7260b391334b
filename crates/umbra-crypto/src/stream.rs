//! TCP chunk codec.
//!
//! One direction of a connection is one context. The encryptor prepends
//! its salt on the first call, then frames plaintext into chunks:
//!
//! ```text
//! [salt : key_len]
//! [ seal(len_be16) : 2 + tag_len ][ seal(payload) : len + tag_len ] ...
//! ```
//!
//! Each chunk spends two consecutive nonce values, one for the length
//! header and one for the payload. The decryptor buffers arriving
//! ciphertext and drains every complete chunk it holds; a chunk whose
//! payload has not fully arrived leaves the stored nonce untouched, so
//! the length header is re-opened with the same counter value on the
//! next call until the whole chunk verifies.

use std::sync::Arc;

use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::aead::{SaltFilter, SealingKey};
use crate::descriptor::Descriptor;
use crate::error::CryptoError;
use crate::kdf;
use crate::method::Method;
use crate::nonce::Nonce;
use crate::random;

/// Largest plaintext payload per chunk. The two high bits of the length
/// field are reserved and must be zero on the wire.
pub const MAX_CHUNK_PAYLOAD: usize = 0x3FFF;

/// Length header size before sealing.
const LEN_FIELD: usize = 2;

/// Outbound half of a connection.
pub struct StreamEncryptor {
    method: Method,
    master_key: Zeroizing<Vec<u8>>,
    salt: Zeroizing<Vec<u8>>,
    sealer: Option<SealingKey>,
    nonce: Nonce,
}

impl StreamEncryptor {
    /// Fresh outbound context with a random salt.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::RandomFailed`] if the CSPRNG fails.
    pub fn new(descriptor: &Descriptor) -> Result<Self, CryptoError> {
        let method = descriptor.method();
        Ok(Self {
            method,
            master_key: Zeroizing::new(descriptor.master_key().to_vec()),
            salt: random::fresh_salt(method.salt_len())?,
            sealer: None,
            nonce: Nonce::zero(method.nonce_len()),
        })
    }

    /// The salt this stream announces. Stable for the context lifetime.
    #[must_use]
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// Seal `plaintext` into wire bytes.
    ///
    /// The first non-empty call prepends the salt. Plaintext longer than
    /// [`MAX_CHUNK_PAYLOAD`] is split across as many chunks as needed.
    /// An empty `plaintext` produces no output and does not touch the
    /// context.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::NonceExhausted`] if the chunk counter
    /// wrapped, or [`CryptoError::Internal`] on primitive failure. Both
    /// are terminal; the connection must be torn down.
    pub fn encrypt(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if plaintext.is_empty() {
            return Ok(Vec::new());
        }

        let tag_len = self.method.tag_len();
        let chunks = plaintext.len().div_ceil(MAX_CHUNK_PAYLOAD);
        let salt_bytes = if self.sealer.is_none() {
            self.salt.len()
        } else {
            0
        };
        let mut out =
            Vec::with_capacity(salt_bytes + plaintext.len() + chunks * (LEN_FIELD + 2 * tag_len));

        if self.sealer.is_none() {
            let subkey = kdf::derive_session_subkey(&self.master_key, &self.salt)?;
            self.sealer = Some(SealingKey::new(self.method, &subkey)?);
            self.nonce = Nonce::zero(self.method.nonce_len());
            out.extend_from_slice(&self.salt);
            debug!(method = %self.method, "outbound stream armed");
        }
        let sealer = self
            .sealer
            .as_ref()
            .ok_or(CryptoError::Internal("unarmed stream context"))?;

        for chunk in plaintext.chunks(MAX_CHUNK_PAYLOAD) {
            let len_be = (chunk.len() as u16).to_be_bytes();
            out.extend_from_slice(&sealer.seal(self.nonce.bytes()?, b"", &len_be)?);
            self.nonce.advance();
            out.extend_from_slice(&sealer.seal(self.nonce.bytes()?, b"", chunk)?);
            self.nonce.advance();
        }
        Ok(out)
    }
}

/// Inbound half of a connection.
///
/// Fatal errors poison the context; every later call fails. Destroy the
/// context and reset the connection instead of retrying.
pub struct StreamDecryptor {
    method: Method,
    master_key: Zeroizing<Vec<u8>>,
    filter: Option<Arc<SaltFilter>>,
    opener: Option<SealingKey>,
    nonce: Nonce,
    buffer: Zeroizing<Vec<u8>>,
    poisoned: bool,
}

impl StreamDecryptor {
    /// Fresh inbound context without replay suppression (client role).
    #[must_use]
    pub fn new(descriptor: &Descriptor) -> Self {
        Self::build(descriptor, None)
    }

    /// Fresh inbound context that vets salts against `filter` before
    /// keying (server role).
    #[must_use]
    pub fn with_replay_filter(descriptor: &Descriptor, filter: Arc<SaltFilter>) -> Self {
        Self::build(descriptor, Some(filter))
    }

    fn build(descriptor: &Descriptor, filter: Option<Arc<SaltFilter>>) -> Self {
        let method = descriptor.method();
        Self {
            method,
            master_key: Zeroizing::new(descriptor.master_key().to_vec()),
            filter,
            opener: None,
            nonce: Nonce::zero(method.nonce_len()),
            buffer: Zeroizing::new(Vec::new()),
            poisoned: false,
        }
    }

    /// Feed arriving ciphertext; returns every plaintext chunk that
    /// completed, concatenated in order.
    ///
    /// `Ok(None)` means the input was buffered but no chunk is complete
    /// yet; deliver more bytes and call again.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::ReplayDetected`] if the stream salt was already
    ///   observed (server role only).
    /// - [`CryptoError::Authentication`] on tag failure or a malformed
    ///   chunk length. No plaintext from the offending chunk is emitted.
    /// - [`CryptoError::NonceExhausted`] if the chunk counter wrapped.
    ///
    /// Every error is terminal: the context is poisoned and later calls
    /// fail with [`CryptoError::Internal`].
    pub fn decrypt(&mut self, input: &[u8]) -> Result<Option<Vec<u8>>, CryptoError> {
        if self.poisoned {
            return Err(CryptoError::Internal("stream context already failed"));
        }
        match self.consume(input) {
            Ok(out) => Ok(out),
            Err(err) => {
                self.poisoned = true;
                Err(err)
            }
        }
    }

    fn consume(&mut self, input: &[u8]) -> Result<Option<Vec<u8>>, CryptoError> {
        self.buffer.extend_from_slice(input);

        if self.opener.is_none() && !self.take_salt()? {
            return Ok(None);
        }

        let tag_len = self.method.tag_len();
        let header_len = LEN_FIELD + tag_len;
        let opener = self
            .opener
            .as_ref()
            .ok_or(CryptoError::Internal("unarmed stream context"))?;

        let mut out = Vec::new();
        // Drain complete chunks. Nonce increments commit only once the
        // payload verifies; a partial chunk re-opens its length header
        // with the same counter value next call.
        loop {
            if self.buffer.len() <= header_len + tag_len {
                break;
            }
            let mut trial = self.nonce.clone();

            let len_plain = opener.open(trial.bytes()?, b"", &self.buffer[..header_len])?;
            trial.advance();

            let payload_len = usize::from(u16::from_be_bytes([len_plain[0], len_plain[1]]));
            if payload_len == 0 || payload_len > MAX_CHUNK_PAYLOAD {
                warn!(payload_len, "chunk length outside protocol bounds");
                return Err(CryptoError::Authentication);
            }

            let chunk_len = header_len + payload_len + tag_len;
            if self.buffer.len() < chunk_len {
                break;
            }

            let payload = opener.open(trial.bytes()?, b"", &self.buffer[header_len..chunk_len])?;
            trial.advance();

            self.nonce = trial;
            out.extend_from_slice(&payload);
            self.buffer.drain(..chunk_len);
        }

        Ok(if out.is_empty() { None } else { Some(out) })
    }

    /// Try to consume the stream salt; true once the context is armed.
    fn take_salt(&mut self) -> Result<bool, CryptoError> {
        let salt_len = self.method.salt_len();
        if self.buffer.len() < salt_len {
            return Ok(false);
        }
        let salt = Zeroizing::new(self.buffer[..salt_len].to_vec());

        if let Some(filter) = &self.filter {
            if filter.contains(&salt)? {
                warn!(method = %self.method, "replayed stream salt, rejecting connection");
                return Err(CryptoError::ReplayDetected);
            }
            filter.insert(&salt)?;
        }

        let subkey = kdf::derive_session_subkey(&self.master_key, &salt)?;
        self.opener = Some(SealingKey::new(self.method, &subkey)?);
        self.nonce = Nonce::zero(self.method.nonce_len());
        self.buffer.drain(..salt_len);
        debug!(method = %self.method, "inbound stream armed");
        Ok(true)
    }
}
