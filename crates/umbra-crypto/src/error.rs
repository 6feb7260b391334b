//! Error types for the framing layer.

use thiserror::Error;

/// Errors that can occur while sealing or opening traffic.
///
/// Every variant is terminal for its scope: a failed stream operation
/// poisons the session context, a failed datagram operation drops the
/// datagram. The codec never retries. "Need more input" is not an error;
/// incremental decryption signals it with `Ok(None)`.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// AEAD tag verification failed, or a decrypted chunk length was
    /// zero or above the 14-bit cap. The connection must be torn down.
    #[error("authentication failed")]
    Authentication,

    /// The salt of an inbound stream or datagram was already observed
    /// within the filter's retention window.
    #[error("replayed salt detected")]
    ReplayDetected,

    /// Datagram shorter than the minimum envelope (salt plus tag).
    #[error("datagram too short: {0} bytes")]
    TooShort(usize),

    /// The little-endian nonce counter wrapped around. The session must
    /// be torn down; the counter is never reused.
    #[error("nonce counter exhausted")]
    NonceExhausted,

    /// Key material of the wrong length was handed to a primitive.
    #[error("invalid key length: expected {expected}, actual {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// No supported method goes by this name.
    #[error("unknown cipher method: {0}")]
    UnknownMethod(String),

    /// The operating system CSPRNG failed.
    #[error("random generation failed")]
    RandomFailed,

    /// Failure inside an underlying primitive or shared structure that
    /// should be impossible in normal operation. The transport decides
    /// whether to drop the connection or abort the process.
    #[error("internal crypto failure: {0}")]
    Internal(&'static str),
}

/// Result type for framing-layer operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
