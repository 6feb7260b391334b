//! Umbra AEAD framing layer.
//!
//! Turns an arbitrary byte stream (TCP) or discrete datagrams (UDP) into
//! authenticated ciphertext under a pre-shared password, and inverts the
//! transformation incrementally on the receiving side. The transport layer
//! owns sockets and scheduling; everything here is synchronous and
//! non-blocking.
//!
//! # Layout
//!
//! - [`method`] -- the supported AEAD methods and their wire parameters
//! - [`kdf`] -- BLAKE2b master-key and session-subkey derivation
//! - [`aead`] -- primitive adapter over the six methods, plus the
//!   server-side salt replay filter
//! - [`stream`] -- the TCP chunk codec ([`StreamEncryptor`] /
//!   [`StreamDecryptor`])
//! - [`datagram`] -- the one-shot UDP codec
//!
//! # Wire format
//!
//! One direction of a TCP connection carries a cleartext salt of
//! `key_len` bytes followed by length-prefixed chunks, each protected by
//! two AEAD invocations (one for the 2-byte big-endian length, one for
//! the payload, consuming consecutive nonce values). A UDP datagram is
//! `salt || seal(master_key, zero nonce, payload)`.

pub mod aead;
pub mod datagram;
pub mod descriptor;
pub mod error;
pub mod kdf;
pub mod method;
pub mod nonce;
pub mod random;
pub mod stream;

pub use aead::SaltFilter;
pub use descriptor::Descriptor;
pub use error::{CryptoError, Result};
pub use method::Method;
pub use stream::{StreamDecryptor, StreamEncryptor};
