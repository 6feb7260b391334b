//! Salt replay suppression.
//!
//! A server accepts a given session salt at most once within the
//! filter's retention window; a repeated salt means a captured stream or
//! datagram is being replayed. Salts from TCP streams and UDP datagrams
//! feed the same filter.
//!
//! The set is a scalable Bloom filter: a sequence of slices whose
//! capacity doubles and whose target error rate halves as earlier slices
//! fill, so the compound false-positive rate stays bounded no matter how
//! many salts a long-running server observes. False positives cost one
//! spuriously dropped connection; false negatives never occur.

use std::sync::Mutex;

use crate::error::CryptoError;

/// Salts the first slice is sized for.
const DEFAULT_CAPACITY: usize = 1_000_000;

/// Target false-positive rate of the first slice.
const DEFAULT_ERROR_RATE: f64 = 1e-6;

/// Capacity multiplier for each additional slice.
const GROWTH_FACTOR: usize = 2;

/// Error-rate multiplier for each additional slice.
const TIGHTENING_RATIO: f64 = 0.5;

/// One fixed-size Bloom slice.
struct Slice {
    bits: Vec<u64>,
    bit_count: u64,
    hashes: u32,
    inserted: usize,
    capacity: usize,
}

impl Slice {
    fn with_parameters(capacity: usize, error_rate: f64) -> Self {
        let ln2 = core::f64::consts::LN_2;
        let bit_count = ((capacity as f64) * error_rate.ln().abs() / (ln2 * ln2))
            .ceil()
            .max(64.0) as u64;
        let hashes = (1.0 / error_rate).log2().ceil().max(1.0) as u32;
        Self {
            bits: vec![0u64; bit_count.div_ceil(64) as usize],
            bit_count,
            hashes,
            inserted: 0,
            capacity,
        }
    }

    fn index(&self, h1: u64, h2: u64, round: u32) -> (usize, u64) {
        let bit = h1.wrapping_add(u64::from(round).wrapping_mul(h2)) % self.bit_count;
        ((bit / 64) as usize, 1u64 << (bit % 64))
    }

    fn set(&mut self, h1: u64, h2: u64) {
        for round in 0..self.hashes {
            let (word, mask) = self.index(h1, h2, round);
            self.bits[word] |= mask;
        }
        self.inserted += 1;
    }

    fn contains(&self, h1: u64, h2: u64) -> bool {
        (0..self.hashes).all(|round| {
            let (word, mask) = self.index(h1, h2, round);
            self.bits[word] & mask != 0
        })
    }

    fn full(&self) -> bool {
        self.inserted >= self.capacity
    }
}

struct ScalableBloom {
    slices: Vec<Slice>,
    next_capacity: usize,
    next_error_rate: f64,
    observed: usize,
}

impl ScalableBloom {
    fn with_parameters(capacity: usize, error_rate: f64) -> Self {
        Self {
            slices: vec![Slice::with_parameters(capacity, error_rate)],
            next_capacity: capacity.saturating_mul(GROWTH_FACTOR),
            next_error_rate: error_rate * TIGHTENING_RATIO,
            observed: 0,
        }
    }

    fn insert(&mut self, h1: u64, h2: u64) {
        if self.slices.last().is_none_or(Slice::full) {
            self.slices
                .push(Slice::with_parameters(self.next_capacity, self.next_error_rate));
            self.next_capacity = self.next_capacity.saturating_mul(GROWTH_FACTOR);
            self.next_error_rate *= TIGHTENING_RATIO;
        }
        if let Some(slice) = self.slices.last_mut() {
            slice.set(h1, h2);
        }
        self.observed += 1;
    }

    fn contains(&self, h1: u64, h2: u64) -> bool {
        self.slices.iter().any(|slice| slice.contains(h1, h2))
    }
}

/// Double-hashing base values for a salt.
fn index_hashes(salt: &[u8]) -> (u64, u64) {
    let digest = blake3::hash(salt);
    let bytes = digest.as_bytes();
    let mut h1 = [0u8; 8];
    let mut h2 = [0u8; 8];
    h1.copy_from_slice(&bytes[..8]);
    h2.copy_from_slice(&bytes[8..16]);
    // Odd step so the probe sequence cycles through all bit positions.
    (u64::from_le_bytes(h1), u64::from_le_bytes(h2) | 1)
}

/// Thread-safe set of session salts observed by the server.
///
/// Shared across every inbound context (TCP and UDP) of a server; all
/// operations take an internal lock and may be called concurrently.
pub struct SaltFilter {
    inner: Mutex<ScalableBloom>,
}

impl SaltFilter {
    /// Filter sized for the default deployment (one million salts at a
    /// one-in-a-million initial false-positive rate).
    #[must_use]
    pub fn new() -> Self {
        Self::with_parameters(DEFAULT_CAPACITY, DEFAULT_ERROR_RATE)
    }

    /// Filter with explicit first-slice sizing.
    #[must_use]
    pub fn with_parameters(capacity: usize, error_rate: f64) -> Self {
        Self {
            inner: Mutex::new(ScalableBloom::with_parameters(
                capacity.max(1),
                error_rate.clamp(f64::EPSILON, 0.5),
            )),
        }
    }

    /// Has this salt been observed before?
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Internal`] if the filter lock is poisoned.
    pub fn contains(&self, salt: &[u8]) -> Result<bool, CryptoError> {
        let (h1, h2) = index_hashes(salt);
        let inner = self
            .inner
            .lock()
            .map_err(|_| CryptoError::Internal("salt filter lock poisoned"))?;
        Ok(inner.contains(h1, h2))
    }

    /// Record a salt as observed.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Internal`] if the filter lock is poisoned.
    pub fn insert(&self, salt: &[u8]) -> Result<(), CryptoError> {
        let (h1, h2) = index_hashes(salt);
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| CryptoError::Internal("salt filter lock poisoned"))?;
        inner.insert(h1, h2);
        Ok(())
    }

    /// Number of salts recorded since construction.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Internal`] if the filter lock is poisoned.
    pub fn observed(&self) -> Result<usize, CryptoError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| CryptoError::Internal("salt filter lock poisoned"))?;
        Ok(inner.observed)
    }
}

impl Default for SaltFilter {
    fn default() -> Self {
        Self::new()
    }
}
