//! Hash primitive abstraction.
//!
//! A filter never hashes on its own: it asks a [`BloomHasher`] for 64-bit
//! values and folds them into positions (see [`crate::hash::derive`]). The
//! trait is byte-oriented so callers control how keys are encoded.
//!
//! # Salted hashing
//!
//! Every one of the `k` hash calls for a key must produce a materially
//! different value. [`BloomHasher::hash_salted`] does this by appending the
//! salt to the preimage, so call `i` hashes `key ‖ i.to_le_bytes()`:
//!
//! ```
//! use hyperbloom::hash::{BloomHasher, XxHasher};
//!
//! let hasher = XxHasher::new();
//! let h0 = hasher.hash_salted(b"key", 0);
//! let h1 = hasher.hash_salted(b"key", 1);
//! assert_ne!(h0, h1);
//! ```

#![allow(clippy::module_name_repetitions)]

use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;
use xxhash_rust::xxh3::{xxh3_64_with_seed, Xxh3};

/// Base hasher trait for Bloom filter hash functions.
///
/// Implementations must be deterministic for the lifetime of any persisted
/// filter: the same bytes and salt always produce the same value.
pub trait BloomHasher: Send + Sync {
    /// Hash arbitrary bytes to a 64-bit value.
    fn hash_bytes(&self, bytes: &[u8]) -> u64;

    /// Hash `bytes ‖ salt.to_le_bytes()`.
    ///
    /// The default implementation builds the preimage in a temporary buffer.
    /// Implementations backed by a streaming hash should override it.
    fn hash_salted(&self, bytes: &[u8], salt: u64) -> u64 {
        let mut preimage = Vec::with_capacity(bytes.len() + 8);
        preimage.extend_from_slice(bytes);
        preimage.extend_from_slice(&salt.to_le_bytes());
        self.hash_bytes(&preimage)
    }

    /// Human-readable name for debugging and logs.
    fn name(&self) -> &'static str;
}

/// XXH3 hasher backed by the `xxhash-rust` crate.
///
/// This is the default hasher of every filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct XxHasher {
    seed: u64,
}

impl XxHasher {
    /// Create a hasher with seed `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self { seed: 0 }
    }

    /// Create a hasher with an explicit seed.
    ///
    /// Filters that exchange persisted state must use the same seed.
    #[must_use]
    pub const fn with_seed(seed: u64) -> Self {
        Self { seed }
    }

    /// The configured seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }
}

impl BloomHasher for XxHasher {
    #[inline]
    fn hash_bytes(&self, bytes: &[u8]) -> u64 {
        xxh3_64_with_seed(bytes, self.seed)
    }

    #[inline]
    fn hash_salted(&self, bytes: &[u8], salt: u64) -> u64 {
        let mut state = Xxh3::with_seed(self.seed);
        state.update(bytes);
        state.update(&salt.to_le_bytes());
        state.digest()
    }

    fn name(&self) -> &'static str {
        "XXH3"
    }
}

/// Hasher backed by the standard library's `DefaultHasher` (SipHash).
///
/// The seed is mixed in before the key. Output is stable within one Rust
/// release but not guaranteed across releases, which persisted filters detect
/// through the hasher fingerprint in their header.
#[derive(Debug, Clone, Copy)]
pub struct StdHasher {
    seed: u64,
}

impl StdHasher {
    /// Create a hasher with the default seed.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            seed: 0x517c_c1b7_2722_0a95,
        }
    }

    /// Create a hasher with an explicit seed.
    #[must_use]
    pub const fn with_seed(seed: u64) -> Self {
        Self { seed }
    }

    #[inline]
    fn start(&self) -> DefaultHasher {
        let mut state = DefaultHasher::new();
        state.write_u64(self.seed);
        state
    }
}

impl Default for StdHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl BloomHasher for StdHasher {
    #[inline]
    fn hash_bytes(&self, bytes: &[u8]) -> u64 {
        let mut state = self.start();
        state.write(bytes);
        state.finish()
    }

    #[inline]
    fn hash_salted(&self, bytes: &[u8], salt: u64) -> u64 {
        let mut state = self.start();
        state.write(bytes);
        state.write(&salt.to_le_bytes());
        state.finish()
    }

    fn name(&self) -> &'static str {
        "SipHash"
    }
}
