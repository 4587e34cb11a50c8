//! Key → position derivation.
//!
//! An [`IndexDeriver`] turns a key into `k` positions in `[0, size)`:
//!
//! ```text
//! position_i = hash_salted(key, i) & (size - 1)      for i in 0..k
//! ```
//!
//! `size` is a power of two, so the mask is an exact modulo. Each call salts
//! the preimage with its own index, giving `k` independent-looking values
//! instead of `k` copies of one hash.

use super::hasher::{BloomHasher, XxHasher};
use crate::error::{HyperBloomError, Result};

/// Largest accepted number of hash functions.
pub const MAX_HASHES: usize = 256;

/// Derives `k` storage positions from a key.
#[derive(Debug, Clone)]
pub struct IndexDeriver<H = XxHasher> {
    hasher: H,
    num_hashes: usize,
    mask: u64,
}

impl IndexDeriver<XxHasher> {
    /// Create a deriver with the default XXH3 hasher.
    ///
    /// # Errors
    ///
    /// `InvalidFilterSize` if `size` is not a power of two, `InvalidHashCount`
    /// if `num_hashes` is outside `[1, MAX_HASHES]`.
    pub fn new(size: usize, num_hashes: usize) -> Result<Self> {
        Self::with_hasher(size, num_hashes, XxHasher::new())
    }
}

impl<H: BloomHasher> IndexDeriver<H> {
    /// Create a deriver around a specific hasher.
    ///
    /// # Errors
    ///
    /// Same as [`IndexDeriver::new`].
    pub fn with_hasher(size: usize, num_hashes: usize, hasher: H) -> Result<Self> {
        if size == 0 || !size.is_power_of_two() {
            return Err(HyperBloomError::invalid_filter_size(size));
        }
        if num_hashes == 0 || num_hashes > MAX_HASHES {
            return Err(HyperBloomError::invalid_hash_count(num_hashes, 1, MAX_HASHES));
        }

        Ok(Self {
            hasher,
            num_hashes,
            mask: size as u64 - 1,
        })
    }

    /// Number of positions produced per key.
    #[inline]
    #[must_use]
    pub fn num_hashes(&self) -> usize {
        self.num_hashes
    }

    /// Size of the position space.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        (self.mask + 1) as usize
    }

    /// The underlying hasher.
    #[must_use]
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// The `i`-th position for `key`.
    #[inline]
    #[must_use]
    pub fn position(&self, key: &[u8], i: usize) -> usize {
        (self.hasher.hash_salted(key, i as u64) & self.mask) as usize
    }

    /// Lazily yield the `k` positions for `key`.
    ///
    /// Lookups stop pulling from the iterator at the first unset position, so
    /// the remaining hashes are never computed.
    #[inline]
    pub fn positions<'a>(&'a self, key: &'a [u8]) -> Positions<'a, H> {
        Positions {
            deriver: self,
            key,
            next: 0,
        }
    }

    /// Collect all `k` positions for `key`.
    #[must_use]
    pub fn derive(&self, key: &[u8]) -> Vec<usize> {
        self.positions(key).collect()
    }
}

/// Iterator over the positions of one key. See [`IndexDeriver::positions`].
#[derive(Debug)]
pub struct Positions<'a, H> {
    deriver: &'a IndexDeriver<H>,
    key: &'a [u8],
    next: usize,
}

impl<H: BloomHasher> Iterator for Positions<'_, H> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.next >= self.deriver.num_hashes {
            return None;
        }
        let position = self.deriver.position(self.key, self.next);
        self.next += 1;
        Some(position)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.deriver.num_hashes - self.next;
        (remaining, Some(remaining))
    }
}

impl<H: BloomHasher> ExactSizeIterator for Positions<'_, H> {}
