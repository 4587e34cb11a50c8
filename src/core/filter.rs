//! The filter engine.
//!
//! [`Filter`] composes three independent pieces:
//!
//! ```text
//! Filter<S, L, H>
//! ├─ store:   S: BitStore        ← PackedBits or ByteFlags
//! ├─ locks:   L: LockStrategy    ← CentralLock or StripedLocks
//! └─ deriver: IndexDeriver<H>    ← key → k positions
//! ```
//!
//! The four classic variants are type aliases over one implementation:
//!
//! | Alias                      | Storage       | Locking  |
//! |----------------------------|---------------|----------|
//! | [`BloomFilter`]            | packed bits   | central  |
//! | [`ByteBloomFilter`]        | byte flags    | central  |
//! | [`StripedBloomFilter`]     | packed bits   | striped  |
//! | [`StripedByteBloomFilter`] | byte flags    | striped  |
//!
//! # Locking Protocol
//!
//! | Operation           | Lock scope             | Held for        |
//! |---------------------|------------------------|-----------------|
//! | `insert()`          | write, per position    | one `set`       |
//! | `lookup()`          | read, per position     | one `get`       |
//! | `insert_unlocked()` | none                   | -               |
//! | `lookup_unlocked()` | none                   | -               |
//!
//! Because locks are released between positions, a lookup racing an insert
//! of the same key may see some of its positions and return `false`. It can
//! never turn a `false` into a `true`, so keys whose insert completed before
//! the lookup started are always found.
//!
//! # Examples
//!
//! ```
//! use hyperbloom::StripedBloomFilter;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let filter = Arc::new(StripedBloomFilter::new(1 << 20, 4, 64)?);
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|t| {
//!         let filter = Arc::clone(&filter);
//!         thread::spawn(move || {
//!             for i in 0..100 {
//!                 filter.insert(&format!("key-{}-{}", t, i)).unwrap();
//!             }
//!         })
//!     })
//!     .collect();
//! for h in handles {
//!     h.join().unwrap();
//! }
//!
//! assert!(filter.lookup("key-3-99")?);
//! # Ok::<(), hyperbloom::HyperBloomError>(())
//! ```

use super::bitvec::PackedBits;
use super::bytevec::ByteFlags;
use super::store::{BitStore, StorageKind};
use crate::error::{HyperBloomError, Result};
use crate::hash::{BloomHasher, IndexDeriver, XxHasher};
use crate::persist;
use crate::sync::{CentralLock, LockStrategy, StripedLocks};
use log::debug;
use std::fmt;
use std::io::{Read, Write};
use std::path::Path;

/// Smallest accepted filter size, one storage word.
pub const MIN_SIZE: usize = 64;

/// Packed bits, one filter-wide reader/writer lock.
pub type BloomFilter<H = XxHasher> = Filter<PackedBits, CentralLock, H>;

/// One byte per position, one filter-wide reader/writer lock.
pub type ByteBloomFilter<H = XxHasher> = Filter<ByteFlags, CentralLock, H>;

/// Packed bits, one exclusive lock per shard.
pub type StripedBloomFilter<H = XxHasher> = Filter<PackedBits, StripedLocks, H>;

/// One byte per position, one exclusive lock per shard.
pub type StripedByteBloomFilter<H = XxHasher> = Filter<ByteFlags, StripedLocks, H>;

/// Bloom filter generic over storage, locking and hashing.
///
/// Construct through the variant aliases; see the [module docs](self).
pub struct Filter<S, L, H = XxHasher> {
    store: S,
    locks: L,
    deriver: IndexDeriver<H>,
}

fn validate_size(size: usize) -> Result<()> {
    if size < MIN_SIZE || !size.is_power_of_two() {
        return Err(HyperBloomError::invalid_filter_size(size));
    }
    Ok(())
}

impl<S: BitStore> Filter<S, CentralLock, XxHasher> {
    /// Create a centrally locked filter with `size` positions and `num_hashes`
    /// hash functions.
    ///
    /// # Errors
    ///
    /// - `InvalidFilterSize` if `size < 64` or `size` is not a power of two
    /// - `InvalidHashCount` if `num_hashes` is 0 or above [`MAX_HASHES`](crate::hash::MAX_HASHES)
    ///
    /// # Examples
    ///
    /// ```
    /// use hyperbloom::{BloomFilter, ByteBloomFilter};
    ///
    /// assert!(BloomFilter::new(1024, 3).is_ok());
    /// assert!(ByteBloomFilter::new(1000, 3).is_err()); // not a power of two
    /// assert!(BloomFilter::new(32, 3).is_err());       // below 64
    /// ```
    pub fn new(size: usize, num_hashes: usize) -> Result<Self> {
        Self::with_hasher(size, num_hashes, XxHasher::new())
    }
}

impl<S: BitStore, H: BloomHasher> Filter<S, CentralLock, H> {
    /// Like [`Filter::new`], with an explicit hasher.
    ///
    /// # Errors
    ///
    /// Same as [`Filter::new`].
    pub fn with_hasher(size: usize, num_hashes: usize, hasher: H) -> Result<Self> {
        validate_size(size)?;
        Self::from_parts(CentralLock::new(), size, num_hashes, hasher)
    }
}

impl<S: BitStore> Filter<S, StripedLocks, XxHasher> {
    /// Create a striped filter whose `size` positions are split into `shards`
    /// equally sized, independently locked ranges.
    ///
    /// # Errors
    ///
    /// - `InvalidFilterSize` if `size < 64` or `size` is not a power of two
    /// - `InvalidShardCount` if `shards` is zero, not a power of two,
    ///   exceeds `size / 64` or does not divide `size`
    /// - `InvalidHashCount` if `num_hashes` is out of range
    ///
    /// # Examples
    ///
    /// ```
    /// use hyperbloom::StripedBloomFilter;
    ///
    /// assert!(StripedBloomFilter::new(1_048_576, 4, 64).is_ok());
    /// assert!(StripedBloomFilter::new(1_048_576, 4, 10).is_err());
    /// assert!(StripedBloomFilter::new(100_000, 4, 10).is_err());
    /// ```
    pub fn new(size: usize, num_hashes: usize, shards: usize) -> Result<Self> {
        Self::with_hasher(size, num_hashes, shards, XxHasher::new())
    }
}

impl<S: BitStore, H: BloomHasher> Filter<S, StripedLocks, H> {
    /// Like the striped `new`, with an explicit hasher.
    ///
    /// # Errors
    ///
    /// Same as the striped `new`.
    pub fn with_hasher(size: usize, num_hashes: usize, shards: usize, hasher: H) -> Result<Self> {
        validate_size(size)?;
        let locks = StripedLocks::new(size, shards)?;
        Self::from_parts(locks, size, num_hashes, hasher)
    }
}

impl<S: BitStore, L: LockStrategy, H: BloomHasher> Filter<S, L, H> {
    fn from_parts(locks: L, size: usize, num_hashes: usize, hasher: H) -> Result<Self> {
        let deriver = IndexDeriver::with_hasher(size, num_hashes, hasher)?;
        let store = S::with_len(size)?;

        debug!(
            "created {} filter: size={} k={} shards={} storage={} hasher={}",
            locks.name(),
            size,
            num_hashes,
            locks.shard_count(),
            S::KIND,
            deriver.hasher().name()
        );

        Ok(Self {
            store,
            locks,
            deriver,
        })
    }

    /// Insert a key, taking a write lock around each position.
    ///
    /// Idempotent.
    ///
    /// # Errors
    ///
    /// `IndexOutOfBounds` only if derivation produced a position outside the
    /// filter, which indicates a bug.
    pub fn insert<K: AsRef<[u8]> + ?Sized>(&self, key: &K) -> Result<()> {
        for position in self.deriver.positions(key.as_ref()) {
            self.set_position(position)?;
        }
        Ok(())
    }

    /// Test a key, taking a read lock around each position.
    ///
    /// Returns `false` as soon as one position is unset. `true` means the key
    /// was possibly inserted.
    ///
    /// # Errors
    ///
    /// Same as [`Filter::insert`]. Errors are never reported as `false`.
    pub fn lookup<K: AsRef<[u8]> + ?Sized>(&self, key: &K) -> Result<bool> {
        for position in self.deriver.positions(key.as_ref()) {
            if !self.get_position(position)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Insert without taking any lock.
    ///
    /// The caller must guarantee that no other thread inserts or loads into
    /// this filter for the duration of the call.
    ///
    /// # Errors
    ///
    /// Same as [`Filter::insert`].
    #[doc(alias = "insert_async")]
    pub fn insert_unlocked<K: AsRef<[u8]> + ?Sized>(&self, key: &K) -> Result<()> {
        for position in self.deriver.positions(key.as_ref()) {
            self.store.set(position)?;
        }
        Ok(())
    }

    /// Lookup without taking any lock.
    ///
    /// The caller must guarantee that no writer runs concurrently, e.g. all
    /// inserts finished before concurrent lookups began.
    ///
    /// # Errors
    ///
    /// Same as [`Filter::lookup`].
    #[doc(alias = "lookup_async")]
    pub fn lookup_unlocked<K: AsRef<[u8]> + ?Sized>(&self, key: &K) -> Result<bool> {
        for position in self.deriver.positions(key.as_ref()) {
            if !self.store.get(position)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Insert every key, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Same as [`Filter::insert`].
    pub fn insert_batch<I>(&self, keys: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        for key in keys {
            self.insert(key.as_ref())?;
        }
        Ok(())
    }

    /// Look up every key, in order.
    ///
    /// # Errors
    ///
    /// Same as [`Filter::lookup`].
    pub fn lookup_batch<I>(&self, keys: I) -> Result<Vec<bool>>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        keys.into_iter().map(|key| self.lookup(key.as_ref())).collect()
    }

    /// Insert keys from the rayon thread pool (requires `rayon` feature).
    ///
    /// # Errors
    ///
    /// Same as [`Filter::insert`].
    #[cfg(feature = "rayon")]
    pub fn par_insert_batch<K>(&self, keys: &[K]) -> Result<()>
    where
        K: AsRef<[u8]> + Sync,
    {
        use rayon::prelude::*;

        keys.par_iter().try_for_each(|key| self.insert(key.as_ref()))
    }

    /// Set a single position under the write lock.
    ///
    /// Low-level access used by persistence; `insert` is built on it.
    ///
    /// # Errors
    ///
    /// `IndexOutOfBounds` if `position >= size()`.
    #[inline]
    pub fn set_position(&self, position: usize) -> Result<()> {
        self.locks.with_write(position, || self.store.set(position))
    }

    /// Read a single position under the read lock.
    ///
    /// # Errors
    ///
    /// `IndexOutOfBounds` if `position >= size()`.
    #[inline]
    pub fn get_position(&self, position: usize) -> Result<bool> {
        self.locks.with_read(position, || self.store.get(position))
    }

    /// Positions `key` maps to.
    #[must_use]
    pub fn positions_of<K: AsRef<[u8]> + ?Sized>(&self, key: &K) -> Vec<usize> {
        self.deriver.derive(key.as_ref())
    }

    /// Write the filter state to `writer`.
    ///
    /// # Errors
    ///
    /// `Io` if the writer fails.
    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        persist::save(self, writer)
    }

    /// OR-merge a stream produced by [`Filter::save`] into this filter.
    ///
    /// # Errors
    ///
    /// See [`persist::load`].
    pub fn load<R: Read>(&self, reader: R) -> Result<()> {
        persist::load(self, reader)
    }

    /// Save to a file, replacing it.
    ///
    /// # Errors
    ///
    /// `Io` on any file system failure.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persist::save_to_path(self, path)
    }

    /// OR-merge a file written by [`Filter::save_to_path`].
    ///
    /// # Errors
    ///
    /// See [`persist::load`].
    pub fn load_from_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persist::load_from_path(self, path)
    }

    /// Number of positions.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.store.len()
    }

    /// Number of hash functions (k).
    #[inline]
    #[must_use]
    pub fn num_hashes(&self) -> usize {
        self.deriver.num_hashes()
    }

    /// Number of locks (1 for central locking).
    #[inline]
    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.locks.shard_count()
    }

    /// Storage encoding.
    #[must_use]
    pub fn storage_kind(&self) -> StorageKind {
        S::KIND
    }

    /// The backing store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The lock set.
    #[must_use]
    pub fn locks(&self) -> &L {
        &self.locks
    }

    /// The hasher feeding position derivation.
    #[must_use]
    pub fn hasher(&self) -> &H {
        self.deriver.hasher()
    }

    /// Number of positions currently set.
    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.store.count_ones()
    }

    /// Fraction of positions set, in `[0.0, 1.0]`.
    #[must_use]
    pub fn load_factor(&self) -> f64 {
        self.count_ones() as f64 / self.size() as f64
    }

    /// Estimated number of distinct keys inserted.
    ///
    /// Inverts the fill ratio: `n ≈ -(m/k) · ln(1 - X/m)`.
    #[must_use]
    pub fn estimate_count(&self) -> usize {
        let ones = self.count_ones() as f64;
        if ones == 0.0 {
            return 0;
        }
        let m = self.size() as f64;
        let k = self.num_hashes() as f64;
        let fill = ones / m;
        if fill >= 1.0 {
            return self.size();
        }
        ((-m / k) * (1.0 - fill).ln()).round() as usize
    }

    /// Estimated current false positive rate, `fill^k`.
    #[must_use]
    pub fn estimated_fpr(&self) -> f64 {
        self.load_factor().powi(self.num_hashes() as i32)
    }

    /// Approximate heap plus inline memory in bytes.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.store.memory_usage() + self.shard_count() * 64 + std::mem::size_of::<Self>()
    }
}

impl<S, L, H> fmt::Debug for Filter<S, L, H>
where
    S: BitStore,
    L: LockStrategy,
    H: BloomHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("size", &self.size())
            .field("num_hashes", &self.num_hashes())
            .field("locking", &self.locks.name())
            .field("shards", &self.shard_count())
            .field("storage", &S::KIND)
            .field("hasher", &self.hasher().name())
            .field("load_factor", &self.load_factor())
            .finish()
    }
}

impl<S, L, H> fmt::Display for Filter<S, L, H>
where
    S: BitStore,
    L: LockStrategy,
    H: BloomHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Filter({} {}, {} shards, {} positions, k={}, load={:.1}%, FPR={:.4}%)",
            self.locks.name(),
            S::KIND,
            self.shard_count(),
            self.size(),
            self.num_hashes(),
            self.load_factor() * 100.0,
            self.estimated_fpr() * 100.0
        )
    }
}
