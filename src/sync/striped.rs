//! Striped locking over contiguous position ranges.
//!
//! # Striping Strategy
//!
//! The position space `[0, size)` is cut into `shard_count` equal ranges:
//!
//! ```text
//! shard_len = size / shard_count
//! shard     = position / shard_len
//! ```
//!
//! Each shard owns one exclusive lock used for both reads and writes. Two
//! operations contend only when they touch the same shard; operations on
//! different shards run fully in parallel.
//!
//! ## Constraints
//!
//! - `shard_count` is a non-zero power of two
//! - `shard_count <= size / 64`, so every shard spans whole 64-bit words and
//!   no word is shared between two locks
//! - `size % shard_count == 0`
//!
//! ## False Sharing
//!
//! Each lock is padded to its own cache line. Without the padding, threads
//! hammering neighbouring shards would still bounce the same line between
//! cores.
//!
//! # Examples
//!
//! ```
//! use hyperbloom::sync::{LockStrategy, StripedLocks};
//!
//! let locks = StripedLocks::new(1 << 20, 64)?;
//! assert_eq!(locks.shard_count(), 64);
//! assert_eq!(locks.shard_len(), 16_384);
//! assert_eq!(locks.shard_of(16_384)?, 1);
//! # Ok::<(), hyperbloom::HyperBloomError>(())
//! ```

use super::lock::LockStrategy;
use crate::error::{HyperBloomError, Result};
use parking_lot::Mutex;

#[cfg(feature = "metrics")]
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Positions per storage word; a shard must span at least one whole word.
const MIN_SHARD_LEN: usize = 64;

/// Cache-line aligned mutex so neighbouring shards never share a line.
#[repr(align(64))]
#[derive(Default)]
struct PaddedMutex {
    lock: Mutex<()>,

    /// Total lock acquisitions (requires `metrics` feature).
    #[cfg(feature = "metrics")]
    acquisitions: AtomicU64,

    /// Nanoseconds spent waiting for the lock (requires `metrics` feature).
    #[cfg(feature = "metrics")]
    contention_ns: AtomicU64,
}

impl PaddedMutex {
    #[inline]
    fn run<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce() -> Result<R>,
    {
        #[cfg(feature = "metrics")]
        let start = std::time::Instant::now();

        let _guard = self.lock.lock();

        #[cfg(feature = "metrics")]
        {
            self.acquisitions.fetch_add(1, AtomicOrdering::Relaxed);
            self.contention_ns
                .fetch_add(start.elapsed().as_nanos() as u64, AtomicOrdering::Relaxed);
        }

        f()
    }
}

/// Per-shard lock statistics (requires `metrics` feature).
#[cfg(feature = "metrics")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardStats {
    /// Shard index in `[0, shard_count)`.
    pub shard_idx: usize,
    /// Total lock acquisitions, reads and writes combined.
    pub acquisitions: u64,
    /// Total nanoseconds spent waiting for this shard's lock.
    pub contention_ns: u64,
}

/// Fixed array of shard locks, one per contiguous position range.
///
/// The array is sized at construction and never resized.
pub struct StripedLocks {
    shards: Box<[PaddedMutex]>,
    shard_len: usize,
    size: usize,
}

impl StripedLocks {
    /// Create `shard_count` locks partitioning `[0, size)`.
    ///
    /// # Errors
    ///
    /// - `InvalidFilterSize` if `size` is below 64 or not a power of two
    /// - `InvalidShardCount` if `shard_count` is zero, not a power of two,
    ///   larger than `size / 64`, or does not divide `size`
    pub fn new(size: usize, shard_count: usize) -> Result<Self> {
        if size < MIN_SHARD_LEN || !size.is_power_of_two() {
            return Err(HyperBloomError::invalid_filter_size(size));
        }
        if shard_count == 0 {
            return Err(HyperBloomError::invalid_shard_count(
                shard_count,
                size,
                "must be nonzero",
            ));
        }
        if !shard_count.is_power_of_two() {
            return Err(HyperBloomError::invalid_shard_count(
                shard_count,
                size,
                "must be a power of two",
            ));
        }
        if shard_count > size / MIN_SHARD_LEN {
            return Err(HyperBloomError::invalid_shard_count(
                shard_count,
                size,
                "cannot exceed size/64",
            ));
        }
        if size % shard_count != 0 {
            return Err(HyperBloomError::invalid_shard_count(
                shard_count,
                size,
                "size must be a multiple of the shard count",
            ));
        }

        let shards = (0..shard_count)
            .map(|_| PaddedMutex::default())
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Ok(Self {
            shards,
            shard_len: size / shard_count,
            size,
        })
    }

    /// Positions covered by each shard.
    #[inline]
    #[must_use]
    pub fn shard_len(&self) -> usize {
        self.shard_len
    }

    /// Shard owning `position`.
    ///
    /// # Errors
    ///
    /// `IndexOutOfBounds` if `position >= size`.
    #[inline]
    pub fn shard_of(&self, position: usize) -> Result<usize> {
        if position >= self.size {
            return Err(HyperBloomError::index_out_of_bounds(position, self.size));
        }
        Ok(position / self.shard_len)
    }

    /// Snapshot of per-shard statistics (requires `metrics` feature).
    #[cfg(feature = "metrics")]
    #[must_use]
    pub fn shard_stats(&self) -> Vec<ShardStats> {
        self.shards
            .iter()
            .enumerate()
            .map(|(idx, shard)| ShardStats {
                shard_idx: idx,
                acquisitions: shard.acquisitions.load(AtomicOrdering::Relaxed),
                contention_ns: shard.contention_ns.load(AtomicOrdering::Relaxed),
            })
            .collect()
    }

    /// Indices of the `top_n` shards with the most contention time.
    #[cfg(feature = "metrics")]
    #[must_use]
    pub fn most_contended_shards(&self, top_n: usize) -> Vec<usize> {
        let mut stats = self.shard_stats();
        stats.sort_by_key(|s| std::cmp::Reverse(s.contention_ns));
        stats.into_iter().take(top_n).map(|s| s.shard_idx).collect()
    }
}

impl LockStrategy for StripedLocks {
    #[inline]
    fn shard_count(&self) -> usize {
        self.shards.len()
    }

    // Reads take the shard's exclusive lock too.
    #[inline]
    fn with_read<R, F>(&self, position: usize, f: F) -> Result<R>
    where
        F: FnOnce() -> Result<R>,
    {
        let shard = self.shard_of(position)?;
        self.shards[shard].run(f)
    }

    #[inline]
    fn with_write<R, F>(&self, position: usize, f: F) -> Result<R>
    where
        F: FnOnce() -> Result<R>,
    {
        let shard = self.shard_of(position)?;
        self.shards[shard].run(f)
    }

    fn name(&self) -> &'static str {
        "striped"
    }
}

impl std::fmt::Debug for StripedLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripedLocks")
            .field("shards", &self.shards.len())
            .field("shard_len", &self.shard_len)
            .finish()
    }
}
