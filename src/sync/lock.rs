//! Locking strategies and the filter-wide reader/writer lock.
//!
//! A [`LockStrategy`] wraps a single-position read or write in the critical
//! section its discipline requires. Locks are taken per position, never
//! across the whole `k`-position loop of an insert or lookup.
//!
//! | Strategy          | `with_read`           | `with_write`          |
//! |-------------------|-----------------------|-----------------------|
//! | [`CentralLock`]   | shared, filter-wide   | exclusive, filter-wide |
//! | [`StripedLocks`]  | exclusive, one shard  | exclusive, one shard  |
//!
//! The unlocked path does not go through a strategy at all; see
//! [`Filter::insert_unlocked`](crate::core::Filter::insert_unlocked).
//!
//! [`StripedLocks`]: super::StripedLocks

use crate::error::Result;
use parking_lot::RwLock;

/// Critical-section policy for single-position store access.
pub trait LockStrategy: Send + Sync {
    /// Number of independent locks (1 for central locking).
    fn shard_count(&self) -> usize;

    /// Run a read of `position` under the appropriate lock.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or `IndexOutOfBounds` if the strategy
    /// cannot map `position` to a lock.
    fn with_read<R, F>(&self, position: usize, f: F) -> Result<R>
    where
        F: FnOnce() -> Result<R>;

    /// Run a write of `position` under the appropriate lock.
    ///
    /// # Errors
    ///
    /// Same as [`LockStrategy::with_read`].
    fn with_write<R, F>(&self, position: usize, f: F) -> Result<R>
    where
        F: FnOnce() -> Result<R>;

    /// Short name for logs and `Display`.
    fn name(&self) -> &'static str;
}

/// One reader/writer lock for the whole filter.
///
/// Any number of lookups proceed together; an insert excludes everything
/// else for the duration of one position write. `parking_lot::RwLock` is
/// writer-fair, so a steady stream of readers cannot starve inserts.
#[derive(Debug, Default)]
pub struct CentralLock {
    lock: RwLock<()>,
}

impl CentralLock {
    /// Create an unlocked central lock.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lock: RwLock::new(()),
        }
    }
}

impl LockStrategy for CentralLock {
    #[inline]
    fn shard_count(&self) -> usize {
        1
    }

    #[inline]
    fn with_read<R, F>(&self, _position: usize, f: F) -> Result<R>
    where
        F: FnOnce() -> Result<R>,
    {
        let _guard = self.lock.read();
        f()
    }

    #[inline]
    fn with_write<R, F>(&self, _position: usize, f: F) -> Result<R>
    where
        F: FnOnce() -> Result<R>,
    {
        let _guard = self.lock.write();
        f()
    }

    fn name(&self) -> &'static str {
        "central"
    }
}
