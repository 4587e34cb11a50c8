//! Object-safe filter interface.
//!
//! [`Filter`] is generic over storage, locking and hashing, which makes it
//! awkward to pick a variant at runtime. [`SharedFilter`] erases those
//! parameters so a `Box<dyn SharedFilter>` can stand for any of them.

use super::filter::Filter;
use super::store::{BitStore, StorageKind};
use crate::error::Result;
use crate::hash::BloomHasher;
use crate::sync::LockStrategy;
use std::fmt;
use std::io::{Read, Write};

/// Any filter variant behind a trait object.
///
/// # Examples
///
/// ```
/// use hyperbloom::{BloomFilter, SharedFilter, StripedByteBloomFilter};
///
/// let filters: Vec<Box<dyn SharedFilter>> = vec![
///     Box::new(BloomFilter::new(1024, 3)?),
///     Box::new(StripedByteBloomFilter::new(1024, 3, 4)?),
/// ];
/// for f in &filters {
///     f.insert(b"shared")?;
///     assert!(f.lookup(b"shared")?);
/// }
/// # Ok::<(), hyperbloom::HyperBloomError>(())
/// ```
pub trait SharedFilter: Send + Sync + fmt::Debug + fmt::Display {
    /// See [`Filter::insert`].
    ///
    /// # Errors
    ///
    /// `IndexOutOfBounds` on an internal derivation bug.
    fn insert(&self, key: &[u8]) -> Result<()>;

    /// See [`Filter::lookup`].
    ///
    /// # Errors
    ///
    /// `IndexOutOfBounds` on an internal derivation bug.
    fn lookup(&self, key: &[u8]) -> Result<bool>;

    /// See [`Filter::insert_unlocked`].
    ///
    /// # Errors
    ///
    /// `IndexOutOfBounds` on an internal derivation bug.
    fn insert_unlocked(&self, key: &[u8]) -> Result<()>;

    /// See [`Filter::lookup_unlocked`].
    ///
    /// # Errors
    ///
    /// `IndexOutOfBounds` on an internal derivation bug.
    fn lookup_unlocked(&self, key: &[u8]) -> Result<bool>;

    /// See [`Filter::save`].
    ///
    /// # Errors
    ///
    /// `Io` if the writer fails.
    fn save(&self, writer: &mut dyn Write) -> Result<()>;

    /// See [`Filter::load`].
    ///
    /// # Errors
    ///
    /// See [`crate::persist::load`].
    fn load(&self, reader: &mut dyn Read) -> Result<()>;

    /// Number of positions.
    fn size(&self) -> usize;

    /// Number of hash functions.
    fn num_hashes(&self) -> usize;

    /// Number of locks.
    fn shard_count(&self) -> usize;

    /// Storage encoding.
    fn storage_kind(&self) -> StorageKind;

    /// Positions currently set.
    fn count_ones(&self) -> usize;

    /// Estimated false positive rate at the current fill.
    fn estimated_fpr(&self) -> f64;
}

impl<S, L, H> SharedFilter for Filter<S, L, H>
where
    S: BitStore,
    L: LockStrategy,
    H: BloomHasher,
{
    fn insert(&self, key: &[u8]) -> Result<()> {
        Filter::insert(self, key)
    }

    fn lookup(&self, key: &[u8]) -> Result<bool> {
        Filter::lookup(self, key)
    }

    fn insert_unlocked(&self, key: &[u8]) -> Result<()> {
        Filter::insert_unlocked(self, key)
    }

    fn lookup_unlocked(&self, key: &[u8]) -> Result<bool> {
        Filter::lookup_unlocked(self, key)
    }

    fn save(&self, writer: &mut dyn Write) -> Result<()> {
        Filter::save(self, writer)
    }

    fn load(&self, reader: &mut dyn Read) -> Result<()> {
        Filter::load(self, reader)
    }

    fn size(&self) -> usize {
        Filter::size(self)
    }

    fn num_hashes(&self) -> usize {
        Filter::num_hashes(self)
    }

    fn shard_count(&self) -> usize {
        Filter::shard_count(self)
    }

    fn storage_kind(&self) -> StorageKind {
        Filter::storage_kind(self)
    }

    fn count_ones(&self) -> usize {
        Filter::count_ones(self)
    }

    fn estimated_fpr(&self) -> f64 {
        Filter::estimated_fpr(self)
    }
}
