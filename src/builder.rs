//! Filter configuration and construction.
//!
//! [`FilterBuilder`] collects parameters fluently and produces either a
//! concrete [`Filter`] or a type-erased `Box<dyn SharedFilter>` chosen at
//! runtime. [`FilterConfig`] is the plain-data form of the same parameters,
//! serializable with the `serde` feature.
//!
//! Geometry is always explicit: picking `size` and `num_hashes` for a target
//! false positive rate is left to the caller.
//!
//! # Examples
//!
//! ```
//! use hyperbloom::builder::FilterBuilder;
//! use hyperbloom::StorageKind;
//!
//! let filter = FilterBuilder::new()
//!     .size(1 << 20)
//!     .num_hashes(4)
//!     .shards(16)
//!     .storage(StorageKind::ByteFlags)
//!     .build_shared()?;
//!
//! assert_eq!(filter.shard_count(), 16);
//! assert_eq!(filter.size(), 1 << 20);
//! # Ok::<(), hyperbloom::HyperBloomError>(())
//! ```

use crate::core::{
    BitStore, ByteBloomFilter, BloomFilter, Filter, SharedFilter, StorageKind,
    StripedBloomFilter, StripedByteBloomFilter,
};
use crate::error::{HyperBloomError, Result};
use crate::persist::Header;
use crate::sync::{CentralLock, StripedLocks};

/// Resolved filter geometry.
///
/// `shards: None` selects central locking, `Some(n)` striped locking with
/// `n` shards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterConfig {
    /// Number of positions.
    pub size: usize,
    /// Number of hash functions.
    pub num_hashes: usize,
    /// Shard count for striped locking.
    #[cfg_attr(feature = "serde", serde(default))]
    pub shards: Option<usize>,
    /// Storage encoding.
    #[cfg_attr(feature = "serde", serde(default))]
    pub storage: StorageKind,
}

impl FilterConfig {
    /// Centrally locked, packed configuration.
    #[must_use]
    pub fn new(size: usize, num_hashes: usize) -> Self {
        Self {
            size,
            num_hashes,
            shards: None,
            storage: StorageKind::PackedBits,
        }
    }

    /// Configuration matching a persisted stream, so the stream loads into it.
    #[must_use]
    pub fn from_header(header: &Header) -> Self {
        Self {
            size: header.size,
            num_hashes: header.num_hashes,
            shards: (header.shard_count > 1).then_some(header.shard_count),
            storage: header.storage,
        }
    }

    /// Construct the variant this configuration describes.
    ///
    /// # Errors
    ///
    /// Any validation error of the variant's constructor.
    pub fn build_shared(&self) -> Result<Box<dyn SharedFilter>> {
        let filter: Box<dyn SharedFilter> = match (self.storage, self.shards) {
            (StorageKind::PackedBits, None) => {
                Box::new(BloomFilter::new(self.size, self.num_hashes)?)
            }
            (StorageKind::ByteFlags, None) => {
                Box::new(ByteBloomFilter::new(self.size, self.num_hashes)?)
            }
            (StorageKind::PackedBits, Some(shards)) => {
                Box::new(StripedBloomFilter::new(self.size, self.num_hashes, shards)?)
            }
            (StorageKind::ByteFlags, Some(shards)) => {
                Box::new(StripedByteBloomFilter::new(self.size, self.num_hashes, shards)?)
            }
        };
        Ok(filter)
    }
}

/// Fluent builder for filters.
#[derive(Debug, Clone, Default)]
pub struct FilterBuilder {
    size: Option<usize>,
    num_hashes: Option<usize>,
    shards: Option<usize>,
    storage: StorageKind,
}

impl FilterBuilder {
    /// Empty builder: packed storage, central locking, no geometry yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of positions (power of two, at least 64).
    #[must_use]
    pub fn size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    /// Number of hash functions.
    #[must_use]
    pub fn num_hashes(mut self, num_hashes: usize) -> Self {
        self.num_hashes = Some(num_hashes);
        self
    }

    /// Use striped locking with `shards` shards.
    #[must_use]
    pub fn shards(mut self, shards: usize) -> Self {
        self.shards = Some(shards);
        self
    }

    /// Storage encoding.
    #[must_use]
    pub fn storage(mut self, storage: StorageKind) -> Self {
        self.storage = storage;
        self
    }

    /// Resolve the geometry without building anything.
    ///
    /// # Errors
    ///
    /// `InvalidParameters` if `size` or `num_hashes` was not set.
    pub fn config(&self) -> Result<FilterConfig> {
        let size = self
            .size
            .ok_or_else(|| HyperBloomError::invalid_parameters("size is required"))?;
        let num_hashes = self
            .num_hashes
            .ok_or_else(|| HyperBloomError::invalid_parameters("num_hashes is required"))?;

        Ok(FilterConfig {
            size,
            num_hashes,
            shards: self.shards,
            storage: self.storage,
        })
    }

    /// Build the variant selected at runtime.
    ///
    /// # Errors
    ///
    /// See [`FilterBuilder::config`] and the variant constructors.
    pub fn build_shared(&self) -> Result<Box<dyn SharedFilter>> {
        self.config()?.build_shared()
    }

    /// Build a centrally locked filter over storage `S`.
    ///
    /// The storage chosen with [`FilterBuilder::storage`] is ignored in favour
    /// of `S`, and a shard count is rejected.
    ///
    /// # Errors
    ///
    /// `InvalidParameters` if shards were requested, otherwise see
    /// [`FilterBuilder::config`].
    pub fn build<S: BitStore>(&self) -> Result<Filter<S, CentralLock>> {
        let config = self.config()?;
        if let Some(shards) = config.shards {
            return Err(HyperBloomError::invalid_parameters(format!(
                "{} shards requested for a centrally locked filter",
                shards
            )));
        }
        Filter::<S, CentralLock>::new(config.size, config.num_hashes)
    }

    /// Build a striped filter over storage `S` (one shard if none was set).
    ///
    /// # Errors
    ///
    /// See [`FilterBuilder::config`] and the striped constructor.
    pub fn build_striped<S: BitStore>(&self) -> Result<Filter<S, StripedLocks>> {
        let config = self.config()?;
        Filter::<S, StripedLocks>::new(config.size, config.num_hashes, config.shards.unwrap_or(1))
    }
}
