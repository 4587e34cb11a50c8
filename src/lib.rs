//! HyperBloom: concurrent Bloom filters with interchangeable storage and locking.
//!
//! A Bloom filter is a space-efficient probabilistic set. It can produce:
//! - **False positives**: may report a key as present when it was never inserted
//! - **Zero false negatives**: a key that was inserted is always reported present
//!
//! # Quick Start
//!
//! ```
//! use hyperbloom::StripedBloomFilter;
//!
//! // 2^20 positions, 4 hash functions, 64 independently locked shards
//! let filter = StripedBloomFilter::new(1_048_576, 4, 64)?;
//!
//! filter.insert("b99afb65c9f97b2e0feea844eea55f69")?;
//!
//! assert!(filter.lookup("b99afb65c9f97b2e0feea844eea55f69")?);
//! assert!(!filter.lookup("lavacakes")?);
//! # Ok::<(), hyperbloom::HyperBloomError>(())
//! ```
//!
//! # Choosing a Variant
//!
//! Every variant shares one engine, [`Filter`], and differs only in how
//! positions are stored and how access is serialized:
//!
//! | Filter                     | Storage      | Locking                     | Memory per position |
//! |----------------------------|--------------|-----------------------------|---------------------|
//! | [`BloomFilter`]            | packed bits  | one reader/writer lock      | 1 bit               |
//! | [`ByteBloomFilter`]        | byte flags   | one reader/writer lock      | 1 byte              |
//! | [`StripedBloomFilter`]     | packed bits  | one mutex per shard         | 1 bit               |
//! | [`StripedByteBloomFilter`] | byte flags   | one mutex per shard         | 1 byte              |
//!
//! All methods take `&self`; share a filter across threads with `Arc`.
//!
//! # Unlocked Access
//!
//! `insert_unlocked` / `lookup_unlocked` skip locking entirely. They are for
//! phases where the caller already guarantees exclusivity, e.g. a
//! single-threaded warm-up before the filter is published to readers.
//!
//! # Persistence
//!
//! ```
//! use hyperbloom::BloomFilter;
//!
//! let filter = BloomFilter::new(1 << 16, 4)?;
//! filter.insert("persisted")?;
//!
//! let mut buf = Vec::new();
//! filter.save(&mut buf)?;
//!
//! let restored = BloomFilter::new(1 << 16, 4)?;
//! restored.load(buf.as_slice())?;
//! assert!(restored.lookup("persisted")?);
//! # Ok::<(), hyperbloom::HyperBloomError>(())
//! ```
//!
//! # Features
//!
//! - `serde` - `Serialize`/`Deserialize` for [`builder::FilterConfig`] and [`StorageKind`]
//! - `rayon` - `Filter::par_insert_batch`
//! - `metrics` - per-shard lock acquisition and contention counters
//! - `cli` (default) - the `hyperbloom` command line tool

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Filter configuration and builders
pub mod builder;
/// Storage and the filter engine
pub mod core;
/// Error types and result aliases
pub mod error;
/// Hash functions and position derivation
pub mod hash;
/// Binary save/load format
pub mod persist;
/// Locking disciplines
pub mod sync;

pub use crate::core::{
    BitStore, BloomFilter, ByteBloomFilter, ByteFlags, Filter, PackedBits, SharedFilter,
    StorageKind, StripedBloomFilter, StripedByteBloomFilter,
};
pub use builder::{FilterBuilder, FilterConfig};
pub use error::{HyperBloomError, Result};
pub use hash::{BloomHasher, XxHasher};
pub use sync::{CentralLock, LockStrategy, StripedLocks};

/// Prelude module for convenient imports.
///
/// # Examples
///
/// ```
/// use hyperbloom::prelude::*;
///
/// let filter: Box<dyn SharedFilter> = FilterBuilder::new()
///     .size(4096)
///     .num_hashes(3)
///     .build_shared()?;
/// filter.insert(b"hello")?;
/// assert!(filter.lookup(b"hello")?);
/// # Ok::<(), HyperBloomError>(())
/// ```
pub mod prelude {
    pub use crate::builder::{FilterBuilder, FilterConfig};
    pub use crate::core::{
        BloomFilter, ByteBloomFilter, Filter, SharedFilter, StorageKind, StripedBloomFilter,
        StripedByteBloomFilter,
    };
    pub use crate::error::{HyperBloomError, Result};
    pub use crate::hash::BloomHasher;
}
