//! Locking disciplines for concurrent filter access.
//!
//! # Module Organization
//!
//! - [`LockStrategy`] - the critical-section contract used by the engine
//! - [`CentralLock`] - one filter-wide reader/writer lock
//! - [`StripedLocks`] - one exclusive lock per contiguous shard
//!
//! # Choosing a Discipline
//!
//! ## Central (reader/writer)
//!
//! Best for read-dominated workloads with few writers: lookups never block
//! each other, but every insert briefly stops the whole filter.
//!
//! ## Striped
//!
//! Best for mixed or write-heavy workloads: contention is limited to threads
//! whose positions land in the same shard. Reads inside a shard still
//! serialize with writes to that shard.
//!
//! ## Unlocked (`*_unlocked`)
//!
//! No lock at all. Only valid while the caller guarantees exclusivity, e.g.
//! a single-threaded warm-up phase before concurrent lookups start.
//!
//! # Safety
//!
//! All store access goes through atomics, so even the unlocked path is free
//! of data races in the Rust sense; the locks add the ordering guarantees
//! described on each strategy.

mod lock;
mod striped;

pub use lock::{CentralLock, LockStrategy};
pub use striped::StripedLocks;

#[cfg(feature = "metrics")]
pub use striped::ShardStats;
