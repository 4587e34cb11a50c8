//! Storage and the filter engine.
//!
//! # Module Organization
//!
//! ```text
//! core/
//! ├── store.rs    - BitStore contract and StorageKind
//! ├── bitvec.rs   - PackedBits (64 positions per word)
//! ├── bytevec.rs  - ByteFlags (one byte per position)
//! ├── filter.rs   - Filter engine and the four variant aliases
//! └── traits.rs   - SharedFilter, the object-safe interface
//! ```
//!
//! Storage knows nothing about locking and the lock strategies know nothing
//! about storage; [`Filter`] is the only place where they meet.

mod bitvec;
mod bytevec;
mod filter;
mod store;
mod traits;

pub use bitvec::PackedBits;
pub use bytevec::ByteFlags;
pub use filter::{
    BloomFilter, ByteBloomFilter, Filter, StripedBloomFilter, StripedByteBloomFilter, MIN_SIZE,
};
pub use store::{BitStore, StorageKind};
pub use traits::SharedFilter;
