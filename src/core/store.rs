//! Storage contract shared by the packed-bit and byte-flag stores.
//!
//! A [`BitStore`] is a fixed-length array of presence flags. Flags start
//! cleared and, once set, are never cleared again. Both implementations use
//! atomics internally so that `get`/`set` take `&self`; the filter engine
//! decides whether a lock is held around each call.

use crate::error::Result;
use std::fmt;
use std::io;

/// Physical encoding of a store. Also written into persisted streams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StorageKind {
    /// 64 positions packed into each `u64` word.
    #[default]
    PackedBits,
    /// One byte per position (8× the memory, no bit masking).
    ByteFlags,
}

impl StorageKind {
    /// Stable on-disk identifier.
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::PackedBits => 0,
            Self::ByteFlags => 1,
        }
    }

    /// Inverse of [`StorageKind::id`].
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::PackedBits),
            1 => Some(Self::ByteFlags),
            _ => None,
        }
    }

    /// Short lowercase name, as accepted by the CLI.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PackedBits => "packed",
            Self::ByteFlags => "bytes",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "packed" | "bits" | "packed_bits" => Ok(Self::PackedBits),
            "bytes" | "byte" | "byte_flags" => Ok(Self::ByteFlags),
            other => Err(format!(
                "unknown storage '{}', expected 'packed' or 'bytes'",
                other
            )),
        }
    }
}

/// Bit-addressable, insert-only storage.
///
/// # Contract
///
/// - `get(i)` / `set(i)` return `IndexOutOfBounds` when `i >= len()`.
/// - `set` is idempotent.
/// - The payload encoding (`write_payload` / `for_each_set`) is
///   position-ordered and exactly `payload_len(len())` bytes long.
pub trait BitStore: Send + Sync + Sized {
    /// Encoding tag for this implementation.
    const KIND: StorageKind;

    /// Allocate a zeroed store with `len` positions.
    ///
    /// # Errors
    ///
    /// `InvalidFilterSize` if `len == 0`.
    fn with_len(len: usize) -> Result<Self>;

    /// Number of addressable positions.
    fn len(&self) -> usize;

    /// Always false for a constructed store.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read one position.
    ///
    /// # Errors
    ///
    /// `IndexOutOfBounds` if `index >= len()`.
    fn get(&self, index: usize) -> Result<bool>;

    /// Mark one position present.
    ///
    /// # Errors
    ///
    /// `IndexOutOfBounds` if `index >= len()`.
    fn set(&self, index: usize) -> Result<()>;

    /// Number of positions currently set.
    fn count_ones(&self) -> usize;

    /// Bytes of heap memory held by the store.
    fn memory_usage(&self) -> usize;

    /// Payload size in bytes for a store of `len` positions.
    fn payload_len(len: usize) -> usize;

    /// Write the payload in position order.
    ///
    /// # Errors
    ///
    /// Propagates writer failures.
    fn write_payload(&self, writer: &mut dyn io::Write) -> io::Result<()>;

    /// Call `visit` with every position flagged in `payload`, in order.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first error from `visit`.
    fn for_each_set<F>(payload: &[u8], visit: F) -> Result<()>
    where
        F: FnMut(usize) -> Result<()>;
}
