//! Error types for hyperbloom operations.
//!
//! Every fallible operation in the crate returns [`Result<T>`], whose error
//! type is [`HyperBloomError`]. The variants fall into four groups:
//!
//! | Group            | Variants                                                          | Recoverable |
//! |------------------|-------------------------------------------------------------------|-------------|
//! | Validation       | `InvalidParameters`, `InvalidFilterSize`, `InvalidHashCount`, `InvalidShardCount` | No, filter is not created |
//! | Out of range     | `IndexOutOfBounds`                                                | No, library invariant violated |
//! | Size mismatch    | `SizeMismatch`, `HashCountMismatch`, `Format`                     | Yes |
//! | I/O              | `Io`                                                              | Caller decides |
//!
//! # Error Propagation
//!
//! ```
//! use hyperbloom::{BloomFilter, Result};
//!
//! fn warm(keys: &[&str]) -> Result<BloomFilter> {
//!     let filter = BloomFilter::new(1 << 16, 4)?;
//!     for key in keys {
//!         filter.insert(key)?;
//!     }
//!     Ok(filter)
//! }
//! # assert!(warm(&["a", "b"]).is_ok());
//! ```

#![allow(clippy::module_name_repetitions)]

use crate::persist::FormatError;
use std::fmt;
use std::io;

/// Result type alias for hyperbloom operations.
pub type Result<T> = std::result::Result<T, HyperBloomError>;

/// Errors that can occur while building, using or persisting a filter.
#[derive(Debug)]
pub enum HyperBloomError {
    /// Construction arguments are inconsistent with each other.
    InvalidParameters {
        /// Human-readable description of what's invalid.
        message: String,
    },

    /// Filter size is below 64 positions or not a power of two.
    InvalidFilterSize {
        /// The rejected size, in positions.
        size: usize,
    },

    /// Number of hash functions is outside `[min, max]`.
    InvalidHashCount {
        /// The rejected hash count.
        count: usize,
        /// Minimum allowed value.
        min: usize,
        /// Maximum allowed value.
        max: usize,
    },

    /// Shard count violates the striping constraints for this size.
    InvalidShardCount {
        /// The rejected shard count.
        shards: usize,
        /// Filter size the shards were meant to partition.
        size: usize,
        /// Which constraint failed.
        reason: &'static str,
    },

    /// A position at or beyond the store length was addressed.
    ///
    /// Masked derivation makes this unreachable from `insert`/`lookup`; seeing
    /// it means a bug in hyperbloom or a caller addressing the store directly.
    IndexOutOfBounds {
        /// The invalid position.
        index: usize,
        /// Number of addressable positions.
        length: usize,
    },

    /// A persisted filter declares a different size than the target filter.
    SizeMismatch {
        /// Size of the filter being loaded into.
        expected: usize,
        /// Size declared by the stream.
        found: usize,
    },

    /// A persisted filter was written with a different number of hash functions.
    HashCountMismatch {
        /// Hash count of the filter being loaded into.
        expected: usize,
        /// Hash count declared by the stream.
        found: usize,
    },

    /// The persisted stream is malformed.
    Format(FormatError),

    /// Underlying I/O failure while saving or loading.
    Io(io::Error),
}

impl fmt::Display for HyperBloomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameters { message } => {
                write!(f, "Invalid Bloom filter parameters: {}.", message)
            }
            Self::InvalidFilterSize { size } => {
                write!(
                    f,
                    "Invalid filter size: {} positions. Must be a power of two and at least 64.",
                    size
                )
            }
            Self::InvalidHashCount { count, min, max } => {
                write!(
                    f,
                    "Invalid hash function count: {}. Must be in range [{}, {}].",
                    count, min, max
                )
            }
            Self::InvalidShardCount {
                shards,
                size,
                reason,
            } => {
                write!(
                    f,
                    "Invalid shard count {} for filter of {} positions: {}.",
                    shards, size, reason
                )
            }
            Self::IndexOutOfBounds { index, length } => {
                write!(
                    f,
                    "Index {} out of bounds for store of length {}",
                    index, length
                )
            }
            Self::SizeMismatch { expected, found } => {
                write!(
                    f,
                    "Persisted filter size {} does not match filter size {}",
                    found, expected
                )
            }
            Self::HashCountMismatch { expected, found } => {
                write!(
                    f,
                    "Persisted filter uses {} hash functions, filter uses {}",
                    found, expected
                )
            }
            Self::Format(err) => write!(f, "Malformed filter stream: {}", err),
            Self::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for HyperBloomError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Format(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for HyperBloomError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<FormatError> for HyperBloomError {
    fn from(err: FormatError) -> Self {
        Self::Format(err)
    }
}

impl HyperBloomError {
    /// Create an `InvalidParameters` error with a formatted message.
    #[must_use]
    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            message: message.into(),
        }
    }

    /// Create an `InvalidFilterSize` error.
    #[must_use]
    pub fn invalid_filter_size(size: usize) -> Self {
        Self::InvalidFilterSize { size }
    }

    /// Create an `InvalidHashCount` error.
    #[must_use]
    pub fn invalid_hash_count(count: usize, min: usize, max: usize) -> Self {
        Self::InvalidHashCount { count, min, max }
    }

    /// Create an `InvalidShardCount` error.
    #[must_use]
    pub fn invalid_shard_count(shards: usize, size: usize, reason: &'static str) -> Self {
        Self::InvalidShardCount {
            shards,
            size,
            reason,
        }
    }

    /// Create an `IndexOutOfBounds` error.
    #[must_use]
    pub fn index_out_of_bounds(index: usize, length: usize) -> Self {
        Self::IndexOutOfBounds { index, length }
    }

    /// Create a `SizeMismatch` error.
    #[must_use]
    pub fn size_mismatch(expected: usize, found: usize) -> Self {
        Self::SizeMismatch { expected, found }
    }

    /// Create a `HashCountMismatch` error.
    #[must_use]
    pub fn hash_count_mismatch(expected: usize, found: usize) -> Self {
        Self::HashCountMismatch { expected, found }
    }

    /// True for errors raised while validating construction arguments.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameters { .. }
                | Self::InvalidFilterSize { .. }
                | Self::InvalidHashCount { .. }
                | Self::InvalidShardCount { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_parameters() {
        let err = HyperBloomError::invalid_parameters("test message");
        let display = format!("{err}");
        assert!(display.contains("Invalid Bloom filter parameters"));
        assert!(display.contains("test message"));
        assert!(display.ends_with('.'));
    }

    #[test]
    fn test_error_display_invalid_filter_size() {
        let err = HyperBloomError::invalid_filter_size(100);
        let display = format!("{err}");
        assert!(display.contains("100 positions"));
        assert!(display.contains("power of two"));
    }

    #[test]
    fn test_error_display_invalid_hash_count() {
        let err = HyperBloomError::invalid_hash_count(0, 1, 64);
        let display = format!("{err}");
        assert!(display.contains("0"));
        assert!(display.contains("[1, 64]"));
    }

    #[test]
    fn test_error_display_invalid_shard_count() {
        let err = HyperBloomError::invalid_shard_count(10, 1024, "must be a power of two");
        let display = format!("{err}");
        assert!(display.contains("10"));
        assert!(display.contains("1024"));
        assert!(display.contains("power of two"));
    }

    #[test]
    fn test_error_display_index_out_of_bounds() {
        let err = HyperBloomError::index_out_of_bounds(150, 128);
        let display = format!("{}", err);
        assert!(display.contains("150"));
        assert!(display.contains("128"));
        assert!(display.contains("out of bounds"));
    }

    #[test]
    fn test_error_display_size_mismatch() {
        let err = HyperBloomError::size_mismatch(1024, 2048);
        let display = format!("{err}");
        assert!(display.contains("2048"));
        assert!(display.contains("1024"));
    }

    #[test]
    fn test_io_error_has_source() {
        use std::error::Error;

        let err: HyperBloomError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, HyperBloomError::Io(_)));
        assert!(err.source().is_some());
        assert!(format!("{err}").contains("gone"));
    }

    #[test]
    fn test_format_error_converts() {
        let err: HyperBloomError = FormatError::InvalidMagic.into();
        assert!(matches!(err, HyperBloomError::Format(FormatError::InvalidMagic)));
    }

    #[test]
    fn test_validation_grouping() {
        assert!(HyperBloomError::invalid_filter_size(3).is_validation());
        assert!(HyperBloomError::invalid_hash_count(0, 1, 64).is_validation());
        assert!(HyperBloomError::invalid_shard_count(3, 64, "x").is_validation());
        assert!(!HyperBloomError::size_mismatch(64, 128).is_validation());
        assert!(!HyperBloomError::index_out_of_bounds(64, 64).is_validation());
    }

    #[test]
    fn test_error_implements_std_error() {
        let _err: Box<dyn std::error::Error> =
            Box::new(HyperBloomError::invalid_parameters("test"));
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn inner() -> Result<()> {
            Err(HyperBloomError::invalid_filter_size(0))
        }

        fn outer() -> Result<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
