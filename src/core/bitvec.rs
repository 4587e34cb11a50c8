//! Packed-bit store backed by atomic 64-bit words.
//!
//! # Memory Layout
//!
//! Bits are packed into 64-bit words in little-endian bit order:
//!
//! ```text
//! Word 0: [bit 0][bit 1]...[bit 63]
//! Word 1: [bit 64][bit 65]...[bit 127]
//! ```
//!
//! # Memory Ordering
//!
//! `set` uses `fetch_or` with `Release`, `get` loads with `Acquire`. Under a
//! lock the ordering is redundant; on the unlocked path it still guarantees
//! that a reader observing a bit also observes everything written before it.
//!
//! # Examples
//!
//! ```
//! use hyperbloom::core::{BitStore, PackedBits};
//!
//! let bits = PackedBits::with_len(128)?;
//! bits.set(100)?;
//! assert!(bits.get(100)?);
//! assert!(!bits.get(101)?);
//! assert!(bits.get(128).is_err());
//! # Ok::<(), hyperbloom::HyperBloomError>(())
//! ```

use super::store::{BitStore, StorageKind};
use crate::error::{HyperBloomError, Result};
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};

const WORD_BITS: usize = 64;
const WORD_BYTES: usize = 8;

/// Fixed-size bit array of `AtomicU64` words.
#[derive(Debug)]
pub struct PackedBits {
    words: Box<[AtomicU64]>,
    len: usize,
}

impl PackedBits {
    #[inline]
    fn check(&self, index: usize) -> Result<()> {
        if index >= self.len {
            return Err(HyperBloomError::index_out_of_bounds(index, self.len));
        }
        Ok(())
    }

    /// Snapshot of the raw words.
    #[must_use]
    pub fn to_words(&self) -> Vec<u64> {
        self.words
            .iter()
            .map(|w| w.load(Ordering::Acquire))
            .collect()
    }
}

impl BitStore for PackedBits {
    const KIND: StorageKind = StorageKind::PackedBits;

    fn with_len(len: usize) -> Result<Self> {
        if len == 0 {
            return Err(HyperBloomError::invalid_filter_size(len));
        }

        let num_words = (len + WORD_BITS - 1) / WORD_BITS;
        let words = (0..num_words)
            .map(|_| AtomicU64::new(0))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Ok(Self { words, len })
    }

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn get(&self, index: usize) -> Result<bool> {
        self.check(index)?;
        let mask = 1u64 << (index % WORD_BITS);
        Ok(self.words[index / WORD_BITS].load(Ordering::Acquire) & mask != 0)
    }

    #[inline]
    fn set(&self, index: usize) -> Result<()> {
        self.check(index)?;
        let mask = 1u64 << (index % WORD_BITS);
        self.words[index / WORD_BITS].fetch_or(mask, Ordering::Release);
        Ok(())
    }

    fn count_ones(&self) -> usize {
        self.words
            .iter()
            .map(|w| w.load(Ordering::Relaxed).count_ones() as usize)
            .sum()
    }

    fn memory_usage(&self) -> usize {
        self.words.len() * WORD_BYTES
    }

    fn payload_len(len: usize) -> usize {
        (len + WORD_BITS - 1) / WORD_BITS * WORD_BYTES
    }

    fn write_payload(&self, writer: &mut dyn io::Write) -> io::Result<()> {
        for word in self.words.iter() {
            writer.write_all(&word.load(Ordering::Acquire).to_le_bytes())?;
        }
        Ok(())
    }

    fn for_each_set<F>(payload: &[u8], mut visit: F) -> Result<()>
    where
        F: FnMut(usize) -> Result<()>,
    {
        for (word_idx, chunk) in payload.chunks_exact(WORD_BYTES).enumerate() {
            let mut word = u64::from_le_bytes([
                chunk[0], chunk[1], chunk[2], chunk[3], chunk[4], chunk[5], chunk[6], chunk[7],
            ]);
            while word != 0 {
                let bit = word.trailing_zeros() as usize;
                visit(word_idx * WORD_BITS + bit)?;
                word &= word - 1;
            }
        }
        Ok(())
    }
}

impl Clone for PackedBits {
    fn clone(&self) -> Self {
        let words = self
            .words
            .iter()
            .map(|w| AtomicU64::new(w.load(Ordering::Acquire)))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            words,
            len: self.len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_new_is_zeroed() {
        let bits = PackedBits::with_len(1024).unwrap();
        assert_eq!(bits.len(), 1024);
        assert_eq!(bits.count_ones(), 0);
        assert!((0..1024).all(|i| !bits.get(i).unwrap()));
    }

    #[test]
    fn test_zero_len_rejected() {
        assert!(matches!(
            PackedBits::with_len(0),
            Err(HyperBloomError::InvalidFilterSize { size: 0 })
        ));
    }

    #[test]
    fn test_set_get_word_boundaries() {
        let bits = PackedBits::with_len(256).unwrap();
        for i in [0, 63, 64, 127, 128, 255] {
            bits.set(i).unwrap();
        }
        for i in [0, 63, 64, 127, 128, 255] {
            assert!(bits.get(i).unwrap(), "bit {} not set", i);
        }
        assert!(!bits.get(1).unwrap());
        assert!(!bits.get(62).unwrap());
        assert_eq!(bits.count_ones(), 6);
    }

    #[test]
    fn test_set_is_idempotent() {
        let bits = PackedBits::with_len(64).unwrap();
        bits.set(10).unwrap();
        bits.set(10).unwrap();
        assert_eq!(bits.count_ones(), 1);
    }

    #[test]
    fn test_out_of_range() {
        let bits = PackedBits::with_len(128).unwrap();
        assert!(matches!(
            bits.get(128),
            Err(HyperBloomError::IndexOutOfBounds { index: 128, length: 128 })
        ));
        assert!(bits.set(1000).is_err());
        assert!(bits.set(127).is_ok());
    }

    #[test]
    fn test_payload_encoding() {
        let bits = PackedBits::with_len(128).unwrap();
        bits.set(0).unwrap();
        bits.set(65).unwrap();

        let mut payload = Vec::new();
        bits.write_payload(&mut payload).unwrap();
        assert_eq!(payload.len(), PackedBits::payload_len(128));
        assert_eq!(payload[0], 0b1);
        assert_eq!(payload[8], 0b10);

        let mut seen = Vec::new();
        PackedBits::for_each_set(&payload, |i| {
            seen.push(i);
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, vec![0, 65]);
    }

    #[test]
    fn test_for_each_set_propagates_error() {
        let payload = [0xffu8; 8];
        let mut calls = 0;
        let result = PackedBits::for_each_set(&payload, |i| {
            calls += 1;
            if i == 3 {
                Err(HyperBloomError::index_out_of_bounds(i, 3))
            } else {
                Ok(())
            }
        });
        assert!(result.is_err());
        assert_eq!(calls, 4);
    }

    #[test]
    fn test_clone_is_independent() {
        let bits = PackedBits::with_len(64).unwrap();
        bits.set(1).unwrap();
        let copy = bits.clone();
        bits.set(2).unwrap();
        assert!(copy.get(1).unwrap());
        assert!(!copy.get(2).unwrap());
    }

    #[test]
    fn test_concurrent_sets_share_words() {
        // Threads set interleaved bits of the same words; fetch_or keeps them all.
        let bits = Arc::new(PackedBits::with_len(1024).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let bits = Arc::clone(&bits);
                thread::spawn(move || {
                    for i in (t..1024).step_by(4) {
                        bits.set(i).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(bits.count_ones(), 1024);
        assert!(bits.to_words().iter().all(|&w| w == u64::MAX));
    }
}
