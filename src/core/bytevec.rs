//! Byte-per-position store.
//!
//! Trades 8× the memory of [`PackedBits`](super::PackedBits) for a plain
//! store/load per position, with no masking and no shared words between
//! neighbouring positions.

use super::store::{BitStore, StorageKind};
use crate::error::{HyperBloomError, Result};
use std::io;
use std::sync::atomic::{AtomicU8, Ordering};

/// Chunk size used when streaming the payload out.
const WRITE_CHUNK: usize = 8 * 1024;

/// One `AtomicU8` flag per position.
#[derive(Debug)]
pub struct ByteFlags {
    flags: Box<[AtomicU8]>,
}

impl ByteFlags {
    #[inline]
    fn flag(&self, index: usize) -> Result<&AtomicU8> {
        self.flags
            .get(index)
            .ok_or_else(|| HyperBloomError::index_out_of_bounds(index, self.flags.len()))
    }
}

impl BitStore for ByteFlags {
    const KIND: StorageKind = StorageKind::ByteFlags;

    fn with_len(len: usize) -> Result<Self> {
        if len == 0 {
            return Err(HyperBloomError::invalid_filter_size(len));
        }

        let flags = (0..len)
            .map(|_| AtomicU8::new(0))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Ok(Self { flags })
    }

    #[inline]
    fn len(&self) -> usize {
        self.flags.len()
    }

    #[inline]
    fn get(&self, index: usize) -> Result<bool> {
        Ok(self.flag(index)?.load(Ordering::Acquire) != 0)
    }

    #[inline]
    fn set(&self, index: usize) -> Result<()> {
        self.flag(index)?.store(1, Ordering::Release);
        Ok(())
    }

    fn count_ones(&self) -> usize {
        self.flags
            .iter()
            .filter(|f| f.load(Ordering::Relaxed) != 0)
            .count()
    }

    fn memory_usage(&self) -> usize {
        self.flags.len()
    }

    fn payload_len(len: usize) -> usize {
        len
    }

    fn write_payload(&self, writer: &mut dyn io::Write) -> io::Result<()> {
        let mut buf = Vec::with_capacity(WRITE_CHUNK.min(self.flags.len()));
        for chunk in self.flags.chunks(WRITE_CHUNK) {
            buf.clear();
            buf.extend(chunk.iter().map(|f| u8::from(f.load(Ordering::Acquire) != 0)));
            writer.write_all(&buf)?;
        }
        Ok(())
    }

    fn for_each_set<F>(payload: &[u8], mut visit: F) -> Result<()>
    where
        F: FnMut(usize) -> Result<()>,
    {
        for (index, &byte) in payload.iter().enumerate() {
            if byte != 0 {
                visit(index)?;
            }
        }
        Ok(())
    }
}

impl Clone for ByteFlags {
    fn clone(&self) -> Self {
        let flags = self
            .flags
            .iter()
            .map(|f| AtomicU8::new(f.load(Ordering::Acquire)))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { flags }
    }
}
